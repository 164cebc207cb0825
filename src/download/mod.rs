use crate::error::FetchError;
use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};

/// Fetches a source archive to a local path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into `dest`. Every failure carries a [`FetchError`] in its chain.
    async fn download<R: Runtime + 'static>(&self, runtime: &R, url: &str, dest: &Path)
    -> Result<()>;
}

/// Downloader for `http(s)://` URLs, with `file://` URLs served from disk.
pub struct HttpDownloader {
    client: HttpClient,
}

impl HttpDownloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[tracing::instrument(skip(self, runtime, dest))]
    async fn download<R: Runtime + 'static>(
        &self,
        runtime: &R,
        url: &str,
        dest: &Path,
    ) -> Result<()> {
        let result = if let Some(local) = url.strip_prefix("file://") {
            copy_local_file(runtime, Path::new(local), dest)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            download_file(runtime, url, dest, &self.client).await
        } else {
            Err(anyhow::anyhow!("Unsupported URL scheme"))
        };

        result.with_context(|| FetchError {
            url: url.to_string(),
        })
    }
}

/// Downloads a file from a URL to a local path.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<()> {
    info!("Downloading {}...", url);

    let dest = dest.to_path_buf();
    http_client
        .download_file(url, || {
            runtime
                .create_file(&dest)
                .with_context(|| format!("Failed to create file at {:?}", dest))
        })
        .await?;

    info!("Download complete.");
    Ok(())
}

fn copy_local_file<R: Runtime>(runtime: &R, source: &Path, dest: &Path) -> Result<()> {
    if !runtime.exists(source) || runtime.is_dir(source) {
        bail!("Source archive {:?} does not exist", source);
    }
    info!("Copying {:?}...", source);
    runtime.copy(source, dest)?;
    Ok(())
}

/// File name to store a download under: the last path segment of the URL.
pub fn archive_file_name(url: &str) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or("source.tar.gz");
    PathBuf::from(name)
}
