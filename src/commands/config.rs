use anyhow::Result;
use std::path::PathBuf;

use crate::{
    archive::{ArchiveExtractor, Extractor},
    download::{Downloader, HttpDownloader},
    http::HttpClient,
    install::{Layout, paths::resolve_prefix},
    runtime::Runtime,
};

pub const USER_AGENT: &str = concat!("keg/", env!("KEG_VERSION"));

/// Everything an install run needs, resolved once up front.
pub struct Config<R: Runtime, D: Downloader, E: Extractor> {
    pub runtime: R,
    pub downloader: D,
    pub extractor: E,
    pub layout: Layout,
}

impl<R: Runtime> Config<R, HttpDownloader, ArchiveExtractor> {
    pub fn new(runtime: R, prefix: Option<PathBuf>) -> Result<Self> {
        let layout = Layout::new(resolve_prefix(&runtime, prefix)?);
        let downloader = HttpDownloader::new(HttpClient::with_user_agent(USER_AGENT)?);

        Ok(Self {
            runtime,
            downloader,
            extractor: ArchiveExtractor::default(),
            layout,
        })
    }
}
