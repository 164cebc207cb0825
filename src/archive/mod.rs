mod tar_gz;
mod zip;

use crate::runtime::Runtime;
use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Format-specific archive extraction
#[cfg_attr(test, mockall::automock)]
pub trait Extractor: Send + Sync {
    /// Check if this extractor can handle the given archive format
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Unpack the archive into `extract_to`, which must already exist
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}

/// Dispatches to the extractor matching the archive's file name.
#[derive(Default)]
pub struct ArchiveExtractor {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl Extractor for ArchiveExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        if self.tar_gz.can_handle(archive_path) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(archive_path) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}

/// The directory install steps resolve their sources against.
///
/// Source archives usually wrap everything in one top-level directory
/// (`ansible-bundler-master/`); that directory is the root when it is the only entry.
pub fn source_root<R: Runtime>(runtime: &R, extract_to: &Path) -> Result<PathBuf> {
    let entries = runtime
        .read_dir(extract_to)
        .context("Failed to read extraction directory")?;

    match entries.as_slice() {
        [] => bail!("Archive appears to be empty."),
        [single] if runtime.is_dir(single) => {
            debug!("Using single top-level directory {:?} as source root", single);
            Ok(single.clone())
        }
        _ => Ok(extract_to.to_path_buf()),
    }
}

/// Write one regular-file entry to `dest`, creating parents and applying `mode`.
fn write_entry<R: Runtime, Rd: Read>(
    runtime: &R,
    dest: &Path,
    reader: &mut Rd,
    mode: Option<u32>,
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent)?;
    }
    let written = {
        let mut out = runtime.create_file(dest)?;
        std::io::copy(reader, &mut out)
            .with_context(|| format!("Failed to extract file {:?}", dest))?
    };

    if let Some(mode) = mode
        && let Err(e) = runtime.set_permissions(dest, mode & 0o7777)
    {
        debug!("Failed to set permissions on {:?}: {}", dest, e);
    }
    Ok(written)
}

/// Joins an archive entry path onto `root`, refusing absolute paths and `..`.
pub(crate) fn safe_join(root: &Path, entry: &Path) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for component in entry.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}
