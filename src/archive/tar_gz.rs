use crate::runtime::Runtime;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, info};
use std::path::Path;
use tar::{Archive, EntryType};

use super::{Extractor, safe_join, write_entry};

/// Extractor for .tar.gz and .tgz archives
#[derive(Default)]
pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting tar.gz archive to {:?}...", extract_to);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(file));
        let mut files = 0usize;

        for entry in archive
            .entries()
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?
        {
            let mut entry = entry.context("Failed to read archive entry")?;
            let entry_path = entry.path()?.into_owned();

            let Some(full_path) = safe_join(extract_to, &entry_path) else {
                debug!("Skipping entry with unsafe path {:?}", entry_path);
                continue;
            };

            let entry_type = entry.header().entry_type();
            match entry_type {
                EntryType::Directory => runtime.create_dir_all(&full_path)?,
                EntryType::Regular | EntryType::Continuous => {
                    let mode = entry.header().mode().ok();
                    write_entry(runtime, &full_path, &mut entry, mode)?;
                    files += 1;
                }
                // Links are never created, so later entries cannot write through them
                other => {
                    debug!("Skipping {:?} entry {:?}", other, entry_path);
                }
            }
        }

        info!("Extracted {} files from {:?}", files, archive_path);
        Ok(())
    }
}
