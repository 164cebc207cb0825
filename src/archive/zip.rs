use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use super::{Extractor, safe_join, write_entry};

/// Extractor for .zip source archives (GitHub's `archive/*.zip` downloads)
#[derive(Default)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        archive_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting zip archive to {:?}...", extract_to);

        // Runtime::open is Read-only, the central directory needs Seek
        let mut bytes = Vec::new();
        runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).context("Failed to parse ZIP archive")?;

        let mut files = 0usize;
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .with_context(|| format!("Failed to read ZIP entry {}", index))?;

            let target = entry
                .enclosed_name()
                .and_then(|name| safe_join(extract_to, &name));
            let Some(target) = target else {
                debug!("Skipping entry with unsafe path {:?}", entry.name());
                continue;
            };

            if entry.is_dir() {
                runtime.create_dir_all(&target)?;
            } else if entry.is_symlink() {
                debug!("Skipping symlink entry {:?}", entry.name());
            } else {
                let mode = entry.unix_mode();
                write_entry(runtime, &target, &mut entry, mode)?;
                files += 1;
            }
        }

        info!("Extracted {} files from {:?}", files, archive_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn create_test_archive(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    #[test]
    fn test_can_handle_zip() {
        let extractor = ZipExtractor;
        assert!(extractor.can_handle(Path::new("file.zip")));
        assert!(extractor.can_handle(Path::new("FILE.ZIP")));
        assert!(!extractor.can_handle(Path::new("file.tar.gz")));
    }

    #[test]
    fn test_extract_zip() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("pkg.zip");
        let out = dir.path().join("out");
        fs::create_dir(&out)?;

        create_test_archive(
            &archive_path,
            &[
                ("pkg/app/etc/ansible.cfg", "[defaults]\n"),
                ("pkg/examples/basic.yml", "- hosts: all\n"),
            ],
        )?;

        ZipExtractor.extract(&RealRuntime, &archive_path, &out)?;

        assert_eq!(
            fs::read_to_string(out.join("pkg/app/etc/ansible.cfg"))?,
            "[defaults]\n"
        );
        assert_eq!(
            fs::read_to_string(out.join("pkg/examples/basic.yml"))?,
            "- hosts: all\n"
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_zip_keeps_executable_bit() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let archive_path = dir.path().join("pkg.zip");
        let out = dir.path().join("out");
        fs::create_dir(&out)?;

        let mut zip = ZipWriter::new(File::create(&archive_path)?);
        let options: FileOptions<()> = FileOptions::default().unix_permissions(0o755);
        zip.start_file("pkg/app/bin/bundle-playbook", options)?;
        zip.write_all(b"#!/usr/bin/env bash\n")?;
        zip.finish()?;

        ZipExtractor.extract(&RealRuntime, &archive_path, &out)?;

        let mode = fs::metadata(out.join("pkg/app/bin/bundle-playbook"))?
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
        Ok(())
    }

    #[test]
    fn test_extract_invalid_zip() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("bad.zip");
        fs::write(&archive_path, "not a zip")?;

        let err = ZipExtractor
            .extract(&RealRuntime, &archive_path, dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse ZIP archive"));
        Ok(())
    }
}
