//! Moves a staged image into the prefix, all or nothing.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::path::{Component, Path, PathBuf};

use crate::error::InstallStepError;
use crate::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq)]
enum JournalEntry {
    CreatedDir(PathBuf),
    Created(PathBuf),
    Replaced { dest: PathBuf, backup: PathBuf },
}

/// A committed image that can still be undone.
///
/// Call [`Transaction::finish`] to keep the new files or
/// [`Transaction::rollback`] to restore the prefix to its previous state.
pub struct Transaction<'a, R: Runtime> {
    runtime: &'a R,
    journal: Vec<JournalEntry>,
    files: Vec<PathBuf>,
}

impl<'a, R: Runtime> Transaction<'a, R> {
    /// Move every file under `image` to the same relative path under `prefix`.
    ///
    /// Existing destinations are moved under `backup_dir` first. On failure
    /// everything done so far is undone and an [`InstallStepError`] is returned.
    #[tracing::instrument(skip(runtime))]
    pub fn commit(
        runtime: &'a R,
        image: &Path,
        prefix: &Path,
        backup_dir: &Path,
    ) -> Result<Self> {
        let mut txn = Transaction {
            runtime,
            journal: Vec::new(),
            files: Vec::new(),
        };

        if let Err(e) = txn.apply(image, prefix, backup_dir) {
            txn.rollback();
            return Err(e.context(InstallStepError {
                index: 0,
                step: format!("commit to {}", prefix.display()),
            }));
        }

        Ok(txn)
    }

    fn apply(&mut self, image: &Path, prefix: &Path, backup_dir: &Path) -> Result<()> {
        let files = list_files(self.runtime, image, Path::new(""))?;

        for rel in &files {
            let src = image.join(rel);
            let dest = prefix.join(rel);

            if let Some(parent) = dest.parent() {
                self.create_dirs(prefix, parent)?;
            }

            if self.runtime.is_dir(&dest) {
                bail!("Cannot install {:?}: a directory is in the way", dest);
            }
            if self.runtime.exists(&dest) {
                let backup = backup_dir.join(rel);
                if let Some(parent) = backup.parent() {
                    self.runtime.create_dir_all(parent)?;
                }
                debug!("Backing up {:?} to {:?}", dest, backup);
                self.runtime
                    .rename(&dest, &backup)
                    .with_context(|| format!("Failed to back up {:?}", dest))?;
                self.journal.push(JournalEntry::Replaced {
                    dest: dest.clone(),
                    backup,
                });
                self.runtime
                    .rename(&src, &dest)
                    .with_context(|| format!("Failed to install {:?}", dest))?;
            } else {
                self.runtime
                    .rename(&src, &dest)
                    .with_context(|| format!("Failed to install {:?}", dest))?;
                self.journal.push(JournalEntry::Created(dest.clone()));
            }
        }

        self.files = files;
        Ok(())
    }

    /// Create `dir` and any missing ancestors below `prefix`, journaling each.
    fn create_dirs(&mut self, prefix: &Path, dir: &Path) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(dir);
        while let Some(path) = current {
            if self.runtime.exists(path) {
                break;
            }
            missing.push(path.to_path_buf());
            if path == prefix {
                break;
            }
            current = path.parent();
        }

        for path in missing.into_iter().rev() {
            self.runtime.create_dir_all(&path)?;
            self.journal.push(JournalEntry::CreatedDir(path));
        }
        Ok(())
    }

    /// Prefix-relative paths of every committed file, sorted.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Keep the committed files.
    pub fn finish(self) -> Vec<PathBuf> {
        self.files
    }

    /// Undo the commit in reverse order. Errors are logged, not returned.
    pub fn rollback(mut self) {
        self.undo();
    }

    fn undo(&mut self) {
        for entry in self.journal.drain(..).rev() {
            debug!("Rolling back {:?}", entry);
            let result = match &entry {
                JournalEntry::Created(path) => self.runtime.remove_file(path),
                JournalEntry::Replaced { dest, backup } => {
                    if self.runtime.exists(dest) {
                        let _ = self.runtime.remove_file(dest);
                    }
                    self.runtime.rename(backup, dest)
                }
                JournalEntry::CreatedDir(path) => self.runtime.remove_dir(path),
            };
            if let Err(e) = result {
                warn!("Rollback of {:?} failed: {:#}", entry, e);
            }
        }
    }
}

/// Relative paths of all files below `root`, sorted.
pub fn list_files<R: Runtime>(runtime: &R, root: &Path, rel: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in runtime.read_dir(&root.join(rel))? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let entry_rel = rel.join(name);
        if runtime.is_dir(&entry) {
            files.extend(list_files(runtime, root, &entry_rel)?);
        } else {
            files.push(entry_rel);
        }
    }
    files.sort();
    Ok(files)
}

/// Delete prefix-relative `files`, then prune directories left empty.
/// Neither `prefix` nor anything above it is removed.
///
/// Fails before touching anything if an entry is absolute or climbs out with `..`.
pub fn remove_installed<R: Runtime>(runtime: &R, prefix: &Path, files: &[PathBuf]) -> Result<()> {
    if let Some(bad) = files.iter().find(|rel| !is_prefix_relative(rel)) {
        bail!("Refusing to remove {:?}: not a path inside {:?}", bad, prefix);
    }

    for rel in files {
        let path = prefix.join(rel);
        if runtime.exists(&path) {
            debug!("Removing {:?}", path);
            runtime
                .remove_file(&path)
                .with_context(|| format!("Failed to remove {:?}", path))?;
        }

        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == prefix || !d.starts_with(prefix) {
                break;
            }
            match runtime.read_dir(d) {
                Ok(entries) if entries.is_empty() => {
                    debug!("Pruning empty directory {:?}", d);
                    runtime.remove_dir(d)?;
                }
                _ => break,
            }
            dir = d.parent();
        }
    }
    Ok(())
}

fn is_prefix_relative(rel: &Path) -> bool {
    rel.components().next().is_some()
        && rel.components().all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_caused_by;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_commit_moves_image_into_prefix() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("image");
        let prefix = dir.path().join("prefix");
        write(&image.join("bin/tool"), "tool");
        write(&image.join("share/pkg/examples/basic.yml"), "basic");

        let txn = Transaction::commit(&RealRuntime, &image, &prefix, &dir.path().join("bak"))
            .unwrap();
        assert_eq!(
            txn.files(),
            &[
                PathBuf::from("bin/tool"),
                PathBuf::from("share/pkg/examples/basic.yml")
            ]
        );
        let files = txn.finish();
        assert_eq!(files.len(), 2);

        assert_eq!(fs::read_to_string(prefix.join("bin/tool")).unwrap(), "tool");
        assert_eq!(
            fs::read_to_string(prefix.join("share/pkg/examples/basic.yml")).unwrap(),
            "basic"
        );
        assert!(!image.join("bin/tool").exists());
    }

    #[test]
    fn test_rollback_restores_previous_files_and_removes_new_ones() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("image");
        let prefix = dir.path().join("prefix");
        write(&prefix.join("bin/tool"), "old tool");
        write(&image.join("bin/tool"), "new tool");
        write(&image.join("lib/new/x.so"), "x");

        let txn = Transaction::commit(&RealRuntime, &image, &prefix, &dir.path().join("bak"))
            .unwrap();
        assert_eq!(fs::read_to_string(prefix.join("bin/tool")).unwrap(), "new tool");

        txn.rollback();

        assert_eq!(fs::read_to_string(prefix.join("bin/tool")).unwrap(), "old tool");
        assert!(!prefix.join("lib").exists());
    }

    #[test]
    fn test_failed_commit_leaves_prefix_untouched() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("image");
        let prefix = dir.path().join("prefix");
        write(&prefix.join("bin/tool"), "old tool");
        write(&image.join("bin/tool"), "new tool");
        write(&image.join("etc/pkg/conf"), "conf");
        // A directory where a file must go makes the second file fail
        fs::create_dir_all(prefix.join("etc/pkg/conf")).unwrap();

        let err = Transaction::commit(&RealRuntime, &image, &prefix, &dir.path().join("bak"))
            .err()
            .unwrap();

        assert!(is_caused_by::<InstallStepError>(&err));
        assert_eq!(fs::read_to_string(prefix.join("bin/tool")).unwrap(), "old tool");
        assert!(prefix.join("etc/pkg/conf").is_dir());
    }

    #[test]
    fn test_remove_installed_prunes_empty_dirs() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("prefix");
        write(&prefix.join("bin/tool"), "tool");
        write(&prefix.join("bin/other"), "other");
        write(&prefix.join("share/pkg/examples/basic.yml"), "basic");

        remove_installed(
            &RealRuntime,
            &prefix,
            &[
                PathBuf::from("bin/tool"),
                PathBuf::from("share/pkg/examples/basic.yml"),
                PathBuf::from("lib/already-gone.so"),
            ],
        )
        .unwrap();

        assert!(!prefix.join("bin/tool").exists());
        assert!(prefix.join("bin/other").exists());
        assert!(!prefix.join("share").exists());
        assert!(prefix.exists());
    }

    #[test]
    fn test_remove_installed_refuses_paths_outside_prefix() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("prefix");
        let outside = dir.path().join("outside.txt");
        write(&prefix.join("bin/tool"), "tool");
        write(&outside, "keep me");

        for bad in [PathBuf::from("../outside.txt"), outside.clone()] {
            let err = remove_installed(
                &RealRuntime,
                &prefix,
                &[PathBuf::from("bin/tool"), bad],
            )
            .unwrap_err();
            assert!(err.to_string().starts_with("Refusing to remove"));
        }

        assert!(outside.exists());
        assert!(prefix.join("bin/tool").exists());
    }

    #[test]
    fn test_list_files_is_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("b/z"), "");
        write(&dir.path().join("a"), "");
        write(&dir.path().join("b/c/d"), "");

        let files = list_files(&RealRuntime, dir.path(), Path::new("")).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a"),
                PathBuf::from("b/c/d"),
                PathBuf::from("b/z")
            ]
        );
    }
}
