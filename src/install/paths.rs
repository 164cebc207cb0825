use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Directory layout of an install prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    prefix: PathBuf,
}

impl Layout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn bin(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    pub fn lib(&self) -> PathBuf {
        self.prefix.join("lib")
    }

    /// `etc/<package>`
    pub fn etc(&self, package: &str) -> PathBuf {
        self.prefix.join("etc").join(package)
    }

    /// `share/<package>`
    pub fn pkgshare(&self, package: &str) -> PathBuf {
        self.prefix.join("share").join(package)
    }

    /// keg's own bookkeeping directory
    pub fn keg_dir(&self) -> PathBuf {
        self.prefix.join(".keg")
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.keg_dir().join("receipts")
    }

    pub fn receipt_path(&self, package: &str) -> PathBuf {
        self.receipts_dir().join(format!("{}.json", package))
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.keg_dir().join("tmp")
    }

    /// Scratch space for one install run. Lives under the prefix so the
    /// commit can rename files instead of copying them.
    pub fn scratch_dir(&self, package: &str, version: &str) -> PathBuf {
        self.tmp_dir().join(format!("{}-{}", package, version))
    }
}

/// The prefix to use: the explicit one if given, otherwise the default.
#[tracing::instrument(skip(runtime))]
pub fn resolve_prefix<R: Runtime>(runtime: &R, prefix: Option<PathBuf>) -> Result<PathBuf> {
    let prefix = match prefix {
        Some(path) => path,
        None => default_prefix(runtime)?,
    };
    info!("Using prefix: {}", prefix.display());
    Ok(prefix)
}

#[tracing::instrument(skip(runtime))]
pub fn default_prefix<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if runtime.is_privileged() {
        Ok(system_prefix())
    } else {
        let home_dir = runtime
            .home_dir()
            .context("Could not find home directory")?;
        Ok(home_dir.join(".keg"))
    }
}

#[cfg(target_os = "macos")]
fn system_prefix() -> PathBuf {
    PathBuf::from("/opt/keg")
}

#[cfg(target_os = "windows")]
fn system_prefix() -> PathBuf {
    PathBuf::from(r"C:\ProgramData\keg")
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn system_prefix() -> PathBuf {
    PathBuf::from("/usr/local/keg")
}
