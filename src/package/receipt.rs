use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::descriptor::PackageDescriptor;
use crate::runtime::Runtime;

/// Record of an installed package, stored at `<prefix>/.keg/receipts/<name>.json`.
///
/// A package counts as installed exactly when its receipt exists.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub name: String,
    pub version: String,
    pub url: String,
    pub sha256: String,
    #[serde(default)]
    pub depends_on: Option<String>,
    /// Installed files, relative to the prefix, sorted
    pub files: Vec<PathBuf>,
    /// Seconds since the Unix epoch
    pub installed_at: u64,
}

impl Receipt {
    pub fn new(descriptor: &PackageDescriptor, files: Vec<PathBuf>) -> Self {
        let installed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Receipt {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            url: descriptor.url.clone(),
            sha256: descriptor.sha256.to_ascii_lowercase(),
            depends_on: descriptor.depends_on.clone(),
            files,
            installed_at,
        }
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read receipt {:?}", path))?;
        let receipt: Receipt = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse receipt {:?}", path))?;
        Ok(receipt)
    }

    /// Write the receipt through a temporary file so readers never see a partial one.
    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        runtime.write(&tmp_path, json.as_bytes())?;
        runtime
            .rename(&tmp_path, path)
            .with_context(|| format!("Failed to write receipt {:?}", path))?;
        Ok(())
    }

    /// Files listed in `self` that `newer` no longer ships.
    pub fn stale_files(&self, newer: &Receipt) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| !newer.files.contains(f))
            .cloned()
            .collect()
    }
}
