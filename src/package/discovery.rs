use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Find every receipt in `receipts_dir`, sorted by file name.
///
/// Directory structure: `<receipts_dir>/<name>.json`
#[tracing::instrument(skip(runtime))]
pub fn find_all_receipts<R: Runtime>(runtime: &R, receipts_dir: &Path) -> Result<Vec<PathBuf>> {
    if !runtime.exists(receipts_dir) {
        return Ok(Vec::new());
    }

    let mut receipts: Vec<PathBuf> = runtime
        .read_dir(receipts_dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| !runtime.is_dir(p))
        .collect();
    receipts.sort();
    Ok(receipts)
}
