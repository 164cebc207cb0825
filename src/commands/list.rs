use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    install::{Layout, paths::resolve_prefix},
    package::{Receipt, find_all_receipts},
    runtime::Runtime,
};

/// List all installed packages
#[tracing::instrument(skip(runtime, prefix))]
pub fn list<R: Runtime>(runtime: R, prefix: Option<PathBuf>) -> Result<()> {
    let layout = Layout::new(resolve_prefix(&runtime, prefix)?);
    let receipts = load_receipts(&runtime, &layout)?;

    if receipts.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }
    for receipt in receipts {
        println!("{} {}", receipt.name, receipt.version);
    }
    Ok(())
}

/// Every readable receipt under the prefix. Unreadable ones are skipped.
pub(crate) fn load_receipts<R: Runtime>(runtime: &R, layout: &Layout) -> Result<Vec<Receipt>> {
    let mut receipts = Vec::new();
    for path in find_all_receipts(runtime, &layout.receipts_dir())? {
        match Receipt::load(runtime, &path) {
            Ok(receipt) => receipts.push(receipt),
            Err(e) => debug!("Failed to load receipt {:?}: {}", path, e),
        }
    }
    Ok(receipts)
}
