use anyhow::Result;
use std::path::PathBuf;

use crate::{descriptor::PackageDescriptor, install::Installer, runtime::Runtime};

use super::config::Config;

/// Remove an installed package. `package` may also be a bare name whose
/// descriptor is no longer available.
#[tracing::instrument(skip(runtime, prefix))]
pub fn uninstall<R: Runtime + 'static>(
    runtime: R,
    package: &str,
    prefix: Option<PathBuf>,
) -> Result<()> {
    let name = PackageDescriptor::resolve(&runtime, package)
        .map(|d| d.name)
        .unwrap_or_else(|_| package.to_string());

    let config = Config::new(runtime, prefix)?;
    let installer = Installer::new(config.runtime, config.downloader, config.extractor);
    let receipt = installer.uninstall(&name, &config.layout)?;

    println!(
        "Uninstalled {} {} ({} files removed)",
        receipt.name,
        receipt.version,
        receipt.files.len()
    );
    Ok(())
}
