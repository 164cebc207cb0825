use anyhow::{Result, bail};
use log::debug;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    archive::Extractor,
    cleanup::{lock, new_shared},
    descriptor::PackageDescriptor,
    download::Downloader,
    install::{Installer, caveats},
    runtime::Runtime,
};

use super::config::Config;

#[tracing::instrument(skip(runtime, prefix))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    package: &str,
    prefix: Option<PathBuf>,
) -> Result<()> {
    let config = Config::new(runtime, prefix)?;
    run(package, config).await
}

pub async fn run<R: Runtime + 'static, D: Downloader, E: Extractor>(
    package: &str,
    config: Config<R, D, E>,
) -> Result<()> {
    run_until(package, config, tokio::signal::ctrl_c()).await
}

/// Install `package`, giving up as soon as `interrupt` completes.
///
/// An interrupted run removes its scratch directory and fails with
/// "Interrupted while installing <name>".
#[tracing::instrument(skip(config, interrupt))]
pub async fn run_until<R, D, E, I>(
    package: &str,
    config: Config<R, D, E>,
    interrupt: I,
) -> Result<()>
where
    R: Runtime + 'static,
    D: Downloader,
    E: Extractor,
    I: Future,
{
    let descriptor = PackageDescriptor::resolve(&config.runtime, package)?;
    let cleanup = new_shared();
    let installer = Installer::with_cleanup(
        config.runtime,
        config.downloader,
        config.extractor,
        Arc::clone(&cleanup),
    );

    let receipt = tokio::select! {
        result = installer.install(&descriptor, &config.layout) => result?,
        _ = interrupt => {
            debug!("Interrupted, cleaning up");
            lock(&cleanup).cleanup();
            // Only succeeds when no other run is using it
            let _ = installer.runtime.remove_dir(&config.layout.tmp_dir());
            bail!("Interrupted while installing {}", descriptor.name);
        }
    };

    println!(
        "Installed {} {} to {}",
        receipt.name,
        receipt.version,
        config.layout.prefix().display()
    );
    if let Some(text) = caveats(&descriptor, &config.layout) {
        println!("\n==> Caveats\n{}", text.trim_end());
    }
    Ok(())
}
