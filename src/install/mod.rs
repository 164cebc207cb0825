//! The installer engine: fetch, verify, stage, commit, record.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::{
    archive::{Extractor, source_root},
    cleanup::{CleanupGuard, SharedCleanupContext, new_shared},
    descriptor::{PackageDescriptor, audit},
    digest::verify_file,
    download::{Downloader, archive_file_name},
    error::InstallStepError,
    package::Receipt,
    runtime::Runtime,
};

mod caveats;
pub mod paths;
mod selftest;
mod stage;
mod transaction;

pub use caveats::caveats;
pub use paths::Layout;
pub use selftest::{SelfTestOutcome, self_test};
pub use transaction::{Transaction, remove_installed};

pub struct Installer<R: Runtime, D: Downloader, E: Extractor> {
    pub runtime: R,
    pub downloader: D,
    pub extractor: E,
    cleanup: SharedCleanupContext,
}

impl<R: Runtime + 'static, D: Downloader, E: Extractor> Installer<R, D, E> {
    pub fn new(runtime: R, downloader: D, extractor: E) -> Self {
        Self::with_cleanup(runtime, downloader, extractor, new_shared())
    }

    /// Share a cleanup context, e.g. with an interrupt handler.
    pub fn with_cleanup(
        runtime: R,
        downloader: D,
        extractor: E,
        cleanup: SharedCleanupContext,
    ) -> Self {
        Self {
            runtime,
            downloader,
            extractor,
            cleanup,
        }
    }

    /// Run the whole procedure for `descriptor` against `layout`.
    ///
    /// Nothing under the prefix changes unless every step succeeds; the
    /// receipt is written last.
    #[tracing::instrument(skip(self, descriptor, layout), fields(package = %descriptor.name))]
    pub async fn install(
        &self,
        descriptor: &PackageDescriptor,
        layout: &Layout,
    ) -> Result<Receipt> {
        descriptor.validate()?;
        for warning in audit(descriptor) {
            warn!("{}: {}", descriptor.name, warning);
        }
        if let Some(dep) = &descriptor.depends_on {
            info!("{} requires {} to be installed", descriptor.name, dep);
        }

        let scratch = layout.scratch_dir(&descriptor.name, &descriptor.version);
        if self.runtime.exists(&scratch) {
            debug!("Removing leftover scratch directory {:?}", scratch);
            self.runtime.remove_dir_all(&scratch)?;
        }
        self.runtime
            .create_dir_all(&scratch)
            .with_context(|| format!("Failed to create scratch directory {:?}", scratch))?;

        let result = {
            let guard = CleanupGuard::new(Arc::clone(&self.cleanup), scratch);
            self.install_in(descriptor, layout, &guard).await
        };

        // Only succeeds when no other run is using it
        let _ = self.runtime.remove_dir(&layout.tmp_dir());

        result
    }

    async fn install_in(
        &self,
        descriptor: &PackageDescriptor,
        layout: &Layout,
        scratch: &CleanupGuard,
    ) -> Result<Receipt> {
        let scratch = scratch.path();

        let download_dir = scratch.join("download");
        self.runtime.create_dir_all(&download_dir)?;
        let archive = download_dir.join(archive_file_name(&descriptor.url));
        self.downloader
            .download(&self.runtime, &descriptor.url, &archive)
            .await?;

        verify_file(&self.runtime, &archive, &descriptor.sha256)?;

        let extract_dir = scratch.join("src");
        self.runtime.create_dir_all(&extract_dir)?;
        self.extractor
            .extract(&self.runtime, &archive, &extract_dir)
            .with_context(|| format!("Failed to extract {:?}", archive))?;
        let root = source_root(&self.runtime, &extract_dir)?;

        let image = scratch.join("image");
        stage::run_steps(&self.runtime, descriptor, &root, &image)?;

        let receipt_path = layout.receipt_path(&descriptor.name);
        let previous = if self.runtime.exists(&receipt_path) {
            match Receipt::load(&self.runtime, &receipt_path) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!("Ignoring unreadable receipt {:?}: {:#}", receipt_path, e);
                    None
                }
            }
        } else {
            None
        };

        let txn = Transaction::commit(
            &self.runtime,
            &image,
            layout.prefix(),
            &scratch.join("backup"),
        )?;

        let receipt = Receipt::new(descriptor, txn.files().to_vec());
        if let Err(e) = receipt.save(&self.runtime, &receipt_path) {
            txn.rollback();
            return Err(e.context(InstallStepError {
                index: 0,
                step: "record receipt".to_string(),
            }));
        }
        txn.finish();

        if let Some(previous) = previous {
            let stale = previous.stale_files(&receipt);
            if !stale.is_empty() {
                info!(
                    "Removing {} file(s) left from {} {}",
                    stale.len(),
                    previous.name,
                    previous.version
                );
                if let Err(e) = remove_installed(&self.runtime, layout.prefix(), &stale) {
                    warn!("Failed to remove stale files: {:#}", e);
                }
            }
        }

        info!(
            "Installed {} {} ({} files)",
            receipt.name,
            receipt.version,
            receipt.files.len()
        );
        Ok(receipt)
    }

    /// Remove every file the package's receipt lists, then the receipt.
    #[tracing::instrument(skip(self, layout))]
    pub fn uninstall(&self, name: &str, layout: &Layout) -> Result<Receipt> {
        let receipt_path = layout.receipt_path(name);
        if !self.runtime.exists(&receipt_path) {
            anyhow::bail!("{} is not installed", name);
        }

        let receipt = Receipt::load(&self.runtime, &receipt_path)?;
        remove_installed(&self.runtime, layout.prefix(), &receipt.files)?;
        self.runtime
            .remove_file(&receipt_path)
            .with_context(|| format!("Failed to remove receipt {:?}", receipt_path))?;

        info!("Uninstalled {} {}", receipt.name, receipt.version);
        Ok(receipt)
    }
}
