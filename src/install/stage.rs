//! Runs a descriptor's install steps against a staging image.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::Path;

use crate::descriptor::{InstallStep, Location, PackageDescriptor};
use crate::error::InstallStepError;
use crate::inreplace::inreplace_file;
use crate::runtime::Runtime;

/// Apply every step in order. `image` stands in for the prefix.
///
/// The first failing step aborts the run with an [`InstallStepError`] in the chain.
#[tracing::instrument(skip(runtime, descriptor))]
pub fn run_steps<R: Runtime>(
    runtime: &R,
    descriptor: &PackageDescriptor,
    source_root: &Path,
    image: &Path,
) -> Result<()> {
    runtime.create_dir_all(image)?;

    for (index, step) in descriptor.install.iter().enumerate() {
        info!("[{}/{}] {}", index + 1, descriptor.install.len(), step);
        run_step(runtime, &descriptor.name, step, source_root, image).with_context(|| {
            InstallStepError {
                index: index + 1,
                step: step.to_string(),
            }
        })?;
    }

    Ok(())
}

fn run_step<R: Runtime>(
    runtime: &R,
    package: &str,
    step: &InstallStep,
    source_root: &Path,
    image: &Path,
) -> Result<()> {
    match step {
        InstallStep::Install { source, into } => {
            let pattern = format!(
                "{}/{}",
                glob::Pattern::escape(&source_root.to_string_lossy()),
                source
            );
            let matches = runtime.glob(&pattern)?;
            if matches.is_empty() {
                bail!("No files in the source archive match {}", source);
            }

            let dest_dir = image.join(into.relative_dir(package));
            runtime.create_dir_all(&dest_dir)?;

            for path in matches {
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                let dest = dest_dir.join(file_name);
                debug!("Installing {:?} -> {:?}", path, dest);
                copy_tree(runtime, &path, &dest)?;

                if *into == Location::Bin && !runtime.is_dir(&dest) {
                    runtime.set_permissions(&dest, 0o755)?;
                }
            }
            Ok(())
        }
        InstallStep::Inreplace {
            path,
            pattern,
            replacement,
        } => {
            let target = image.join(path);
            if !runtime.exists(&target) {
                bail!("{} has not been installed by an earlier step", path);
            }
            inreplace_file(runtime, &target, pattern, replacement)
        }
    }
}

/// Copy a file, or a directory recursively, to `to`.
pub fn copy_tree<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> Result<()> {
    if runtime.is_dir(from) {
        runtime.create_dir_all(to)?;
        for entry in runtime.read_dir(from)? {
            let Some(name) = entry.file_name() else {
                continue;
            };
            copy_tree(runtime, &entry, &to.join(name))?;
        }
    } else {
        runtime
            .copy(from, to)
            .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
    }
    Ok(())
}
