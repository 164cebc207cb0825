use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::{
    descriptor::PackageDescriptor,
    install::{Layout, paths::resolve_prefix, self_test},
    runtime::Runtime,
};

/// Run an installed package's smoke test. Fails unless the test passes.
#[tracing::instrument(skip(runtime, prefix))]
pub fn test<R: Runtime>(runtime: R, package: &str, prefix: Option<PathBuf>) -> Result<()> {
    let descriptor = PackageDescriptor::resolve(&runtime, package)?;
    let layout = Layout::new(resolve_prefix(&runtime, prefix)?);

    let outcome = self_test(&runtime, &descriptor, &layout)?;
    let command = format!("{} {}", descriptor.test.binary, descriptor.test.args.join(" "));
    if !outcome.is_success() {
        bail!("Test of {} failed: `{}` {}", descriptor.name, command.trim_end(), outcome);
    }

    println!("Test of {} passed: `{}`", descriptor.name, command.trim_end());
    Ok(())
}
