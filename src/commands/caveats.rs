use anyhow::Result;
use std::path::PathBuf;

use crate::{
    descriptor::PackageDescriptor,
    install::{self, Layout, paths::resolve_prefix},
    runtime::Runtime,
};

/// Print a package's post-install message
#[tracing::instrument(skip(runtime, prefix))]
pub fn caveats<R: Runtime>(runtime: R, package: &str, prefix: Option<PathBuf>) -> Result<()> {
    let descriptor = PackageDescriptor::resolve(&runtime, package)?;
    let layout = Layout::new(resolve_prefix(&runtime, prefix)?);

    match install::caveats(&descriptor, &layout) {
        Some(text) => println!("{}", text.trim_end()),
        None => println!("{} has no caveats.", descriptor.name),
    }
    Ok(())
}
