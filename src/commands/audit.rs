use anyhow::Result;

use crate::{
    descriptor::{self, PackageDescriptor},
    runtime::Runtime,
};

/// Report descriptor problems that do not block installation
#[tracing::instrument(skip(runtime))]
pub fn audit<R: Runtime>(runtime: R, package: &str) -> Result<()> {
    let descriptor = PackageDescriptor::resolve(&runtime, package)?;
    let warnings = descriptor::audit(&descriptor);

    if warnings.is_empty() {
        println!("{}: no problems found", descriptor.name);
        return Ok(());
    }
    for warning in &warnings {
        println!("{}: {}", descriptor.name, warning);
    }
    println!("{} problem(s) in {}", warnings.len(), descriptor.name);
    Ok(())
}
