use anyhow::Result;
use std::fmt::{self, Write};
use std::path::PathBuf;

use crate::{
    descriptor::PackageDescriptor,
    install::{Layout, paths::resolve_prefix},
    package::Receipt,
    runtime::Runtime,
};

/// Show a package's descriptor and install state
#[tracing::instrument(skip(runtime, prefix))]
pub fn show<R: Runtime>(runtime: R, package: &str, prefix: Option<PathBuf>) -> Result<()> {
    let descriptor = PackageDescriptor::resolve(&runtime, package)?;
    let layout = Layout::new(resolve_prefix(&runtime, prefix)?);

    let receipt_path = layout.receipt_path(&descriptor.name);
    let receipt = if runtime.exists(&receipt_path) {
        Some(Receipt::load(&runtime, &receipt_path)?)
    } else {
        None
    };

    print!("{}", render(&descriptor, receipt.as_ref())?);
    Ok(())
}

fn render(descriptor: &PackageDescriptor, receipt: Option<&Receipt>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{}: {}", descriptor.name, descriptor.version)?;
    for line in [&descriptor.description, &descriptor.homepage] {
        if !line.is_empty() {
            writeln!(out, "{}", line)?;
        }
    }
    if let Some(license) = &descriptor.license {
        writeln!(out, "License: {}", license)?;
    }
    writeln!(out, "Source: {}", descriptor.url)?;
    writeln!(out, "SHA-256: {}", descriptor.sha256)?;
    if let Some(dep) = &descriptor.depends_on {
        writeln!(out, "Depends on: {}", dep)?;
    }

    writeln!(out, "Install steps:")?;
    for (i, step) in descriptor.install.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, step)?;
    }

    match receipt {
        Some(r) => writeln!(out, "Installed: {} ({} files)", r.version, r.files.len())?,
        None => writeln!(out, "Not installed")?,
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::builtin::ansible_bundler;

    #[test]
    fn test_render_not_installed() {
        let text = render(&ansible_bundler(), None).unwrap();
        assert!(text.starts_with(
            "ansible-bundler: 2023.04.26\nAnsible Bundler provides the ability"
        ));
        assert!(text.contains("\nhttps://github.com/cowdogmoo/ansible-bundler\nLicense:"));
        assert!(text.contains("License: BSD-3-Clause"));
        assert!(text.contains("Depends on: python@3.11"));
        assert!(text.contains("  1. bin.install app/bin/bundle-playbook"));
        assert!(text.contains("  5. pkgshare.install examples"));
        assert!(text.ends_with("Not installed\n"));
    }

    #[test]
    fn test_render_installed() {
        let receipt = Receipt::new(
            &ansible_bundler(),
            vec![PathBuf::from("bin/bundle-playbook"), PathBuf::from("lib/x.so")],
        );
        let text = render(&ansible_bundler(), Some(&receipt)).unwrap();
        assert!(text.ends_with("Installed: 2023.04.26 (2 files)\n"));
    }
}
