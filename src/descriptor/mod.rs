//! Package descriptors
//!
//! A descriptor is plain data: where to fetch a package, the digest the
//! archive must match, and the ordered steps that place its files.

mod audit;
pub mod builtin;
mod step;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::digest::validate_sha256;
use crate::runtime::Runtime;

pub use audit::{AuditWarning, audit};
pub use step::{InstallStep, Location};

/// The command run against an installed package to check it works.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SmokeTest {
    /// Executable name under `bin/`
    pub binary: String,
    #[serde(default = "default_test_args")]
    pub args: Vec<String>,
}

fn default_test_args() -> Vec<String> {
    vec!["--version".to_string()]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub homepage: String,
    pub url: String,
    pub sha256: String,
    /// Advisory only; nothing ties it to the archive content.
    pub version: String,
    #[serde(default)]
    pub license: Option<String>,
    /// A runtime that must already be present. Declared, never checked.
    #[serde(default)]
    pub depends_on: Option<String>,
    pub install: Vec<InstallStep>,
    /// Post-install text. `{prefix}`, `{bin}`, `{lib}`, `{etc}` and `{pkgshare}` are substituted.
    #[serde(default)]
    pub caveats: Option<String>,
    pub test: SmokeTest,
}

impl PackageDescriptor {
    /// Resolve a CLI argument to a descriptor: a built-in name, or a path to a JSON file.
    #[tracing::instrument(skip(runtime))]
    pub fn resolve<R: Runtime>(runtime: &R, name_or_path: &str) -> Result<Self> {
        if let Some(descriptor) = builtin::find(name_or_path) {
            debug!("Using built-in descriptor {}", name_or_path);
            return Ok(descriptor);
        }

        let path = Path::new(name_or_path);
        if runtime.exists(path) && !runtime.is_dir(path) {
            return Self::load(runtime, path);
        }

        bail!(
            "Unknown package '{}'. Built-in packages: {}. Or pass a path to a JSON descriptor.",
            name_or_path,
            builtin::names().join(", ")
        );
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read descriptor {:?}", path))?;
        let descriptor: PackageDescriptor = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor {:?}", path))?;
        descriptor
            .validate()
            .with_context(|| format!("Invalid descriptor {:?}", path))?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<()> {
        if !step::is_path_segment(&self.name) {
            bail!("Invalid package name '{}'", self.name);
        }
        if !step::is_path_segment(&self.version) {
            bail!("Invalid version '{}'", self.version);
        }
        if self.url.is_empty() {
            bail!("Missing url");
        }
        validate_sha256(&self.sha256)?;
        if self.install.is_empty() {
            bail!("No install steps");
        }
        for (index, step) in self.install.iter().enumerate() {
            for path in step.paths() {
                if !step::is_contained(path) {
                    bail!(
                        "Install step {} ({}) uses a path outside its root: {}",
                        index + 1,
                        step,
                        path
                    );
                }
            }
        }
        if !step::is_path_segment(&self.test.binary) {
            bail!("Invalid test binary '{}'", self.test.binary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    const DESCRIPTOR_JSON: &str = r#"{
        "name": "hello",
        "url": "https://example.com/hello-1.0.tar.gz",
        "sha256": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        "version": "1.0",
        "install": [
            { "action": "install", "source": "bin/hello", "into": "bin" }
        ],
        "test": { "binary": "hello" }
    }"#;

    #[test]
    fn test_resolve_builtin() {
        let runtime = MockRuntime::new();
        let descriptor = PackageDescriptor::resolve(&runtime, "ansible-bundler").unwrap();
        assert_eq!(descriptor, builtin::ansible_bundler());
    }

    #[test]
    fn test_resolve_json_file() {
        let path = PathBuf::from("hello.json");
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| true);
        runtime.expect_is_dir().returning(|_| false);
        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| Ok(DESCRIPTOR_JSON.to_string()));

        let descriptor = PackageDescriptor::resolve(&runtime, "hello.json").unwrap();
        assert_eq!(descriptor.name, "hello");
        assert_eq!(descriptor.test.args, vec!["--version"]);
        assert_eq!(descriptor.depends_on, None);
        assert_eq!(descriptor.caveats, None);
    }

    #[test]
    fn test_resolve_unknown() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let err = PackageDescriptor::resolve(&runtime, "nope").unwrap_err();
        assert!(err.to_string().contains("Unknown package 'nope'"));
        assert!(err.to_string().contains("ansible-bundler"));
    }

    #[test]
    fn test_load_rejects_bad_sha() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(DESCRIPTOR_JSON.replace("2cf24dba", "zz")));

        let err = PackageDescriptor::load(&runtime, Path::new("hello.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid sha256"));
    }

    #[test]
    fn test_validate_rejects_escaping_paths() {
        let mut descriptor = builtin::ansible_bundler();
        descriptor.install = vec![InstallStep::install("../../etc/passwd", Location::Etc)];
        let err = descriptor.validate().unwrap_err();
        assert!(err.to_string().contains("outside its root"));

        let mut descriptor = builtin::ansible_bundler();
        descriptor.install = vec![InstallStep::inreplace("/bin/sh", "a", "b")];
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_steps_and_names() {
        let mut descriptor = builtin::ansible_bundler();
        descriptor.install.clear();
        assert!(descriptor.validate().is_err());

        let mut descriptor = builtin::ansible_bundler();
        descriptor.name = "a/b".to_string();
        assert!(descriptor.validate().is_err());

        let mut descriptor = builtin::ansible_bundler();
        descriptor.test.binary = "../sh".to_string();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_versions_that_leave_scratch() {
        for version in ["", ".", "..", "x/../../..", "1.0/..", "..\\..", "1.0\\x"] {
            let mut descriptor = builtin::ansible_bundler();
            descriptor.version = version.to_string();
            let err = descriptor.validate().unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid version"),
                "{:?} was accepted",
                version
            );
        }

        let mut descriptor = builtin::ansible_bundler();
        descriptor.version = "2023.04.26..1".to_string();
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip_of_builtin() {
        let descriptor = builtin::ansible_bundler();
        let json = serde_json::to_string_pretty(&descriptor).unwrap();
        let parsed: PackageDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, descriptor);
    }
}
