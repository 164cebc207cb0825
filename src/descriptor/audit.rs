use std::fmt;

use super::PackageDescriptor;
use crate::digest::validate_sha256;

/// A descriptor smell that does not block installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditWarning {
    /// The url follows a branch head, so its content can drift away from `sha256`.
    MovingSourceReference(String),
    /// The version label does not appear anywhere in the url.
    VersionNotInUrl(String),
    /// No runtime dependency is declared.
    NoRuntimeDependency,
    /// A `http://` url.
    InsecureUrl(String),
    /// `sha256` is not 64 hex digits; loading rejects this too.
    MalformedSha256(String),
    /// Nothing would be installed.
    NoInstallSteps,
}

impl fmt::Display for AuditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditWarning::MovingSourceReference(url) => write!(
                f,
                "url {} tracks a branch; pin a tag or release archive so the sha256 stays valid",
                url
            ),
            AuditWarning::VersionNotInUrl(version) => write!(
                f,
                "version {} is not part of the url and is not checked against the archive",
                version
            ),
            AuditWarning::NoRuntimeDependency => write!(f, "no runtime dependency declared"),
            AuditWarning::InsecureUrl(url) => write!(f, "url {} is not fetched over https", url),
            AuditWarning::MalformedSha256(sha) => write!(f, "sha256 {:?} is not 64 hex digits", sha),
            AuditWarning::NoInstallSteps => write!(f, "no install steps"),
        }
    }
}

const BRANCH_MARKERS: &[&str] = &[
    "/refs/heads/",
    "/archive/master.",
    "/archive/main.",
    "/archive/develop.",
];

pub fn audit(descriptor: &PackageDescriptor) -> Vec<AuditWarning> {
    let mut warnings = Vec::new();
    let url = descriptor.url.as_str();

    if BRANCH_MARKERS.iter().any(|m| url.contains(m)) {
        warnings.push(AuditWarning::MovingSourceReference(url.to_string()));
    }
    if !url.contains(&descriptor.version) {
        warnings.push(AuditWarning::VersionNotInUrl(descriptor.version.clone()));
    }
    if descriptor.depends_on.is_none() {
        warnings.push(AuditWarning::NoRuntimeDependency);
    }
    if url.starts_with("http://") {
        warnings.push(AuditWarning::InsecureUrl(url.to_string()));
    }
    if validate_sha256(&descriptor.sha256).is_err() {
        warnings.push(AuditWarning::MalformedSha256(descriptor.sha256.clone()));
    }
    if descriptor.install.is_empty() {
        warnings.push(AuditWarning::NoInstallSteps);
    }

    warnings
}
