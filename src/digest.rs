//! SHA-256 hashing and archive verification.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::error::IntegrityError;
use crate::runtime::Runtime;

/// Lowercase hex SHA-256 of everything the reader yields.
pub fn sha256_hex_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn sha256_hex_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Checks that `value` looks like a SHA-256 hex digest.
pub fn validate_sha256(value: &str) -> Result<()> {
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid sha256 '{}': expected 64 hex characters", value);
    }
    Ok(())
}

/// Hash the file at `path` and compare it against `expected`.
///
/// A mismatch yields an [`IntegrityError`] as the root cause.
#[tracing::instrument(skip(runtime))]
pub fn verify_file<R: Runtime>(runtime: &R, path: &Path, expected: &str) -> Result<()> {
    debug!("Verifying {:?}...", path);
    let reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open {:?} for verification", path))?;
    let actual = sha256_hex_reader(reader)
        .with_context(|| format!("Failed to hash {:?}", path))?;

    if !actual.eq_ignore_ascii_case(expected) {
        return Err(IntegrityError {
            path: path.display().to_string(),
            expected: expected.to_ascii_lowercase(),
            actual,
        }
        .into());
    }

    info!("Checksum verified: {}", actual);
    Ok(())
}
