//! Line-anchored text substitution for installed files.
//!
//! Only the first line is considered. A match means the line starts with the
//! literal pattern; the matched prefix is replaced and the rest of the file is
//! kept byte-for-byte.
//!
//! Homebrew's `inreplace` with a `^`-anchored regex would rewrite every line
//! that starts with the pattern. Here the pattern is a shebang, so lines further
//! down (a heredoc that writes another script, say) are left alone, and a file
//! whose first line does not match fails the step.

use anyhow::{Context, Result, bail};
use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

/// Rewrite the first line of `contents` if it starts with `pattern`.
///
/// Returns `None` when the first line does not match.
pub fn replace_first_line(contents: &[u8], pattern: &str, replacement: &str) -> Option<Vec<u8>> {
    if pattern.is_empty() || pattern.contains('\n') {
        return None;
    }

    let line_end = contents
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(contents.len());
    let first_line = &contents[..line_end];

    if !first_line.starts_with(pattern.as_bytes()) {
        return None;
    }

    let mut out = Vec::with_capacity(contents.len() + replacement.len());
    out.extend_from_slice(replacement.as_bytes());
    out.extend_from_slice(&contents[pattern.len()..]);
    Some(out)
}

/// Apply [`replace_first_line`] to a file in place, keeping its permissions.
#[tracing::instrument(skip(runtime))]
pub fn inreplace_file<R: Runtime>(
    runtime: &R,
    path: &Path,
    pattern: &str,
    replacement: &str,
) -> Result<()> {
    let contents = runtime
        .read(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    let Some(patched) = replace_first_line(&contents, pattern, replacement) else {
        bail!(
            "First line of {:?} does not start with {:?}",
            path,
            pattern
        );
    };

    let was_executable = runtime.is_executable(path);
    runtime
        .write(path, &patched)
        .with_context(|| format!("Failed to write {:?}", path))?;
    if was_executable {
        runtime.set_permissions(path, 0o755)?;
    }

    debug!("Replaced {:?} with {:?} in {:?}", pattern, replacement, path);
    Ok(())
}
