use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Where an `install` step places its matches, relative to the prefix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Prefix,
    Bin,
    Lib,
    /// `etc/<package>`
    Etc,
    /// `share/<package>`
    Pkgshare,
}

impl Location {
    pub fn relative_dir(&self, package: &str) -> PathBuf {
        match self {
            Location::Prefix => PathBuf::new(),
            Location::Bin => PathBuf::from("bin"),
            Location::Lib => PathBuf::from("lib"),
            Location::Etc => Path::new("etc").join(package),
            Location::Pkgshare => Path::new("share").join(package),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Location::Prefix => "prefix",
            Location::Bin => "bin",
            Location::Lib => "lib",
            Location::Etc => "etc",
            Location::Pkgshare => "pkgshare",
        }
    }
}

/// One action of a package's install procedure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InstallStep {
    /// Copy every match of `source` (a glob relative to the source tree) into
    /// `into`, keeping each match's file name. Directories are copied recursively.
    Install { source: String, into: Location },
    /// Replace `pattern` at the start of the first line of `path` (relative to the prefix).
    Inreplace {
        path: String,
        pattern: String,
        replacement: String,
    },
}

impl InstallStep {
    pub fn install(source: &str, into: Location) -> Self {
        InstallStep::Install {
            source: source.to_string(),
            into,
        }
    }

    pub fn inreplace(path: &str, pattern: &str, replacement: &str) -> Self {
        InstallStep::Inreplace {
            path: path.to_string(),
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }

    /// The path-like fields that must stay inside their root.
    pub(crate) fn paths(&self) -> Vec<&str> {
        match self {
            InstallStep::Install { source, .. } => vec![source.as_str()],
            InstallStep::Inreplace { path, .. } => vec![path.as_str()],
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStep::Install { source, into } => {
                write!(f, "{}.install {}", into.label(), source)
            }
            InstallStep::Inreplace {
                path,
                pattern,
                replacement,
            } => write!(f, "inreplace {} {:?} -> {:?}", path, pattern, replacement),
        }
    }
}

/// True if `path` is relative and never climbs out of its root.
/// A single file name: no separators, not `.` or `..`.
pub(crate) fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\'])
}

pub(crate) fn is_contained(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_dirs() {
        assert_eq!(Location::Prefix.relative_dir("pkg"), PathBuf::new());
        assert_eq!(Location::Bin.relative_dir("pkg"), PathBuf::from("bin"));
        assert_eq!(Location::Lib.relative_dir("pkg"), PathBuf::from("lib"));
        assert_eq!(Location::Etc.relative_dir("pkg"), PathBuf::from("etc/pkg"));
        assert_eq!(
            Location::Pkgshare.relative_dir("pkg"),
            PathBuf::from("share/pkg")
        );
    }

    #[test]
    fn test_step_json_shape() {
        let step: InstallStep =
            serde_json::from_str(r#"{"action":"install","source":"app/lib/*","into":"lib"}"#)
                .unwrap();
        assert_eq!(step, InstallStep::install("app/lib/*", Location::Lib));

        let step: InstallStep = serde_json::from_str(
            r#"{"action":"inreplace","path":"bin/x","pattern":"a","replacement":"b"}"#,
        )
        .unwrap();
        assert_eq!(step, InstallStep::inreplace("bin/x", "a", "b"));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<InstallStep, _> =
            serde_json::from_str(r#"{"action":"chmod","path":"bin/x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            InstallStep::install("examples", Location::Pkgshare).to_string(),
            "pkgshare.install examples"
        );
        assert_eq!(
            InstallStep::inreplace("bin/x", "#!a", "#!b").to_string(),
            r##"inreplace bin/x "#!a" -> "#!b""##
        );
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained("app/lib/*"));
        assert!(is_contained("./examples"));
        assert!(!is_contained(""));
        assert!(!is_contained("../outside"));
        assert!(!is_contained("/etc/passwd"));
        assert!(!is_contained("app/../../x"));
    }

    #[test]
    fn test_is_path_segment() {
        assert!(is_path_segment("2023.04.26"));
        assert!(is_path_segment("ansible-bundler"));
        assert!(!is_path_segment(""));
        assert!(!is_path_segment(".."));
        assert!(!is_path_segment("x/../.."));
        assert!(!is_path_segment("..\\x"));
    }
}
