use anyhow::Result;
use log::{debug, warn};
use std::fmt;
use std::path::PathBuf;

use crate::descriptor::PackageDescriptor;
use crate::runtime::Runtime;

use super::paths::Layout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfTestOutcome {
    Passed,
    Missing(PathBuf),
    NotExecutable(PathBuf),
    /// The process could not be started
    SpawnFailed(String),
    /// Exit code, or None when killed by a signal
    Failed(Option<i32>),
}

impl SelfTestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SelfTestOutcome::Passed)
    }
}

impl fmt::Display for SelfTestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfTestOutcome::Passed => write!(f, "passed"),
            SelfTestOutcome::Missing(path) => write!(f, "{} is not installed", path.display()),
            SelfTestOutcome::NotExecutable(path) => {
                write!(f, "{} is not executable", path.display())
            }
            SelfTestOutcome::SpawnFailed(reason) => write!(f, "could not be run: {}", reason),
            SelfTestOutcome::Failed(Some(code)) => write!(f, "exited with status {}", code),
            SelfTestOutcome::Failed(None) => write!(f, "terminated by a signal"),
        }
    }
}

/// Run the descriptor's smoke test against the installed binary.
#[tracing::instrument(skip(runtime, descriptor, layout), fields(package = %descriptor.name))]
pub fn self_test<R: Runtime>(
    runtime: &R,
    descriptor: &PackageDescriptor,
    layout: &Layout,
) -> Result<SelfTestOutcome> {
    let binary = layout.bin().join(&descriptor.test.binary);

    if !runtime.exists(&binary) {
        return Ok(SelfTestOutcome::Missing(binary));
    }
    if !runtime.is_executable(&binary) {
        return Ok(SelfTestOutcome::NotExecutable(binary));
    }

    debug!("Running {:?} {:?}", binary, descriptor.test.args);
    let outcome = match runtime.run(&binary, &descriptor.test.args) {
        Ok(Some(0)) => SelfTestOutcome::Passed,
        Ok(code) => SelfTestOutcome::Failed(code),
        Err(e) => {
            warn!("{:#}", e);
            SelfTestOutcome::SpawnFailed(format!("{:#}", e))
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::builtin::ansible_bundler;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn binary() -> PathBuf {
        Layout::new("/opt/pkg").bin().join("bundle-playbook")
    }

    fn runtime_with(exists: bool, executable: bool) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(binary()))
            .returning(move |_| exists);
        runtime
            .expect_is_executable()
            .with(eq(binary()))
            .returning(move |_| executable);
        runtime
    }

    fn run_self_test(runtime: &MockRuntime) -> SelfTestOutcome {
        self_test(runtime, &ansible_bundler(), &Layout::new("/opt/pkg")).unwrap()
    }

    #[test]
    fn test_passes_on_exit_zero() {
        let mut runtime = runtime_with(true, true);
        runtime
            .expect_run()
            .withf(|program, args| {
                program == binary().as_path() && args == ["--version".to_string()]
            })
            .returning(|_, _| Ok(Some(0)));

        let outcome = run_self_test(&runtime);
        assert!(outcome.is_success());
        assert_eq!(outcome.to_string(), "passed");
    }

    #[test]
    fn test_missing_binary() {
        let runtime = runtime_with(false, false);
        assert_eq!(run_self_test(&runtime), SelfTestOutcome::Missing(binary()));
    }

    #[test]
    fn test_not_executable() {
        let runtime = runtime_with(true, false);
        assert_eq!(
            run_self_test(&runtime),
            SelfTestOutcome::NotExecutable(binary())
        );
    }

    #[test]
    fn test_nonzero_exit_fails() {
        let mut runtime = runtime_with(true, true);
        runtime.expect_run().returning(|_, _| Ok(Some(127)));

        let outcome = run_self_test(&runtime);
        assert_eq!(outcome, SelfTestOutcome::Failed(Some(127)));
        assert!(!outcome.is_success());
        assert_eq!(outcome.to_string(), "exited with status 127");
    }

    #[test]
    fn test_signal_and_spawn_failure() {
        let mut runtime = runtime_with(true, true);
        runtime.expect_run().returning(|_, _| Ok(None));
        assert_eq!(run_self_test(&runtime), SelfTestOutcome::Failed(None));

        let mut runtime = runtime_with(true, true);
        runtime
            .expect_run()
            .returning(|_, _| Err(anyhow::anyhow!("Exec format error")));
        let outcome = run_self_test(&runtime);
        assert!(matches!(outcome, SelfTestOutcome::SpawnFailed(ref r) if r.contains("Exec format")));
    }
}
