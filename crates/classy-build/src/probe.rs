//! Toolchain capability probes.
//!
//! Two questions are answered by running external programs:
//!
//! - can the compiler link `libmvec` (glibc's vector math library)?
//! - where does the numeric library keep its C headers?
//!
//! Both block until the child exits. There is no timeout.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::env::BuildEnv;
use crate::error::{BuildConfigError, Result};

/// Library name searched for in probe diagnostics.
pub const MVEC_LIB: &str = "mvec";

/// Program compiled by [`ProbeStrategy::LinkTest`].
const LINK_TEST_SOURCE: &str = "\
#include <math.h>
int main(void) {
    volatile double x = 0.5;
    return (int) sin(x);
}
";

/// How [`probe_mvec`] decides whether `libmvec` is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeStrategy {
    /// Run `<cc> -lmvec` and look for `mvec` in its stderr. The library is
    /// considered available when the diagnostics do not mention it.
    #[default]
    StderrHeuristic,
    /// Compile and link a trivial program against `-lmvec` and trust the
    /// exit status.
    LinkTest,
}

/// Outcome of [`probe_mvec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvecProbe {
    pub strategy: ProbeStrategy,
    pub available: bool,
}

impl MvecProbe {
    /// A probe result that was decided without running anything.
    pub const fn assume(available: bool) -> Self {
        Self { strategy: ProbeStrategy::StderrHeuristic, available }
    }
}

/// Probe whether `compiler` can link `libmvec`.
///
/// # Errors
///
/// [`BuildConfigError::ProbeLaunch`] if the compiler cannot be started. A
/// compiler that starts but fails is a normal probe outcome, not an error.
pub fn probe_mvec(compiler: &str, strategy: ProbeStrategy) -> Result<MvecProbe> {
    let available = match strategy {
        ProbeStrategy::StderrHeuristic => {
            let stderr = run_stderr_probe(compiler)?;
            mvec_available_from_stderr(&stderr)
        }
        ProbeStrategy::LinkTest => run_link_test(compiler)?,
    };

    tracing::info!(%compiler, ?strategy, available, "mvec probe finished");
    Ok(MvecProbe { strategy, available })
}

/// Classify the stderr of `<cc> -lmvec`.
///
/// Containment is checked on raw bytes, so non-UTF-8 diagnostics are fine.
pub fn mvec_available_from_stderr(stderr: &[u8]) -> bool {
    !contains_bytes(stderr, MVEC_LIB.as_bytes())
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn launch_error(compiler: &str) -> impl FnOnce(std::io::Error) -> BuildConfigError + '_ {
    move |source| BuildConfigError::ProbeLaunch { compiler: compiler.to_string(), source }
}

fn run_stderr_probe(compiler: &str) -> Result<Vec<u8>> {
    let output = Command::new(compiler)
        .arg(format!("-l{MVEC_LIB}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(launch_error(compiler))?;

    tracing::debug!(
        status = ?output.status.code(),
        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
        "mvec stderr probe output"
    );
    Ok(output.stderr)
}

fn run_link_test(compiler: &str) -> Result<bool> {
    let scratch = tempfile::tempdir().map_err(|source| BuildConfigError::Io {
        path: std::env::temp_dir(),
        source,
    })?;
    let source_path = scratch.path().join("mvec_probe.c");
    fs::write(&source_path, LINK_TEST_SOURCE)
        .map_err(|source| BuildConfigError::Io { path: source_path.clone(), source })?;

    let status = Command::new(compiler)
        .arg(&source_path)
        .arg("-o")
        .arg(scratch.path().join("mvec_probe"))
        .arg(format!("-l{MVEC_LIB}"))
        .arg("-lm")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(launch_error(compiler))?;

    Ok(status.success())
}

/// Locate the numeric library (NumPy) C headers.
///
/// `env.numpy_include` wins when set. Otherwise the interpreter in
/// `env.python` is asked for `numpy.get_include()`.
///
/// # Errors
///
/// [`BuildConfigError::NumericInclude`] if the interpreter cannot be started,
/// exits unsuccessfully, or prints nothing.
pub fn resolve_numeric_include(env: &BuildEnv) -> Result<PathBuf> {
    if let Some(dir) = &env.numpy_include {
        return Ok(dir.clone());
    }

    let output = Command::new(&env.python)
        .args(["-c", "import numpy; print(numpy.get_include())"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| BuildConfigError::NumericInclude(format!("cannot run {}: {e}", env.python)))?;

    if !output.status.success() {
        return Err(BuildConfigError::NumericInclude(format!(
            "{} exited with {}: {}",
            env.python,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if dir.is_empty() {
        return Err(BuildConfigError::NumericInclude(format!(
            "{} printed an empty include path",
            env.python
        )));
    }

    tracing::debug!(include = %dir, "numeric library include directory");
    Ok(PathBuf::from(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_diagnostic_means_unavailable() {
        let stderr = b"/usr/bin/ld: cannot find -lmvec: No such file or directory\n\
                       collect2: error: ld returned 1 exit status\n";
        assert!(!mvec_available_from_stderr(stderr));
    }

    #[test]
    fn unrelated_diagnostic_means_available() {
        let stderr = b"/usr/bin/ld: (.text+0x1b): undefined reference to `main'\n";
        assert!(mvec_available_from_stderr(stderr));
    }

    #[test]
    fn empty_stderr_means_available() {
        assert!(mvec_available_from_stderr(b""));
    }

    #[test]
    fn non_utf8_stderr_is_classified() {
        let stderr = [0xff, 0xfe, b'm', b'v', b'e', b'c', 0x80];
        assert!(!mvec_available_from_stderr(&stderr));
    }

    #[test]
    fn unlaunchable_compiler_is_an_error() {
        let err = probe_mvec("/nonexistent/classy-cc", ProbeStrategy::StderrHeuristic)
            .unwrap_err();
        assert!(matches!(err, BuildConfigError::ProbeLaunch { .. }));
    }

    #[test]
    fn numpy_include_override_skips_interpreter() {
        let env = BuildEnv {
            python: "/nonexistent/python".into(),
            numpy_include: Some(PathBuf::from("/opt/numpy/include")),
            ..BuildEnv::default()
        };
        assert_eq!(resolve_numeric_include(&env).unwrap(), PathBuf::from("/opt/numpy/include"));
    }

    #[test]
    fn missing_interpreter_is_reported() {
        let env = BuildEnv { python: "/nonexistent/python".into(), ..BuildEnv::default() };
        let err = resolve_numeric_include(&env).unwrap_err();
        assert!(matches!(err, BuildConfigError::NumericInclude(_)));
    }
}
