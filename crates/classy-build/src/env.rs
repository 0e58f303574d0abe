//! Build environment, read once at the program boundary.
//!
//! Every environment variable the pipeline honours is read here and nowhere
//! else. Later stages receive a [`BuildEnv`] and never consult the process
//! environment themselves.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuildConfigError, Result};
use crate::probe::ProbeStrategy;

/// Compiler used when `CC` is unset.
pub const DEFAULT_COMPILER: &str = "gcc";

/// Interpreter used to locate the numeric library headers when `PYTHON` is unset.
pub const DEFAULT_PYTHON: &str = "python3";

/// CLASS checkout root relative to the binding sources when `CLASS_DIR` is unset.
pub const DEFAULT_CLASS_ROOT: &str = "..";

/// Every variable [`BuildEnv::from_env`] reads, for `rerun-if-env-changed`.
pub const WATCHED_VARS: &[&str] = &[
    "CC",
    "INCLUDES",
    "OMPFLAG",
    "CLASS_DIR",
    "PYTHON",
    "NUMPY_INCLUDE",
    "CLASSY_MVEC_PROBE",
    "CARGO_CFG_TARGET_OS",
];

// ── TargetOs ────────────────────────────────────────────────────────

/// Operating system the extension is linked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    MacOs,
    Linux,
    Other(String),
}

impl TargetOs {
    /// Parse an OS identifier as reported by `uname`, Cargo or
    /// `std::env::consts::OS`. Matching is case-insensitive.
    pub fn from_identifier(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" => Self::MacOs,
            "linux" => Self::Linux,
            other => Self::Other(other.to_string()),
        }
    }

    /// OS of the machine running this code.
    pub fn host() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

// ── BuildEnv ────────────────────────────────────────────────────────

/// Everything the pipeline needs from the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
    /// C compiler executable (`CC`, default `gcc`).
    pub compiler: String,
    /// Extra include directories from `INCLUDES`, `-I` prefix removed.
    pub extra_includes: Vec<PathBuf>,
    /// OpenMP flags from `OMPFLAG`, split on whitespace. Empty when unset.
    pub omp_flags: Vec<String>,
    /// OS used to pick OpenMP link flags.
    pub os: TargetOs,
    /// CLASS checkout holding `include/` and the prebuilt `libclass`.
    pub class_root: PathBuf,
    /// Interpreter queried for the numeric library include directory.
    pub python: String,
    /// Explicit numeric library include directory, bypassing the interpreter.
    pub numpy_include: Option<PathBuf>,
    /// How to decide whether `libmvec` can be linked.
    pub mvec_probe: ProbeStrategy,
}

impl Default for BuildEnv {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            extra_includes: Vec::new(),
            omp_flags: Vec::new(),
            os: TargetOs::host(),
            class_root: PathBuf::from(DEFAULT_CLASS_ROOT),
            python: DEFAULT_PYTHON.to_string(),
            numpy_include: None,
            mvec_probe: ProbeStrategy::default(),
        }
    }
}

impl BuildEnv {
    /// Read the process environment.
    ///
    /// - `CC` -> compiler (default `gcc`)
    /// - `INCLUDES` -> whitespace separated `-I<path>` entries
    /// - `OMPFLAG` -> whitespace separated OpenMP compile flags
    /// - `CARGO_CFG_TARGET_OS` -> target OS inside a build script, else the host OS
    /// - `CLASS_DIR`, `PYTHON`, `NUMPY_INCLUDE`, `CLASSY_MVEC_PROBE`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Used by [`BuildEnv::from_env`]
    /// and by tests that must not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Self::default();

        if let Some(cc) = lookup("CC").filter(|v| !v.trim().is_empty()) {
            env.compiler = cc.trim().to_string();
        }
        if let Some(includes) = lookup("INCLUDES") {
            env.extra_includes = parse_includes(&includes);
        }
        if let Some(flags) = lookup("OMPFLAG") {
            env.omp_flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(os) = lookup("CARGO_CFG_TARGET_OS") {
            env.os = TargetOs::from_identifier(&os);
        }
        if let Some(root) = lookup("CLASS_DIR").filter(|v| !v.trim().is_empty()) {
            env.class_root = PathBuf::from(root.trim());
        }
        if let Some(python) = lookup("PYTHON").filter(|v| !v.trim().is_empty()) {
            env.python = python.trim().to_string();
        }
        if let Some(dir) = lookup("NUMPY_INCLUDE").filter(|v| !v.trim().is_empty()) {
            env.numpy_include = Some(PathBuf::from(dir.trim()));
        }
        if let Some(strategy) = lookup("CLASSY_MVEC_PROBE").filter(|v| !v.trim().is_empty()) {
            env.mvec_probe = ProbeStrategy::from_str(&strategy)?;
        }

        tracing::debug!(
            compiler = %env.compiler,
            os = %env.os,
            class_root = %env.class_root.display(),
            openmp = env.openmp_requested(),
            "resolved build environment"
        );
        Ok(env)
    }

    /// Whether `OMPFLAG` asked for OpenMP.
    pub fn openmp_requested(&self) -> bool {
        !self.omp_flags.is_empty()
    }

    /// `<class_root>/include`
    pub fn class_include_dir(&self) -> PathBuf {
        self.class_root.join("include")
    }

    /// Header carrying the CLASS version line.
    pub fn version_header(&self) -> PathBuf {
        self.class_include_dir().join("common.h")
    }

    /// Directory holding the prebuilt `libclass`.
    pub fn class_library_dir(&self) -> &Path {
        &self.class_root
    }
}

/// Split an `INCLUDES` value on whitespace and strip a leading `-I` from each
/// entry. Entries that are only `-I` are dropped.
pub fn parse_includes(value: &str) -> Vec<PathBuf> {
    value
        .split_whitespace()
        .map(|entry| entry.strip_prefix("-I").unwrap_or(entry))
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

impl fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StderrHeuristic => write!(f, "stderr-heuristic"),
            Self::LinkTest => write!(f, "link-test"),
        }
    }
}

impl FromStr for ProbeStrategy {
    type Err = BuildConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" | "heuristic" => Ok(Self::StderrHeuristic),
            "link" | "link-test" => Ok(Self::LinkTest),
            _ => Err(BuildConfigError::InvalidProbeStrategy(s.to_string())),
        }
    }
}
