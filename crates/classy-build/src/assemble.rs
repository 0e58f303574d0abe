//! Include path, library and flag assembly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::env::{BuildEnv, TargetOs};
use crate::probe::{MVEC_LIB, MvecProbe};

/// The CLASS solver library.
pub const CLASS_LIB: &str = "class";
/// BLAS implementation CLASS is linked against.
pub const BLAS_LIB: &str = "openblas";
/// libm
pub const MATH_LIB: &str = "m";

/// Link flags forwarding OpenMP through Apple clang's preprocessor.
pub const MACOS_OPENMP_LINK_ARGS: &[&str] = &["-Xpreprocessor", "-fopenmp"];
/// Link flag enabling the GNU OpenMP runtime.
pub const LINUX_OPENMP_LINK_ARGS: &[&str] = &["-fopenmp"];

/// Compile and link inputs for the extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledFlags {
    pub include_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub compile_args: Vec<String>,
    pub link_args: Vec<String>,
    /// Configuration problems that did not stop assembly.
    pub warnings: Vec<String>,
}

/// Assemble include directories, libraries and flags.
///
/// Include directories are the numeric library headers, the CLASS headers,
/// then every `INCLUDES` entry in order. Libraries are `class`, `openblas`,
/// then `mvec` and `m` or only `m` depending on the probe. OpenMP flags are
/// added only when `OMPFLAG` is set.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use classy_build::{BuildEnv, MvecProbe, TargetOs, assemble};
///
/// let env = BuildEnv { os: TargetOs::Linux, ..BuildEnv::default() };
/// let flags = assemble(&env, PathBuf::from("/numpy/include"), MvecProbe::assume(false));
/// assert_eq!(flags.libraries, ["class", "openblas", "m"]);
/// assert!(flags.compile_args.is_empty());
/// ```
pub fn assemble(env: &BuildEnv, numeric_include: PathBuf, mvec: MvecProbe) -> AssembledFlags {
    let mut flags = AssembledFlags::default();

    flags.include_dirs.push(numeric_include);
    flags.include_dirs.push(env.class_include_dir());
    flags.include_dirs.extend(env.extra_includes.iter().cloned());

    flags.libraries.push(CLASS_LIB.to_string());
    flags.libraries.push(BLAS_LIB.to_string());
    if mvec.available {
        flags.libraries.push(MVEC_LIB.to_string());
    }
    flags.libraries.push(MATH_LIB.to_string());

    if env.openmp_requested() {
        flags.compile_args.extend(env.omp_flags.iter().cloned());
        match &env.os {
            TargetOs::MacOs => {
                flags.link_args.extend(MACOS_OPENMP_LINK_ARGS.iter().map(|s| s.to_string()));
            }
            TargetOs::Linux => {
                flags.link_args.extend(LINUX_OPENMP_LINK_ARGS.iter().map(|s| s.to_string()));
            }
            TargetOs::Other(name) => {
                let warning = format!(
                    "OMPFLAG is set but no OpenMP link flags are known for `{name}`; \
                     the extension is linked without them"
                );
                tracing::warn!(os = %name, "{warning}");
                flags.warnings.push(warning);
            }
        }
    }

    tracing::debug!(
        includes = flags.include_dirs.len(),
        libraries = ?flags.libraries,
        compile_args = ?flags.compile_args,
        link_args = ?flags.link_args,
        "assembled extension flags"
    );
    flags
}
