//! Build configuration for native bindings to the CLASS Boltzmann solver.
//!
//! The pipeline runs in four stages, each usable on its own:
//!
//! 1. [`BuildEnv::from_env`] reads every environment variable once.
//! 2. [`extract_version`] pulls the CLASS version out of `include/common.h`.
//! 3. [`probe_mvec`] and [`resolve_numeric_include`] query the toolchain.
//! 4. [`assemble`] builds include paths, libraries and flags, which
//!    [`ExtensionDescriptor::classy`] packages into a target that a
//!    [`BuildStep`] compiles.
//!
//! [`Setup::resolve`] runs stages 2 through 4 in order.
//!
//! # Example
//!
//! ```no_run
//! use classy_build::{BuildEnv, CcBuildStep, Setup, rerun_directives};
//!
//! fn main() -> Result<(), classy_build::BuildConfigError> {
//!     let env = BuildEnv::from_env()?;
//!     for line in rerun_directives(&env) {
//!         println!("{line}");
//!     }
//!     let setup = Setup::resolve(&env, "csrc/classy_shim.c")?;
//!     setup.run_with(&mut CcBuildStep::for_build_script(&env))?;
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod invoke;
pub mod probe;
pub mod version;

pub use assemble::{AssembledFlags, assemble};
pub use descriptor::{ExtensionDescriptor, PackageMetadata, Setup};
pub use env::{BuildEnv, TargetOs};
pub use error::{BuildConfigError, Result};
pub use invoke::{
    BuildStep, BuiltExtension, CcBuildStep, LINK_ARGS_METADATA_KEY, OutputMode,
    cargo_directives, cdylib_link_directives, extension_directives, link_args_metadata,
    metadata_directives, rerun_directives,
};
pub use probe::{
    MvecProbe, ProbeStrategy, mvec_available_from_stderr, probe_mvec, resolve_numeric_include,
};
pub use version::extract_version;
