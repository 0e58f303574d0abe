//! Native bindings to the CLASS Boltzmann solver.
//!
//! The raw API lives in [`bindings`] and is only populated when the crate is
//! built with the `ffi` feature. Everything else in this crate is available in
//! every build.

#[cfg(feature = "ffi")]
use std::ffi::CStr;
#[cfg(feature = "ffi")]
use std::os::raw::{c_char, c_int};

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code)]
#[allow(clippy::all)]
pub mod bindings {
    include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
}

/// Error type for CLASS FFI calls
#[derive(Debug, thiserror::Error)]
pub enum ClassSysError {
    #[error("classy-sys was built without the `ffi` feature")]
    NotLinked,

    #[error("Null pointer returned from CLASS")]
    NullPointer,

    #[error("Invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, ClassSysError>;

#[cfg(feature = "ffi")]
unsafe extern "C" {
    fn classy_class_version() -> *const c_char;
    fn classy_openmp_enabled() -> c_int;
}

/// Package metadata recorded by the build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: &'static str,
    pub version: Option<&'static str>,
    pub description: &'static str,
    pub url: &'static str,
}

/// Metadata of this build. `version` is only known when the CLASS header was
/// read, i.e. with the `ffi` feature.
pub const PACKAGE: PackageInfo = PackageInfo {
    name: match option_env!("CLASSY_PACKAGE_NAME") {
        Some(name) => name,
        None => "classy",
    },
    version: option_env!("CLASSY_VERSION"),
    description: match option_env!("CLASSY_DESCRIPTION") {
        Some(description) => description,
        None => "Python interface to the Cosmological Boltzmann code CLASS",
    },
    url: match option_env!("CLASSY_URL") {
        Some(url) => url,
        None => "http://www.class-code.net",
    },
};

/// Linker arguments the final cdylib needs for OpenMP, space separated.
/// Empty without the `ffi` feature or when `OMPFLAG` was unset.
pub const OPENMP_LINK_ARGS: &str = match option_env!("CLASSY_OPENMP_LINK_ARGS") {
    Some(args) => args,
    None => "",
};

/// What the build script linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedCapabilities {
    /// The CLASS library and shim are linked.
    pub linked: bool,
    /// `libmvec` was found by the toolchain probe and linked.
    pub mvec: bool,
    /// `OMPFLAG` was set when the shim was compiled.
    pub openmp: bool,
}

impl LinkedCapabilities {
    /// Capabilities of the current build.
    pub const fn compiled() -> Self {
        Self {
            linked: cfg!(feature = "ffi"),
            mvec: flag_is_true(option_env!("CLASSY_LINKED_MVEC")),
            openmp: flag_is_true(option_env!("CLASSY_OPENMP")),
        }
    }

    /// One-line summary, e.g. `class=linked mvec=yes openmp=no`.
    pub fn summary(&self) -> String {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        format!(
            "class={} mvec={} openmp={}",
            if self.linked { "linked" } else { "unlinked" },
            yes_no(self.mvec),
            yes_no(self.openmp)
        )
    }
}

const fn flag_is_true(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(v.as_bytes(), b"true" | b"1"),
        None => false,
    }
}

/// Version string compiled into the linked CLASS library, e.g. `v3.2.1`.
pub fn class_version() -> Result<String> {
    #[cfg(feature = "ffi")]
    {
        // SAFETY: returns a pointer to a static string literal.
        let ptr = unsafe { classy_class_version() };
        if ptr.is_null() {
            return Err(ClassSysError::NullPointer);
        }
        // SAFETY: non-null and NUL terminated.
        let version = unsafe { CStr::from_ptr(ptr) };
        Ok(version.to_str()?.to_string())
    }

    #[cfg(not(feature = "ffi"))]
    {
        Err(ClassSysError::NotLinked)
    }
}

/// Whether the shim was compiled with OpenMP enabled.
pub fn openmp_enabled() -> Result<bool> {
    #[cfg(feature = "ffi")]
    {
        // SAFETY: no arguments, no side effects.
        Ok(unsafe { classy_openmp_enabled() } != 0)
    }

    #[cfg(not(feature = "ffi"))]
    {
        Err(ClassSysError::NotLinked)
    }
}

/// Strip the `v` prefix of a CLASS version string.
pub fn bare_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_version_drops_prefix_once() {
        assert_eq!(bare_version("v3.2.1"), "3.2.1");
        assert_eq!(bare_version("3.2.1"), "3.2.1");
        assert_eq!(bare_version("vv1"), "v1");
    }

    #[cfg(not(feature = "ffi"))]
    #[test]
    fn unlinked_build_reports_not_linked() {
        assert!(matches!(class_version(), Err(ClassSysError::NotLinked)));
        assert!(matches!(openmp_enabled(), Err(ClassSysError::NotLinked)));
        assert!(!LinkedCapabilities::compiled().linked);
        assert!(PACKAGE.version.is_none());
        assert!(OPENMP_LINK_ARGS.is_empty());
    }

    #[test]
    fn link_args_only_when_openmp_requested() {
        if !LinkedCapabilities::compiled().openmp {
            assert!(OPENMP_LINK_ARGS.is_empty());
        }
    }

    #[cfg(feature = "ffi")]
    #[test]
    fn linked_version_matches_package_metadata() {
        let version = class_version().unwrap();
        assert_eq!(Some(bare_version(&version)), PACKAGE.version);
    }
}
