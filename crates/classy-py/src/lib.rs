//! The `classy` Python extension module.
//!
//! Exposes the package metadata recorded at build time and what the build
//! linked. Build with `--features extension-module,ffi` to produce the
//! loadable module.

mod error;

use classy_sys::{LinkedCapabilities, PACKAGE, bare_version};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::{register_exceptions, sys_err_to_pyerr};

/// Version reported as `classy.__version__`: the CLASS version read from its
/// header when linked, the crate version otherwise.
pub fn package_version() -> &'static str {
    PACKAGE.version.unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Linker arguments the build script added to this cdylib, as relayed from
/// `classy-sys`.
pub const CDYLIB_LINK_ARGS: &str = env!("CLASSY_CDYLIB_LINK_ARGS");

/// Key/value pairs returned by `classy.build_info()`.
pub fn build_info_pairs() -> Vec<(&'static str, String)> {
    let caps = LinkedCapabilities::compiled();
    vec![
        ("name", PACKAGE.name.to_string()),
        ("version", package_version().to_string()),
        ("class_linked", caps.linked.to_string()),
        ("mvec", caps.mvec.to_string()),
        ("openmp", caps.openmp.to_string()),
        ("link_args", CDYLIB_LINK_ARGS.to_string()),
        ("summary", caps.summary()),
    ]
}

/// Version string compiled into the linked CLASS library, without the `v`.
#[pyfunction]
fn class_version() -> PyResult<String> {
    let version = classy_sys::class_version().map_err(sys_err_to_pyerr)?;
    Ok(bare_version(&version).to_string())
}

/// Whether the CLASS shim was compiled with OpenMP.
#[pyfunction]
fn openmp_enabled() -> PyResult<bool> {
    classy_sys::openmp_enabled().map_err(sys_err_to_pyerr)
}

/// Build configuration as a dict.
#[pyfunction]
fn build_info(py: Python<'_>) -> PyResult<PyObject> {
    let info = PyDict::new_bound(py);
    for (key, value) in build_info_pairs() {
        info.set_item(key, value)?;
    }
    Ok(info.into())
}

#[pymodule]
fn classy(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", package_version())?;
    m.add("__description__", PACKAGE.description)?;
    m.add("__url__", PACKAGE.url)?;
    m.add_function(wrap_pyfunction!(class_version, m)?)?;
    m.add_function(wrap_pyfunction!(openmp_enabled, m)?)?;
    m.add_function(wrap_pyfunction!(build_info, m)?)?;
    register_exceptions(py, m)?;
    Ok(())
}
