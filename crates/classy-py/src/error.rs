use classy_sys::ClassSysError;
use pyo3::exceptions::{PyException, PyRuntimeError};
use pyo3::prelude::*;

pyo3::create_exception!(classy, CosmoError, PyException, "Base class for all classy errors.");
pyo3::create_exception!(
    classy,
    CosmoNotLinkedError,
    CosmoError,
    "Raised when the extension was built without the CLASS library."
);

/// Register the exception types on the Python module.
pub fn register_exceptions(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("CosmoError", py.get_type_bound::<CosmoError>())?;
    m.add("CosmoNotLinkedError", py.get_type_bound::<CosmoNotLinkedError>())?;
    Ok(())
}

// Orphan rule prevents `impl From<ClassSysError> for PyErr`.

/// Convert a `ClassSysError` into the matching Python exception.
pub fn sys_err_to_pyerr(err: ClassSysError) -> PyErr {
    match err {
        ClassSysError::NotLinked => CosmoNotLinkedError::new_err(err.to_string()),
        ClassSysError::NullPointer | ClassSysError::InvalidUtf8(_) => {
            PyRuntimeError::new_err(format!("CLASS error: {err}"))
        }
    }
}
