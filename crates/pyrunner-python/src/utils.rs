//! Names shared between the host and interpreter-side code, plus error
//! formatting helpers

use pyo3::prelude::*;
use pyo3::types::PyModule;

/// Module through which interpreter code reaches the host
pub const HOST_MODULE: &str = "pyrunner_host";

/// Function the bootstrap script must define
pub const LOADER_FUNCTION: &str = "load_all_py_files";

/// Bootstrap resource executed on the first tick
pub const RUNNER_SCRIPT: &str = "runner.py";

/// Transfer-namespace key of the host data receiver
pub const DATA_RECEIVER_KEY: &str = "dataReceiver";

/// Transfer-namespace key of the configured module path
pub const MODULE_PATH_KEY: &str = "modulePath";

/// Transfer-namespace key of the published engine options
pub const ENGINE_OPTIONS_KEY: &str = "engineOptions";

/// Render a Python exception with its traceback.
///
/// Falls back to the bare `Type: message` form if the `traceback` module
/// itself fails.
pub fn format_python_error(py: Python<'_>, err: &PyErr) -> String {
    let formatted = (|| -> PyResult<String> {
        let traceback = PyModule::import(py, "traceback")?;
        let lines = traceback.call_method1(
            "format_exception",
            (err.get_type(py), err.value(py), err.traceback(py)),
        )?;
        let lines: Vec<String> = lines.extract()?;
        Ok(lines.concat())
    })();

    match formatted {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => err.to_string(),
    }
}
