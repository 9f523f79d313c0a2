use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving the embedded interpreter
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Python error: {0}")]
    Python(String),

    #[error("Failed to initialize Python interpreter: {0}")]
    Initialization(String),

    #[error("Failed to evaluate '{filename}':\n{message}")]
    Evaluation { filename: String, message: String },

    #[error("Bootstrap resource '{name}' not found in {dir}")]
    ResourceNotFound { name: String, dir: PathBuf },

    #[error("Missing required Python function: {0}")]
    LoaderMissing(String),

    #[error("Python file loading failed: {0}")]
    LoaderFailed(#[source] io::Error),

    #[error("Python loader run was interrupted by the scheduler")]
    Interrupted,

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pyo3::create_exception!(
    pyrunner_host,
    RunInterrupted,
    pyo3::exceptions::PyBaseException,
    "Raised inside a loader run when the scheduler is stopped."
);

/// Generic conversion from PyErr to BridgeError.
///
/// NOTE: This conversion loses the Python traceback. Where the traceback
/// matters (evaluation and loader failures) use `format_python_error()`.
impl From<pyo3::PyErr> for BridgeError {
    fn from(err: pyo3::PyErr) -> Self {
        BridgeError::Python(format!("{}", err))
    }
}
