//! Host objects exposed to interpreter code
//!
//! `DataReceiver` is the object staged under `dataReceiver`. Its
//! `process_data_func()` hands out a `ProcessDataFunction`, a named class
//! rather than a closure, and always the same instance, so interpreter code
//! can hold on to it and compare it by identity.

use pyo3::prelude::*;
use pyrunner_logger as logger;
use std::sync::Arc;

/// Prefix added by [`DataProcessor::process_data`]
pub const PROCESSED_PREFIX: &str = "Processed: ";

/// Sentinel returned by [`DataProcessor::process_other`]
pub const PROBE_RESPONSE: &str = "Other Processed";

/// Host-side logic behind the bridge, free of any interpreter dependency
#[derive(Debug, Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn process_data(&self, data: &str) -> String {
        logger::debug(&format!("DataReceiver received data: {}", data));
        format!("{}{}", PROCESSED_PREFIX, data)
    }

    pub fn process_other(&self) -> String {
        PROBE_RESPONSE.to_string()
    }
}

#[pyclass(module = "pyrunner_host", frozen)]
pub struct DataReceiver {
    processor: Arc<DataProcessor>,
    func: Py<ProcessDataFunction>,
}

impl DataReceiver {
    pub fn new(py: Python<'_>) -> PyResult<Self> {
        let processor = Arc::new(DataProcessor);
        let func = Py::new(
            py,
            ProcessDataFunction {
                processor: Arc::clone(&processor),
            },
        )?;
        Ok(Self { processor, func })
    }
}

#[pymethods]
impl DataReceiver {
    fn process_data(&self, data: &str) -> String {
        self.processor.process_data(data)
    }

    fn process_other(&self) -> String {
        self.processor.process_other()
    }

    fn process_data_func(&self, py: Python<'_>) -> Py<ProcessDataFunction> {
        self.func.clone_ref(py)
    }

    fn __repr__(&self) -> String {
        "<pyrunner_host.DataReceiver>".to_string()
    }
}

/// Callable wrapper that forwards to `DataReceiver.process_data`
#[pyclass(module = "pyrunner_host", frozen)]
pub struct ProcessDataFunction {
    processor: Arc<DataProcessor>,
}

#[pymethods]
impl ProcessDataFunction {
    fn apply(&self, data: &str) -> String {
        self.processor.process_data(data)
    }

    fn __call__(&self, data: &str) -> String {
        self.processor.process_data(data)
    }

    fn __repr__(&self) -> String {
        "<pyrunner_host.ProcessDataFunction>".to_string()
    }
}
