//! Periodic loader task
//!
//! The first successful run bootstraps the interpreter: it stages the host
//! receiver and module path, pulls them into the globals, extends `sys.path`
//! and executes the runner script. Every run then calls the runner's
//! `load_all_py_files(path)`. A failed bootstrap leaves the task
//! `Uninitialized` and is repeated from scratch on the next tick; a failed
//! loader call never sends it back.

use crate::context::InterpreterContext;
use crate::errors::{BridgeError, RunInterrupted};
use crate::receiver::DataReceiver;
use crate::resources::Resources;
use crate::service::{Interrupter, ScheduledTask};
use crate::utils::{
    format_python_error, DATA_RECEIVER_KEY, HOST_MODULE, LOADER_FUNCTION, MODULE_PATH_KEY,
    RUNNER_SCRIPT,
};
use pyo3::prelude::*;
use pyo3::types::{PyModule, PyString};
use pyrunner_config::{ModulePath, RunnerSettings};
use parking_lot::Mutex;
use pyo3::ffi;
use pyrunner_logger as logger;
use std::collections::HashSet;
use std::io;
use std::os::raw::c_long;
use std::sync::Arc;
use std::time::Instant;

const IMPORT_BINDINGS_SOURCE: &str = concat!(
    "dataReceiver = pyrunner_host.import_value('dataReceiver')\n",
    "modulePath = pyrunner_host.import_value('modulePath')\n",
);

const EXTEND_SYS_PATH_SOURCE: &str = concat!(
    "import sys\n",
    "if modulePath not in sys.path:\n",
    "    sys.path.append(modulePath)\n",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Uninitialized,
    Initialized,
}

/// Raises `pyrunner_host.RunInterrupted` in the thread executing a run
#[derive(Default)]
pub struct PythonInterrupter {
    thread_id: Mutex<Option<c_long>>,
}

impl PythonInterrupter {
    fn enter(&self, py: Python<'_>) -> Result<RunGuard<'_>, BridgeError> {
        let ident: u64 = PyModule::import(py, "threading")?
            .getattr("get_ident")?
            .call0()?
            .extract()?;
        *self.thread_id.lock() = Some(ident as c_long);
        Ok(RunGuard { interrupter: self })
    }
}

impl Interrupter for PythonInterrupter {
    fn interrupt(&self) -> bool {
        // The running thread sets and clears its id while holding the GIL, so
        // under the GIL the id is either current or absent.
        pyo3::Python::attach(|py| {
            let Some(thread_id) = *self.thread_id.lock() else {
                return false;
            };
            let exc = py.get_type::<RunInterrupted>();
            // SAFETY: the GIL is held and `exc` is a live exception type;
            // the call takes its own reference.
            let affected = unsafe { ffi::PyThreadState_SetAsyncExc(thread_id, exc.as_ptr()) };
            affected > 0
        })
    }
}

struct RunGuard<'a> {
    interrupter: &'a PythonInterrupter,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.interrupter.thread_id.lock() = None;
    }
}

pub struct LoaderTask {
    context: Arc<InterpreterContext>,
    module_path: ModulePath,
    resources: Resources,
    cleanup_bindings: bool,
    state: TaskState,
    interrupter: Arc<PythonInterrupter>,
}

impl LoaderTask {
    pub fn new(context: Arc<InterpreterContext>, module_path: ModulePath, resources: Resources) -> Self {
        Self {
            context,
            module_path,
            resources,
            cleanup_bindings: true,
            state: TaskState::Uninitialized,
            interrupter: Arc::new(PythonInterrupter::default()),
        }
    }

    pub fn from_settings(context: Arc<InterpreterContext>, settings: &RunnerSettings) -> Self {
        let resources = Resources::new(settings.resources_dir.as_deref());
        Self::new(context, settings.module_path.clone(), resources)
            .with_cleanup_bindings(settings.cleanup_bindings)
    }

    /// Remove globals introduced by each loader call once it returns
    pub fn with_cleanup_bindings(mut self, enabled: bool) -> Self {
        self.cleanup_bindings = enabled;
        self
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Execute one tick, reporting any failure to the caller
    pub fn run_once(&mut self) -> Result<(), BridgeError> {
        let interrupter = Arc::clone(&self.interrupter);
        pyo3::Python::attach(|py| {
            let _guard = interrupter.enter(py)?;
            if self.state == TaskState::Uninitialized {
                self.bootstrap(py)?;
                self.state = TaskState::Initialized;
                logger::info("Python runner bootstrap completed");
            }
            self.invoke_loader(py)
        })
    }

    fn bootstrap(&self, py: Python<'_>) -> Result<(), BridgeError> {
        let runner_source = self.resources.load(RUNNER_SCRIPT)?;

        let receiver = Py::new(py, DataReceiver::new(py)?)?;
        self.context
            .export_binding(DATA_RECEIVER_KEY, receiver.into_any());
        self.context.export_binding(
            MODULE_PATH_KEY,
            PyString::new(py, self.module_path.as_str()).into_any().unbind(),
        );
        logger::info(&format!("Python module path: {}", self.module_path));

        self.context
            .eval(py, IMPORT_BINDINGS_SOURCE, &format!("<{}-import>", HOST_MODULE))?;
        self.context
            .eval(py, EXTEND_SYS_PATH_SOURCE, "<pyrunner-sys-path>")?;
        self.context.eval(py, &runner_source, RUNNER_SCRIPT)?;
        Ok(())
    }

    fn invoke_loader(&self, py: Python<'_>) -> Result<(), BridgeError> {
        let loader = match self.context.binding(py, LOADER_FUNCTION)? {
            Some(loader) if loader.is_callable() => loader,
            _ => return Err(BridgeError::LoaderMissing(LOADER_FUNCTION.to_string())),
        };

        let before: HashSet<String> = if self.cleanup_bindings {
            self.context.binding_names(py).into_iter().collect()
        } else {
            HashSet::new()
        };

        let start_time = Instant::now();
        let result = loader
            .call1((self.module_path.as_str(),))
            .map(|_| ())
            .map_err(|err| {
                if err.is_instance_of::<RunInterrupted>(py) {
                    return BridgeError::Interrupted;
                }
                let message = format_python_error(py, &err);
                logger::error(&format!("Python execution failed: {}", message));
                BridgeError::LoaderFailed(io::Error::other(message))
            });

        if self.cleanup_bindings {
            for name in self.context.binding_names(py) {
                if before.contains(&name) {
                    continue;
                }
                if let Err(e) = self.context.remove_binding(py, &name) {
                    logger::warn(&format!("Failed to remove global '{}': {}", name, e));
                }
            }
        }

        if result.is_ok() {
            logger::info(&format!(
                "Successfully executed Python file loader with home: {} ({:?})",
                self.module_path,
                start_time.elapsed()
            ));
        }
        result
    }
}

impl ScheduledTask for LoaderTask {
    fn name(&self) -> &str {
        "python-loader"
    }

    fn run(&mut self) {
        match self.run_once() {
            Ok(()) => {}
            Err(BridgeError::Interrupted) => logger::info("Python loader run interrupted"),
            Err(e) => logger::error(&format!("Error executing Python loader task: {}", e)),
        }
    }

    fn interrupter(&self) -> Option<Arc<dyn Interrupter>> {
        Some(Arc::clone(&self.interrupter) as Arc<dyn Interrupter>)
    }
}

/// Call the bridge from interpreter code and return
/// `(process_data, process_other, process_data_func)` results
pub fn probe_bridge(context: &InterpreterContext) -> Result<(String, String, String), BridgeError> {
    pyo3::Python::attach(|py| {
        let receiver = Py::new(py, DataReceiver::new(py)?)?;
        context.export_binding("probeReceiver", receiver.into_any());

        let probe = PyModule::from_code(
            py,
            c"def probe(host):
    receiver = host.import_value('probeReceiver')
    func = receiver.process_data_func()
    return (receiver.process_data('probe'), receiver.process_other(), func.apply('probe'))
",
            c"pyrunner_probe.py",
            c"pyrunner_probe",
        )?;
        let result = probe
            .getattr("probe")?
            .call1((context.host_module(py),))
            .map_err(|err| BridgeError::Python(format_python_error(py, &err)))?;
        Ok(result.extract::<(String, String, String)>()?)
    })
}
