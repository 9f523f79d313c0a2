//! Interpreter context setup and the process-wide singleton
//!
//! A context owns the globals dict every evaluation runs in, the transfer
//! namespace, and the `pyrunner_host` module that joins the two. Capability
//! grants are applied once, when the context is built, and cannot change
//! afterwards.

use crate::errors::{BridgeError, RunInterrupted};
use crate::receiver::{DataReceiver, ProcessDataFunction};
use crate::transfer::TransferNamespace;
use crate::utils::{format_python_error, ENGINE_OPTIONS_KEY, HOST_MODULE};
use once_cell::sync::OnceCell;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use pyrunner_config::ContextConfig;
use pyrunner_logger as logger;
use std::sync::Arc;
use std::time::Instant;

/// Audit events refused when process creation is not granted
const PROCESS_AUDIT_EVENTS: &[&str] = &[
    "subprocess.Popen",
    "os.system",
    "os.exec",
    "os.spawn",
    "os.posix_spawn",
    "os.fork",
    "os.forkpty",
];

/// Audit events refused when native access is not granted
const NATIVE_AUDIT_EVENTS: &[&str] = &["ctypes.dlopen", "ctypes.dlsym"];

const AUDIT_HOOK_SOURCE: &str = r#"
import sys

def install(blocked):
    blocked = frozenset(blocked)

    def _pyrunner_audit(event, args):
        if event in blocked:
            raise PermissionError(event + " is not permitted in this interpreter context")

    sys.addaudithook(_pyrunner_audit)
"#;

pub struct InterpreterContext {
    globals: Py<PyDict>,
    transfer: Py<TransferNamespace>,
    host: Py<PyModule>,
}

static CONTEXT_INSTANCE: OnceCell<Result<Arc<InterpreterContext>, BridgeError>> = OnceCell::new();

impl InterpreterContext {
    /// Get or initialize the process-wide context.
    ///
    /// Only the first caller's options are used. The global context is also
    /// importable as `pyrunner_host` and forwards Python `logging` records to
    /// the host logger.
    pub fn global(options: ContextConfig) -> Result<Arc<InterpreterContext>, BridgeError> {
        match CONTEXT_INSTANCE.get_or_init(|| Self::initialize_global(options)) {
            Ok(context) => Ok(Arc::clone(context)),
            Err(e) => Err(BridgeError::Initialization(format!("{}", e))),
        }
    }

    fn initialize_global(options: ContextConfig) -> Result<Arc<InterpreterContext>, BridgeError> {
        let context = Self::new(options)?;
        context.install_host_module()?;

        if let Err(e) = crate::logging::configure_python_logging(&context) {
            logger::warn(&format!("Python logging configuration failed: {}", e));
        }
        Ok(Arc::new(context))
    }

    /// Build a context with its own globals and transfer namespace
    pub fn new(options: ContextConfig) -> Result<Self, BridgeError> {
        let start_time = Instant::now();

        pyo3::Python::initialize();

        let context = pyo3::Python::attach(|py| {
            let globals = PyDict::new(py);
            globals.set_item("__builtins__", PyModule::import(py, "builtins")?)?;
            globals.set_item("__name__", "__pyrunner__")?;

            let transfer = Py::new(py, TransferNamespace::default())?;
            let host = build_host_module(py, &transfer).map_err(|e| {
                BridgeError::Initialization(format!("Failed to build {} module: {}", HOST_MODULE, e))
            })?;
            globals.set_item(HOST_MODULE, &host)?;

            let engine_options = PyDict::new(py);
            for (key, value) in options.published_options() {
                engine_options.set_item(key, value)?;
            }
            transfer
                .get()
                .put(ENGINE_OPTIONS_KEY, engine_options.into_any().unbind());

            apply_capabilities(py, &options)?;

            Ok::<InterpreterContext, BridgeError>(InterpreterContext {
                globals: globals.unbind(),
                transfer,
                host: host.unbind(),
            })
        })?;

        logger::debug(&format!(
            "Interpreter context initialization took: {:?}",
            start_time.elapsed()
        ));
        Ok(context)
    }

    pub fn transfer(&self) -> &TransferNamespace {
        self.transfer.get()
    }

    pub fn host_module<'py>(&self, py: Python<'py>) -> Bound<'py, PyModule> {
        self.host.bind(py).clone()
    }

    /// Stage a host value for interpreter code to pull with `import_value`
    pub fn export_binding(&self, name: &str, value: Py<PyAny>) {
        logger::debug(&format!("Exporting '{}' to the transfer namespace", name));
        self.transfer.get().put(name, value);
    }

    /// Compile `source` under `filename` and execute it in the context globals
    pub fn eval(&self, py: Python<'_>, source: &str, filename: &str) -> Result<(), BridgeError> {
        let builtins = PyModule::import(py, "builtins")?;
        let globals = self.globals.bind(py);

        let run = || -> PyResult<()> {
            let code = builtins.call_method1("compile", (source, filename, "exec"))?;
            builtins.call_method1("exec", (code, globals))?;
            Ok(())
        };

        run().map_err(|err| BridgeError::Evaluation {
            filename: filename.to_string(),
            message: format_python_error(py, &err),
        })
    }

    pub fn binding<'py>(
        &self,
        py: Python<'py>,
        name: &str,
    ) -> Result<Option<Bound<'py, PyAny>>, BridgeError> {
        Ok(self.globals.bind(py).get_item(name)?)
    }

    pub fn binding_names(&self, py: Python<'_>) -> Vec<String> {
        self.globals
            .bind(py)
            .keys()
            .iter()
            .filter_map(|key| key.extract::<String>().ok())
            .collect()
    }

    pub fn remove_binding(&self, py: Python<'_>, name: &str) -> Result<(), BridgeError> {
        let globals = self.globals.bind(py);
        if globals.contains(name)? {
            globals.del_item(name)?;
        }
        Ok(())
    }

    /// Make `import pyrunner_host` resolve to this context's host module
    fn install_host_module(&self) -> Result<(), BridgeError> {
        pyo3::Python::attach(|py| {
            let sys = PyModule::import(py, "sys")
                .map_err(|e| BridgeError::Python(format!("Failed to import sys module: {}", e)))?;
            sys.getattr("modules")?
                .set_item(HOST_MODULE, self.host.bind(py))
                .map_err(|e| {
                    BridgeError::Python(format!("Failed to register {}: {}", HOST_MODULE, e))
                })?;
            Ok(())
        })
    }
}

/// Forward a Python `logging` record to the host logger
#[pyfunction]
#[pyo3(name = "log")]
fn host_log(level: i32, message: &str) {
    logger::python(level, message);
}

fn build_host_module<'py>(
    py: Python<'py>,
    transfer: &Py<TransferNamespace>,
) -> PyResult<Bound<'py, PyModule>> {
    let module = PyModule::new(py, HOST_MODULE)?;
    let transfer = transfer.bind(py);
    module.add("transfer", transfer)?;
    module.add("import_value", transfer.getattr("import_value")?)?;
    module.add("export_value", transfer.getattr("export_value")?)?;
    module.add_class::<DataReceiver>()?;
    module.add_class::<ProcessDataFunction>()?;
    module.add_class::<TransferNamespace>()?;
    module.add("RunInterrupted", py.get_type::<RunInterrupted>())?;
    module.add_function(wrap_pyfunction!(host_log, &module)?)?;
    Ok(module)
}

/// Refuse the audit events of every capability that is not granted.
///
/// Audit hooks cannot be removed, so a denial lasts for the rest of the
/// process.
fn apply_capabilities(py: Python<'_>, options: &ContextConfig) -> Result<(), BridgeError> {
    let mut blocked: Vec<&str> = Vec::new();
    if !options.allow_create_process {
        blocked.extend_from_slice(PROCESS_AUDIT_EVENTS);
    }
    if !options.allow_native_access {
        blocked.extend_from_slice(NATIVE_AUDIT_EVENTS);
    }
    if blocked.is_empty() {
        return Ok(());
    }

    logger::debug(&format!("Denying audit events: {}", blocked.join(", ")));
    let namespace = PyDict::new(py);
    let code = std::ffi::CString::new(AUDIT_HOOK_SOURCE)
        .map_err(|e| BridgeError::Initialization(format!("Invalid audit hook source: {}", e)))?;
    py.run(code.as_c_str(), Some(&namespace), None)?;
    let install = namespace
        .get_item("install")?
        .ok_or_else(|| BridgeError::Initialization("Audit hook installer missing".to_string()))?;
    install.call1((blocked,)).map_err(|e| {
        BridgeError::Initialization(format!(
            "Failed to install audit hook: {}",
            format_python_error(py, &e)
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MODULE_PATH_KEY;
    use pyo3::types::PyString;

    #[test]
    fn test_eval_runs_in_context_globals() {
        let context = InterpreterContext::new(ContextConfig::default()).unwrap();
        Python::attach(|py| {
            context.eval(py, "answer = 6 * 7", "<test>").unwrap();
            let answer: i64 = context.binding(py, "answer").unwrap().unwrap().extract().unwrap();
            assert_eq!(answer, 42);
            assert!(context.binding_names(py).contains(&"answer".to_string()));

            context.remove_binding(py, "answer").unwrap();
            assert!(context.binding(py, "answer").unwrap().is_none());
        });
    }

    #[test]
    fn test_contexts_do_not_share_globals() {
        let first = InterpreterContext::new(ContextConfig::default()).unwrap();
        let second = InterpreterContext::new(ContextConfig::default()).unwrap();
        Python::attach(|py| {
            first.eval(py, "only_here = True", "<first>").unwrap();
            assert!(second.binding(py, "only_here").unwrap().is_none());
        });
    }

    #[test]
    fn test_exported_value_requires_explicit_import() {
        let context = InterpreterContext::new(ContextConfig::default()).unwrap();
        Python::attach(|py| {
            context.export_binding(MODULE_PATH_KEY, PyString::new(py, "/srv/modules").into_any().unbind());
            assert!(context.binding(py, MODULE_PATH_KEY).unwrap().is_none());

            context
                .eval(
                    py,
                    "modulePath = pyrunner_host.import_value('modulePath')",
                    "<import>",
                )
                .unwrap();
            let path: String = context
                .binding(py, MODULE_PATH_KEY)
                .unwrap()
                .unwrap()
                .extract()
                .unwrap();
            assert_eq!(path, "/srv/modules");
        });
    }

    #[test]
    fn test_engine_options_published() {
        let context = InterpreterContext::new(ContextConfig::default()).unwrap();
        assert!(context.transfer().contains(ENGINE_OPTIONS_KEY));
        Python::attach(|py| {
            context
                .eval(
                    py,
                    "interval = pyrunner_host.import_value('engineOptions')['gc.background_interval_ms']",
                    "<options>",
                )
                .unwrap();
            let interval: String = context.binding(py, "interval").unwrap().unwrap().extract().unwrap();
            assert_eq!(interval, "1000");
        });
    }

    #[test]
    fn test_eval_error_carries_filename_and_traceback() {
        let context = InterpreterContext::new(ContextConfig::default()).unwrap();
        Python::attach(|py| {
            let err = context
                .eval(py, "def f():\n    return 1 / 0\nf()", "bootstrap.py")
                .unwrap_err();
            match err {
                BridgeError::Evaluation { filename, message } => {
                    assert_eq!(filename, "bootstrap.py");
                    assert!(message.contains("ZeroDivisionError"));
                    assert!(message.contains("bootstrap.py"));
                }
                other => panic!("unexpected error: {}", other),
            }
        });
    }
}
