//! Route Python `logging` into the host logger
//!
//! Python records always land in the host log file tagged `[PYTHON]`;
//! `--log-python` controls whether they are also echoed to the console.

use crate::context::InterpreterContext;
use crate::errors::BridgeError;
use crate::utils::HOST_MODULE;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyrunner_logger as logger;

const HANDLER_SOURCE: &str = r#"
import logging

class HostLogHandler(logging.Handler):
    def emit(self, record):
        try:
            pyrunner_host.log(record.levelno, self.format(record))
        except Exception:
            self.handleError(record)

def install(level):
    root = logging.getLogger()
    for handler in list(root.handlers):
        root.removeHandler(handler)
    handler = HostLogHandler()
    handler.setFormatter(logging.Formatter("%(name)s: %(message)s"))
    root.addHandler(handler)
    root.setLevel(level)
"#;

/// Replace the root Python logging handlers with one that writes through the
/// host logger, at the level matching the host verbosity
pub fn configure_python_logging(context: &InterpreterContext) -> Result<(), BridgeError> {
    let level = logger::verbosity_to_python_level();
    logger::debug(&format!(
        "Configuring Python logging with level={}, enable_console={}",
        logger::python_level_name(level),
        logger::get_log_python()
    ));

    pyo3::Python::attach(|py| {
        let namespace = PyDict::new(py);
        namespace.set_item(HOST_MODULE, context.host_module(py))?;
        let code = std::ffi::CString::new(HANDLER_SOURCE)
            .map_err(|e| BridgeError::Python(format!("Invalid logging handler source: {}", e)))?;
        py.run(code.as_c_str(), Some(&namespace), None)?;

        let install = namespace.get_item("install")?.ok_or_else(|| {
            BridgeError::Python("Logging handler installer missing".to_string())
        })?;
        install.call1((level,))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrunner_config::ContextConfig;

    #[test]
    fn test_python_records_reach_host_handler() {
        let context = InterpreterContext::new(ContextConfig::default()).unwrap();
        configure_python_logging(&context).unwrap();
        Python::attach(|py| {
            context
                .eval(
                    py,
                    "import logging\nhandlers = [type(h).__name__ for h in logging.getLogger().handlers]\nlogging.getLogger('runner').warning('hello from python')",
                    "<logging>",
                )
                .unwrap();
            let handlers: Vec<String> = context
                .binding(py, "handlers")
                .unwrap()
                .unwrap()
                .extract()
                .unwrap();
            assert_eq!(handlers, vec!["HostLogHandler".to_string()]);
        });
    }
}
