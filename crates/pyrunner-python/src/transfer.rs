//! Transfer namespace for handing host values to interpreter code
//!
//! The host publishes values under stable keys; interpreter code pulls them
//! into its own scope with `pyrunner_host.import_value(name)`. Nothing is
//! visible to interpreter code until it asks for it.

use parking_lot::Mutex;
use pyo3::prelude::*;
use std::collections::HashMap;

#[pyclass(module = "pyrunner_host", frozen)]
#[derive(Default)]
pub struct TransferNamespace {
    values: Mutex<HashMap<String, Py<PyAny>>>,
}

impl TransferNamespace {
    /// Publish a value under `name`, replacing any previous value
    pub fn put(&self, name: &str, value: Py<PyAny>) {
        let previous = self.values.lock().insert(name.to_string(), value);
        // Released outside the lock: a finalizer may call back into us.
        drop(previous);
    }

    pub fn fetch(&self, py: Python<'_>, name: &str) -> Option<Py<PyAny>> {
        self.values
            .lock()
            .get(name)
            .map(|value| value.clone_ref(py))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[pymethods]
impl TransferNamespace {
    /// Return the value published under `name`, or None
    fn import_value(&self, py: Python<'_>, name: &str) -> Option<Py<PyAny>> {
        self.fetch(py, name)
    }

    /// Publish a value from interpreter code
    fn export_value(&self, name: &str, value: Py<PyAny>) {
        self.put(name, value);
    }

    fn keys(&self) -> Vec<String> {
        self.names()
    }

    fn __contains__(&self, name: &str) -> bool {
        self.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::types::{PyDict, PyString};

    #[test]
    fn test_put_and_import() {
        Python::attach(|py| {
            let ns = Py::new(py, TransferNamespace::default()).unwrap();
            ns.get()
                .put("modulePath", PyString::new(py, "/srv/modules").into_any().unbind());

            let locals = PyDict::new(py);
            locals.set_item("ns", &ns).unwrap();
            py.run(
                c"path = ns.import_value('modulePath')
missing = ns.import_value('nothing')
ns.export_value('fromPython', 42)
",
                None,
                Some(&locals),
            )
            .unwrap();

            let path: String = locals.get_item("path").unwrap().unwrap().extract().unwrap();
            assert_eq!(path, "/srv/modules");
            assert!(locals.get_item("missing").unwrap().unwrap().is_none());
            assert_eq!(ns.get().names(), vec!["fromPython", "modulePath"]);
        });
    }

    #[test]
    fn test_unimported_value_stays_on_host() {
        Python::attach(|py| {
            let ns = TransferNamespace::default();
            ns.put("inert", py.None());
            assert!(ns.contains("inert"));
            assert!(ns.fetch(py, "inert").is_some());
        });
    }
}
