//! Embedded CPython host.
//!
//! [`PyReflector`] answers reflection queries against live Python objects
//! through pyo3: modules are loaded with `importlib.import_module`, members
//! listed with `dir()`, objects classified with the `inspect` predicates and
//! callables introspected with `inspect.getfullargspec`.

use std::path::Path;

use pyo3::exceptions::{PyAttributeError, PyModuleNotFoundError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule, PyTuple};

use crate::reflect::{
    ModuleImporter, ObjectId, ObjectKind, ParameterSpec, Parameters, ReflectError, Reflector,
};

fn reflect_err(err: PyErr) -> ReflectError {
    ReflectError::new(err.to_string())
}

/// Reflector over the embedded interpreter.
pub struct PyReflector {
    builtins: Py<PyModule>,
    importlib: Py<PyModule>,
    inspect: Py<PyModule>,
}

impl PyReflector {
    pub fn new() -> Result<Self, ReflectError> {
        Python::with_gil(|py| -> PyResult<Self> {
            Ok(Self {
                builtins: py.import_bound("builtins")?.unbind(),
                importlib: py.import_bound("importlib")?.unbind(),
                inspect: py.import_bound("inspect")?.unbind(),
            })
        })
        .map_err(reflect_err)
    }

    /// Prepend `paths` to `sys.path` so project modules become importable.
    pub fn with_sys_path<P: AsRef<Path>>(self, paths: &[P]) -> Result<Self, ReflectError> {
        Python::with_gil(|py| -> PyResult<()> {
            let sys_path = py.import_bound("sys")?.getattr("path")?;
            for path in paths.iter().rev() {
                let entry = path.as_ref().to_string_lossy().into_owned();
                tracing::debug!("Adding {} to sys.path", entry);
                sys_path.call_method1("insert", (0, entry))?;
            }
            Ok(())
        })
        .map_err(reflect_err)?;
        Ok(self)
    }

    fn predicate(&self, py: Python<'_>, name: &str, object: &Py<PyAny>) -> bool {
        self.inspect
            .bind(py)
            .call_method1(name, (object.bind(py),))
            .and_then(|result| result.is_truthy())
            .unwrap_or(false)
    }
}

impl Reflector for PyReflector {
    type Object = Py<PyAny>;

    fn name(&self, object: &Py<PyAny>) -> Option<String> {
        Python::with_gil(|py| {
            object
                .bind(py)
                .getattr("__name__")
                .and_then(|name| name.extract::<String>())
                .ok()
        })
    }

    fn kind(&self, object: &Py<PyAny>) -> ObjectKind {
        Python::with_gil(|py| {
            if self.predicate(py, "ismodule", object) {
                ObjectKind::Module
            } else if self.predicate(py, "isclass", object) {
                ObjectKind::Class
            } else if self.predicate(py, "isfunction", object) {
                ObjectKind::Function
            } else if self.predicate(py, "isgenerator", object)
                || self.predicate(py, "isgeneratorfunction", object)
            {
                ObjectKind::Generator
            } else {
                ObjectKind::Other
            }
        })
    }

    fn identity(&self, object: &Py<PyAny>) -> ObjectId {
        ObjectId(object.as_ptr() as usize)
    }

    fn type_name(&self, object: &Py<PyAny>) -> String {
        Python::with_gil(|py| {
            object
                .bind(py)
                .getattr("__class__")
                .and_then(|class| class.getattr("__name__"))
                .and_then(|name| name.extract::<String>())
                .unwrap_or_else(|_| "object".to_string())
        })
    }

    fn member_names(&self, object: &Py<PyAny>) -> Result<Vec<String>, ReflectError> {
        Python::with_gil(|py| -> PyResult<Vec<String>> {
            self.builtins
                .bind(py)
                .call_method1("dir", (object.bind(py),))?
                .extract::<Vec<String>>()
        })
        .map_err(reflect_err)
    }

    fn member(&self, object: &Py<PyAny>, name: &str) -> Result<Option<Py<PyAny>>, ReflectError> {
        Python::with_gil(|py| match object.bind(py).getattr(name) {
            Ok(member) => Ok(Some(member.unbind())),
            Err(e) if e.is_instance_of::<PyAttributeError>(py) => Ok(None),
            Err(e) => Err(reflect_err(e)),
        })
    }

    fn parameters(&self, object: &Py<PyAny>) -> Result<Parameters<Py<PyAny>>, ReflectError> {
        Python::with_gil(|py| -> PyResult<Parameters<Py<PyAny>>> {
            let argspec = match self
                .inspect
                .bind(py)
                .call_method1("getfullargspec", (object.bind(py),))
            {
                Ok(argspec) => argspec,
                // Unsupported callables (C extensions without a text signature).
                Err(e) if e.is_instance_of::<PyTypeError>(py) => return Ok(Parameters::Opaque),
                Err(e) => return Err(e),
            };

            let mut spec = ParameterSpec {
                args: argspec.getattr("args")?.extract()?,
                varargs: argspec.getattr("varargs")?.extract()?,
                varkw: argspec.getattr("varkw")?.extract()?,
                kwonlyargs: argspec.getattr("kwonlyargs")?.extract()?,
                ..Default::default()
            };

            let defaults = argspec.getattr("defaults")?;
            if let Ok(defaults) = defaults.downcast::<PyTuple>() {
                spec.defaults = defaults.iter().map(Bound::unbind).collect();
            }

            let kwonlydefaults = argspec.getattr("kwonlydefaults")?;
            if let Ok(kwonlydefaults) = kwonlydefaults.downcast::<PyDict>() {
                for (key, value) in kwonlydefaults.iter() {
                    spec.kwonlydefaults.push((key.extract()?, value.unbind()));
                }
            }

            let annotations = argspec.getattr("annotations")?;
            if let Ok(annotations) = annotations.downcast::<PyDict>() {
                for (key, value) in annotations.iter() {
                    spec.annotations.push((key.extract()?, value.unbind()));
                }
            }

            Ok(Parameters::Spec(spec))
        })
        .map_err(reflect_err)
    }
}

impl ModuleImporter for PyReflector {
    fn import_module(&self, module_path: &str) -> Result<Option<Py<PyAny>>, ReflectError> {
        Python::with_gil(|py| {
            match self
                .importlib
                .bind(py)
                .call_method1("import_module", (module_path,))
            {
                Ok(module) => Ok(Some(module.unbind())),
                Err(e) if e.is_instance_of::<PyModuleNotFoundError>(py) => Ok(None),
                Err(e) => Err(reflect_err(e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::validate;
    use crate::error::SignatureError;
    use crate::types::Signature;
    use crate::{build_signature, check_signature};

    const FIXTURE: &str = r#"
def connect(host, port=8080, *args, timeout=1.0, **options):
    pass

def produce():
    yield 1

class Client:
    retries = 3

    def send(self, payload: bytes) -> int:
        return 0

VERSION = "1.0"
"#;

    fn load_fixture(py: Python<'_>, module_name: &str) -> Bound<'_, PyModule> {
        PyModule::from_code_bound(py, FIXTURE, &format!("{}.py", module_name), module_name)
            .unwrap()
    }

    #[test]
    fn test_builds_module_tree() {
        Python::with_gil(|py| {
            load_fixture(py, "apisnap_fixture_tree");
        });
        let reflector = PyReflector::new().unwrap();
        let sig = build_signature(&reflector, "apisnap_fixture_tree").unwrap();

        let node = sig.node().unwrap();
        assert!(node.children.contains_key("Client"));
        assert!(node.children.contains_key("VERSION"));
        assert!(!node.children.keys().any(|k| k.starts_with('_')));

        match sig.get("connect") {
            Some(Signature::Function(func)) => {
                assert_eq!(func.parameters, vec!["host", "port"]);
                assert_eq!(func.variadic_positional.as_deref(), Some("args"));
                assert_eq!(func.keyword_only, vec!["timeout"]);
                assert_eq!(func.defaults[0].label(), "int");
                assert_eq!(func.keyword_only_defaults["timeout"].label(), "float");
            }
            other => panic!("expected function, got {:?}", other),
        }
        assert!(matches!(sig.get("Client.retries"), Some(Signature::Attribute(_))));
    }

    #[test]
    fn test_member_target_and_missing_member() {
        Python::with_gil(|py| {
            load_fixture(py, "apisnap_fixture_member");
        });
        let reflector = PyReflector::new().unwrap();

        let sig = build_signature(&reflector, "apisnap_fixture_member:Client").unwrap();
        assert!(matches!(sig, Signature::Class(_)));

        let err = build_signature(&reflector, "apisnap_fixture_member:Nope").unwrap_err();
        assert!(matches!(err, SignatureError::Resolution { .. }));

        let err = build_signature(&reflector, "apisnap_no_such_module").unwrap_err();
        assert!(matches!(err, SignatureError::Resolution { .. }));
    }

    #[test]
    fn test_check_detects_added_member() {
        let module = Python::with_gil(|py| load_fixture(py, "apisnap_fixture_check").unbind());
        let reflector = PyReflector::new().unwrap();
        let baseline = build_signature(&reflector, "apisnap_fixture_check").unwrap();

        check_signature(&reflector, "apisnap_fixture_check", &baseline).unwrap();

        Python::with_gil(|py| module.bind(py).setattr("added", 1).unwrap());
        let err = check_signature(&reflector, "apisnap_fixture_check", &baseline).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(
            report.member("added"),
            Some(&crate::differ::ErrorReport::UnknownElement)
        );
    }

    #[test]
    fn test_self_reference_is_cycle_safe() {
        Python::with_gil(|py| {
            let module = load_fixture(py, "apisnap_fixture_cycle");
            module.setattr("itself", &module).unwrap();
        });
        let reflector = PyReflector::new().unwrap();
        let sig = build_signature(&reflector, "apisnap_fixture_cycle").unwrap();

        match sig.get("itself") {
            Some(Signature::Module(node)) => assert!(node.recursive),
            other => panic!("expected recursive module, got {:?}", other),
        }
        assert!(validate(&sig, &sig.clone()).is_none());
    }
}
