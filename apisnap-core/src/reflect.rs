//! Host reflection interface.
//!
//! The core never inspects live objects directly. A host runtime implements
//! [`Reflector`] to expose member enumeration, classification and parameter
//! introspection for its own object model; [`crate::memory::ObjectGraph`] and
//! (with the `python` feature) `crate::python::PyReflector` are the bundled
//! hosts.

use std::fmt;

/// Identity of a live object, stable for the duration of one build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host classification of a live object. Total: every object is exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Module,
    Class,
    Function,
    Generator,
    /// Fallback bucket for anything without a finer signature variant.
    Other,
}

/// Parameter structure of an introspectable callable.
///
/// Defaults and annotations are still live objects here; the factory wraps
/// them into signatures.
#[derive(Debug)]
pub struct ParameterSpec<O> {
    pub args: Vec<String>,
    pub varargs: Option<String>,
    pub varkw: Option<String>,
    pub kwonlyargs: Vec<String>,
    /// Defaults for the tail of `args`.
    pub defaults: Vec<O>,
    pub kwonlydefaults: Vec<(String, O)>,
    pub annotations: Vec<(String, O)>,
}

impl<O> Default for ParameterSpec<O> {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            varargs: None,
            varkw: None,
            kwonlyargs: Vec::new(),
            defaults: Vec::new(),
            kwonlydefaults: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// Result of asking the host for a callable's parameters.
#[derive(Debug)]
pub enum Parameters<O> {
    Spec(ParameterSpec<O>),
    /// The callable is implemented outside the host's reflective reach.
    Opaque,
}

/// Failure reported by a host while answering a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectError {
    pub message: String,
}

impl ReflectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ReflectError {}

/// Capability supplied by the host runtime to inspect live objects.
///
/// Implementations must present a consistent view of the object graph for the
/// duration of one build.
pub trait Reflector {
    /// Handle to a live object.
    type Object;

    /// Intrinsic name of the object, if it has one.
    fn name(&self, object: &Self::Object) -> Option<String>;

    fn kind(&self, object: &Self::Object) -> ObjectKind;

    /// Identity used to detect cycles along the build path.
    fn identity(&self, object: &Self::Object) -> ObjectId;

    /// Runtime type name of the object (e.g. `int`, `str`).
    fn type_name(&self, object: &Self::Object) -> String;

    /// All member names, private ones included; filtering is the caller's job.
    fn member_names(&self, object: &Self::Object) -> Result<Vec<String>, ReflectError>;

    /// Resolve a member by name. `Ok(None)` when the member does not exist.
    fn member(&self, object: &Self::Object, name: &str)
        -> Result<Option<Self::Object>, ReflectError>;

    fn parameters(&self, object: &Self::Object) -> Result<Parameters<Self::Object>, ReflectError>;
}

/// Capability to load a module by dotted path, used by the path locator.
pub trait ModuleImporter: Reflector {
    /// Import `module_path`. `Ok(None)` when no such module exists.
    fn import_module(&self, module_path: &str) -> Result<Option<Self::Object>, ReflectError>;
}
