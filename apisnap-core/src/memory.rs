//! In-memory object graph host.
//!
//! [`ObjectGraph`] is an arena of live objects (modules, classes, functions,
//! generators and plain values) that implements [`Reflector`] and
//! [`ModuleImporter`]. Hosts without a reflective runtime can describe their
//! API surface with it, and it is mutable so callers can model API changes
//! between builds.
//!
//! ```rust,ignore
//! let mut graph = ObjectGraph::new();
//! let pkg = graph.add_module("pkg");
//! let zero = graph.new_value("int");
//! graph.add_function(pkg, "run", FunctionDecl::new(["x"]).with_defaults([zero]));
//! let sig = apisnap_core::build_signature(&graph, "pkg")?;
//! ```

use std::collections::BTreeMap;

use crate::reflect::{
    ModuleImporter, ObjectId, ObjectKind, ParameterSpec, Parameters, ReflectError, Reflector,
};

/// Parameter declaration of an in-memory function.
#[derive(Clone, Debug, Default)]
pub struct FunctionDecl {
    pub args: Vec<String>,
    pub varargs: Option<String>,
    pub varkw: Option<String>,
    pub kwonlyargs: Vec<String>,
    pub defaults: Vec<ObjectId>,
    pub kwonlydefaults: Vec<(String, ObjectId)>,
    pub annotations: Vec<(String, ObjectId)>,
}

impl FunctionDecl {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self
    }

    pub fn with_varkw(mut self, name: impl Into<String>) -> Self {
        self.varkw = Some(name.into());
        self
    }

    pub fn with_kwonly(mut self, name: impl Into<String>, default: Option<ObjectId>) -> Self {
        let name = name.into();
        if let Some(default) = default {
            self.kwonlydefaults.push((name.clone(), default));
        }
        self.kwonlyargs.push(name);
        self
    }

    /// Defaults for the tail of the positional parameters.
    pub fn with_defaults(mut self, defaults: impl IntoIterator<Item = ObjectId>) -> Self {
        self.defaults = defaults.into_iter().collect();
        self
    }

    pub fn with_annotation(mut self, param: impl Into<String>, declared: ObjectId) -> Self {
        self.annotations.push((param.into(), declared));
        self
    }
}

#[derive(Clone, Debug)]
enum Body {
    Module,
    Class,
    /// `None` for callables whose parameters cannot be introspected.
    Function(Option<FunctionDecl>),
    Generator,
    Value { type_name: String },
}

#[derive(Clone, Debug)]
struct ObjectData {
    name: String,
    body: Body,
    members: BTreeMap<String, ObjectId>,
}

/// Arena-backed live object graph.
#[derive(Clone, Debug, Default)]
pub struct ObjectGraph {
    objects: Vec<ObjectData>,
    modules: BTreeMap<String, ObjectId>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, name: &str, body: Body) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(ObjectData {
            name: name.to_string(),
            body,
            members: BTreeMap::new(),
        });
        id
    }

    fn data(&self, id: ObjectId) -> Option<&ObjectData> {
        self.objects.get(id.0)
    }

    fn resolve(&self, id: ObjectId) -> Result<&ObjectData, ReflectError> {
        self.data(id)
            .ok_or_else(|| ReflectError::new(format!("unknown object {}", id)))
    }

    /// Register an importable module.
    ///
    /// When the parent package (`a` for `a.b`) is already registered, the new
    /// module is also attached to it as a member, as an import would do.
    pub fn add_module(&mut self, dotted_path: &str) -> ObjectId {
        let (parent, name) = match dotted_path.rsplit_once('.') {
            Some((parent, name)) => (Some(parent), name),
            None => (None, dotted_path),
        };
        let id = self.alloc(name, Body::Module);
        self.modules.insert(dotted_path.to_string(), id);

        if let Some(parent_id) = parent.and_then(|p| self.modules.get(p).copied()) {
            self.set_member(parent_id, name, id);
        }
        id
    }

    pub fn add_class(&mut self, parent: ObjectId, name: &str) -> ObjectId {
        let id = self.alloc(name, Body::Class);
        self.set_member(parent, name, id);
        id
    }

    pub fn add_function(&mut self, parent: ObjectId, name: &str, decl: FunctionDecl) -> ObjectId {
        let id = self.new_function(name, decl);
        self.set_member(parent, name, id);
        id
    }

    /// Function whose parameter structure the host cannot expose.
    pub fn add_opaque_function(&mut self, parent: ObjectId, name: &str) -> ObjectId {
        let id = self.alloc(name, Body::Function(None));
        self.set_member(parent, name, id);
        id
    }

    pub fn add_generator(&mut self, parent: ObjectId, name: &str) -> ObjectId {
        let id = self.alloc(name, Body::Generator);
        self.set_member(parent, name, id);
        id
    }

    /// Attach a plain value of the given runtime type.
    pub fn add_value(&mut self, parent: ObjectId, name: &str, type_name: &str) -> ObjectId {
        let id = self.new_value(type_name);
        self.set_member(parent, name, id);
        id
    }

    /// Detached function, e.g. to be aliased later.
    pub fn new_function(&mut self, name: &str, decl: FunctionDecl) -> ObjectId {
        self.alloc(name, Body::Function(Some(decl)))
    }

    /// Detached value, typically a default or annotation.
    pub fn new_value(&mut self, type_name: &str) -> ObjectId {
        self.alloc(
            "",
            Body::Value {
                type_name: type_name.to_string(),
            },
        )
    }

    /// Bind `name` on `parent` to an existing object (plain attribute assignment).
    ///
    /// Binding on an id this graph never allocated is a no-op.
    pub fn set_member(&mut self, parent: ObjectId, name: &str, member: ObjectId) {
        match self.objects.get_mut(parent.0) {
            Some(data) => {
                data.members.insert(name.to_string(), member);
            }
            None => tracing::warn!("Cannot bind '{}' on unknown object {}", name, parent),
        }
    }

    pub fn remove_member(&mut self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        self.objects.get_mut(parent.0)?.members.remove(name)
    }

    /// Look up a registered module by dotted path.
    pub fn module(&self, dotted_path: &str) -> Option<ObjectId> {
        self.modules.get(dotted_path).copied()
    }

    pub fn get_member(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        self.data(parent)?.members.get(name).copied()
    }
}

impl Reflector for ObjectGraph {
    type Object = ObjectId;

    fn name(&self, object: &ObjectId) -> Option<String> {
        let data = self.data(*object)?;
        match data.body {
            Body::Value { .. } => None,
            _ => Some(data.name.clone()),
        }
    }

    /// Ids this graph never allocated report as [`ObjectKind::Module`] so
    /// that the factory asks for their members and surfaces the error.
    fn kind(&self, object: &ObjectId) -> ObjectKind {
        match self.data(*object).map(|data| &data.body) {
            None | Some(Body::Module) => ObjectKind::Module,
            Some(Body::Class) => ObjectKind::Class,
            Some(Body::Function(_)) => ObjectKind::Function,
            Some(Body::Generator) => ObjectKind::Generator,
            Some(Body::Value { .. }) => ObjectKind::Other,
        }
    }

    fn identity(&self, object: &ObjectId) -> ObjectId {
        *object
    }

    fn type_name(&self, object: &ObjectId) -> String {
        match self.data(*object).map(|data| &data.body) {
            None | Some(Body::Module) => "module".to_string(),
            Some(Body::Class) => "type".to_string(),
            Some(Body::Function(_)) => "function".to_string(),
            Some(Body::Generator) => "generator".to_string(),
            Some(Body::Value { type_name }) => type_name.clone(),
        }
    }

    fn member_names(&self, object: &ObjectId) -> Result<Vec<String>, ReflectError> {
        Ok(self.resolve(*object)?.members.keys().cloned().collect())
    }

    fn member(&self, object: &ObjectId, name: &str) -> Result<Option<ObjectId>, ReflectError> {
        Ok(self.resolve(*object)?.members.get(name).copied())
    }

    fn parameters(&self, object: &ObjectId) -> Result<Parameters<ObjectId>, ReflectError> {
        let data = self.resolve(*object)?;
        match &data.body {
            Body::Function(Some(decl)) => Ok(Parameters::Spec(ParameterSpec {
                args: decl.args.clone(),
                varargs: decl.varargs.clone(),
                varkw: decl.varkw.clone(),
                kwonlyargs: decl.kwonlyargs.clone(),
                defaults: decl.defaults.clone(),
                kwonlydefaults: decl.kwonlydefaults.clone(),
                annotations: decl.annotations.clone(),
            })),
            Body::Function(None) => Ok(Parameters::Opaque),
            _ => Err(ReflectError::new(format!("'{}' is not callable", data.name))),
        }
    }
}

impl ModuleImporter for ObjectGraph {
    fn import_module(&self, module_path: &str) -> Result<Option<ObjectId>, ReflectError> {
        Ok(self.module(module_path))
    }
}
