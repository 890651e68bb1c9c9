//! Signature construction by walking a live object graph.

use std::collections::HashSet;

use crate::error::{Result, SignatureError};
use crate::reflect::{ObjectId, ObjectKind, ParameterSpec, Parameters, ReflectError, Reflector};
use crate::types::{
    AttributeSignature, FunctionSignature, GeneratorSignature, NodeSignature, Signature,
};

/// Default prefix marking implementation-private members.
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

/// Options controlling how a signature tree is built.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Members whose names start with this prefix are not part of the API.
    pub private_prefix: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
        }
    }
}

impl BuildOptions {
    pub fn is_public(&self, name: &str) -> bool {
        self.private_prefix.is_empty() || !name.starts_with(&self.private_prefix)
    }
}

/// Dispatches live objects to signature variants and walks composites.
pub struct SignatureFactory<'r, R> {
    reflector: &'r R,
    options: BuildOptions,
}

impl<'r, R: Reflector> SignatureFactory<'r, R> {
    pub fn new(reflector: &'r R) -> Self {
        Self {
            reflector,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the signature tree rooted at `object`.
    pub fn build(&self, object: &R::Object) -> Result<Signature> {
        let name = self.reflector.name(object).unwrap_or_default();
        let mut walk = Walk {
            active: HashSet::new(),
            path: Vec::new(),
        };
        self.build_named(object, name, &mut walk)
    }

    fn build_named(&self, object: &R::Object, name: String, walk: &mut Walk) -> Result<Signature> {
        match self.reflector.kind(object) {
            ObjectKind::Module => self.build_node(object, name, walk).map(Signature::Module),
            ObjectKind::Class => self.build_node(object, name, walk).map(Signature::Class),
            ObjectKind::Function => self
                .build_function(object, name, walk)
                .map(Signature::Function),
            ObjectKind::Generator => Ok(Signature::Generator(GeneratorSignature::new(name))),
            ObjectKind::Other => Ok(Signature::Attribute(self.build_attribute(object, name))),
        }
    }

    fn build_node(
        &self,
        object: &R::Object,
        name: String,
        walk: &mut Walk,
    ) -> Result<NodeSignature> {
        let id = self.reflector.identity(object);
        if walk.active.contains(&id) {
            tracing::warn!(
                "Breaking reference cycle at '{}' (object {} is already on the build path)",
                walk.dotted(&name),
                id
            );
            return Ok(NodeSignature::back_reference(name));
        }

        walk.enter(id, &name);
        let result = self.walk_members(object, &name, walk);
        walk.leave(id);
        result
    }

    fn walk_members(
        &self,
        object: &R::Object,
        name: &str,
        walk: &mut Walk,
    ) -> Result<NodeSignature> {
        let mut node = NodeSignature::new(name);
        let names = self
            .reflector
            .member_names(object)
            .map_err(|e| walk.reflection_error(e))?;

        tracing::debug!("Walking {} ({} members)", walk.current(), names.len());

        for member_name in names {
            if !self.options.is_public(&member_name) || node.children.contains_key(&member_name) {
                continue;
            }

            let Some(member) = self
                .reflector
                .member(object, &member_name)
                .map_err(|e| walk.reflection_error(e))?
            else {
                // Listed but not resolvable (e.g. a descriptor raising); not part of the API.
                tracing::trace!("Skipping unresolvable member {}.{}", walk.current(), member_name);
                continue;
            };

            tracing::trace!("Building {}.{}", walk.current(), member_name);
            let child = self.build_named(&member, member_name.clone(), walk)?;
            node.children.insert(member_name, child);
        }

        Ok(node)
    }

    fn build_function(
        &self,
        object: &R::Object,
        name: String,
        walk: &mut Walk,
    ) -> Result<FunctionSignature> {
        let spec = match self.reflector.parameters(object) {
            Ok(Parameters::Spec(spec)) => spec,
            Ok(Parameters::Opaque) => return Ok(FunctionSignature::opaque(name)),
            Err(e) => {
                walk.path.push(name);
                let err = walk.reflection_error(e);
                walk.path.pop();
                return Err(err);
            }
        };

        let ParameterSpec {
            args,
            varargs,
            varkw,
            kwonlyargs,
            defaults,
            kwonlydefaults,
            annotations,
        } = spec;

        // Defaults line up with the tail of the positional parameters.
        let first_default = args.len().saturating_sub(defaults.len());
        let defaults = defaults
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let param = args.get(first_default + i).cloned().unwrap_or_default();
                Signature::Attribute(self.build_attribute(value, param))
            })
            .collect();

        let keyword_only_defaults = kwonlydefaults
            .iter()
            .map(|(param, value)| {
                (
                    param.clone(),
                    Signature::Attribute(self.build_attribute(value, param.clone())),
                )
            })
            .collect();

        let mut func = FunctionSignature {
            name,
            parameters: args,
            variadic_positional: varargs,
            variadic_keyword: varkw,
            keyword_only: kwonlyargs,
            defaults,
            keyword_only_defaults,
            ..Default::default()
        };

        walk.path.push(func.name.clone());
        for (param, declared) in &annotations {
            let type_name = self
                .reflector
                .name(declared)
                .unwrap_or_else(|| param.clone());
            let ann = self.build_named(declared, type_name, walk);
            match ann {
                Ok(ann) => {
                    func.annotations.insert(param.clone(), ann);
                }
                Err(e) => {
                    walk.path.pop();
                    return Err(e);
                }
            }
        }
        walk.path.pop();

        Ok(func)
    }

    fn build_attribute(&self, object: &R::Object, name: String) -> AttributeSignature {
        AttributeSignature::new(name, self.reflector.type_name(object))
    }
}

/// State of one build: composites on the active path and the dotted path of
/// names leading to the current node.
struct Walk {
    active: HashSet<ObjectId>,
    path: Vec<String>,
}

impl Walk {
    fn enter(&mut self, id: ObjectId, name: &str) {
        self.active.insert(id);
        self.path.push(name.to_string());
    }

    fn leave(&mut self, id: ObjectId) {
        self.active.remove(&id);
        self.path.pop();
    }

    fn current(&self) -> String {
        self.path.join(".")
    }

    fn dotted(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.current(), name)
        }
    }

    fn reflection_error(&self, err: ReflectError) -> SignatureError {
        SignatureError::Reflection {
            path: self.current(),
            message: err.message,
        }
    }
}
