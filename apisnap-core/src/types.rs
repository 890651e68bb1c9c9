//! Signature tree model.
//!
//! A [`Signature`] is an immutable structural snapshot of one public API
//! element. Composite variants (modules and classes) own their public members
//! as child signatures; leaf variants capture just enough to detect drift.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind tag shared by every signature variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureKind {
    Module,
    Class,
    Function,
    Attribute,
    Generator,
}

impl SignatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureKind::Module => "module",
            SignatureKind::Class => "class",
            SignatureKind::Function => "function",
            SignatureKind::Attribute => "attribute",
            SignatureKind::Generator => "generator",
        }
    }
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a public API element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signature {
    Module(NodeSignature),
    Class(NodeSignature),
    Function(FunctionSignature),
    Attribute(AttributeSignature),
    Generator(GeneratorSignature),
}

impl Signature {
    pub fn kind(&self) -> SignatureKind {
        match self {
            Signature::Module(_) => SignatureKind::Module,
            Signature::Class(_) => SignatureKind::Class,
            Signature::Function(_) => SignatureKind::Function,
            Signature::Attribute(_) => SignatureKind::Attribute,
            Signature::Generator(_) => SignatureKind::Generator,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Signature::Module(node) | Signature::Class(node) => &node.name,
            Signature::Function(func) => &func.name,
            Signature::Attribute(attr) => &attr.name,
            Signature::Generator(gen) => &gen.name,
        }
    }

    /// Child members, for composite signatures.
    pub fn node(&self) -> Option<&NodeSignature> {
        match self {
            Signature::Module(node) | Signature::Class(node) => Some(node),
            _ => None,
        }
    }

    /// Look up a descendant by dotted member path (`"pkg.Class.method"`).
    pub fn get(&self, path: &str) -> Option<&Signature> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |sig, segment| sig.node()?.children.get(segment))
    }

    /// Short type-like label used when rendering function parameters.
    pub fn label(&self) -> &str {
        match self {
            Signature::Attribute(attr) => &attr.type_name,
            other => other.name(),
        }
    }

    /// Number of signatures in this tree, the root included.
    pub fn count(&self) -> usize {
        match self {
            Signature::Module(node) | Signature::Class(node) => {
                1 + node.children.values().map(Signature::count).sum::<usize>()
            }
            _ => 1,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Module(node) => write!(f, "Module {}", node.name),
            Signature::Class(node) => write!(f, "Class {}", node.name),
            Signature::Function(func) => write!(f, "Function {}", func.render()),
            Signature::Attribute(attr) => write!(f, "Attribute {} ({})", attr.name, attr.type_name),
            Signature::Generator(gen) => write!(f, "Generator {}", gen.name),
        }
    }
}

/// Composite signature shared by modules and classes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSignature {
    pub name: String,
    /// Public members keyed by the name they are visible under.
    pub children: BTreeMap<String, Signature>,
    /// Back-reference to an object already on the build path; never walked.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
}

impl NodeSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
            recursive: false,
        }
    }

    /// Placeholder for a member that points back up the build path.
    pub fn back_reference(name: impl Into<String>) -> Self {
        Self {
            recursive: true,
            ..Self::new(name)
        }
    }

    /// Builder: add a child under `key`.
    pub fn with_child(mut self, key: impl Into<String>, child: Signature) -> Self {
        self.children.insert(key.into(), child);
        self
    }
}

/// Parameter structure of a callable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    /// Positional parameter names, in declaration order.
    pub parameters: Vec<String>,
    pub variadic_positional: Option<String>,
    pub variadic_keyword: Option<String>,
    pub keyword_only: Vec<String>,
    /// Defaults for the tail of `parameters`, wrapped as attribute leaves.
    pub defaults: Vec<Signature>,
    pub keyword_only_defaults: BTreeMap<String, Signature>,
    /// Declared types keyed by parameter name (or `"return"`).
    pub annotations: BTreeMap<String, Signature>,
    /// The host could not introspect this callable; other fields stay empty.
    #[serde(default)]
    pub is_opaque: bool,
}

/// Annotation key used for the declared return type.
pub const RETURN_ANNOTATION: &str = "return";

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            is_opaque: true,
            ..Self::new(name)
        }
    }

    /// Render as `name(a, b=int, *args, c, **kw) -> str`.
    pub fn render(&self) -> String {
        if self.is_opaque {
            return format!("{} <opaque>", self.name);
        }

        let annotated = |param: &str| -> String {
            match self.annotations.get(param) {
                Some(ann) => format!("{}: {}", param, ann.label()),
                None => param.to_string(),
            }
        };

        let mut parts = Vec::new();
        let first_default = self.parameters.len().saturating_sub(self.defaults.len());
        for (i, param) in self.parameters.iter().enumerate() {
            let mut s = annotated(param);
            if i >= first_default {
                if let Some(default) = self.defaults.get(i - first_default) {
                    s.push_str(&format!("={}", default.label()));
                }
            }
            parts.push(s);
        }

        match &self.variadic_positional {
            Some(name) => parts.push(format!("*{}", annotated(name))),
            None if !self.keyword_only.is_empty() => parts.push("*".to_string()),
            None => {}
        }

        for param in &self.keyword_only {
            let mut s = annotated(param);
            if let Some(default) = self.keyword_only_defaults.get(param) {
                s.push_str(&format!("={}", default.label()));
            }
            parts.push(s);
        }

        if let Some(name) = &self.variadic_keyword {
            parts.push(format!("**{}", annotated(name)));
        }

        let ret = self
            .annotations
            .get(RETURN_ANNOTATION)
            .map(|t| format!(" -> {}", t.label()))
            .unwrap_or_default();

        format!("{}({}){}", self.name, parts.join(", "), ret)
    }
}

/// Runtime type of a non-callable, non-container member.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSignature {
    pub name: String,
    pub type_name: String,
}

impl AttributeSignature {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Generator leaf. Carries no comparable structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSignature {
    pub name: String,
}

impl GeneratorSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
