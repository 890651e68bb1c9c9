//! Target path resolution.
//!
//! A target path names a module by dotted path, optionally followed by
//! `:member` to select an attribute of that module, e.g.
//! `api_module.api_package1:ApiPackage1Class1`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SignatureError};
use crate::reflect::ModuleImporter;

/// Parsed target path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPath {
    pub module: String,
    pub member: Option<String>,
}

impl TargetPath {
    pub fn parse(path: &str) -> Result<Self> {
        let (module, member) = match path.rsplit_once(':') {
            Some((module, member)) => (module, Some(member)),
            None => (path, None),
        };

        let valid_module = !module.is_empty() && module.split('.').all(|part| !part.is_empty());
        if !valid_module {
            return Err(SignatureError::resolution(path, "invalid module path"));
        }
        if member.is_some_and(str::is_empty) {
            return Err(SignatureError::resolution(path, "empty member name after ':'"));
        }

        Ok(Self {
            module: module.to_string(),
            member: member.map(str::to_string),
        })
    }
}

impl FromStr for TargetPath {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}:{}", self.module, member),
            None => f.write_str(&self.module),
        }
    }
}

/// Resolves a target path to a live object.
pub trait Locator {
    type Object;

    fn locate(&self, target: &TargetPath) -> Result<Self::Object>;
}

/// Locator that imports the module through the host and then looks up the
/// optional member on it.
pub struct PathLocator<'h, H> {
    host: &'h H,
}

impl<'h, H: ModuleImporter> PathLocator<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }
}

impl<H: ModuleImporter> Locator for PathLocator<'_, H> {
    type Object = H::Object;

    fn locate(&self, target: &TargetPath) -> Result<H::Object> {
        let path = target.to_string();
        let module = self
            .host
            .import_module(&target.module)
            .map_err(|e| SignatureError::resolution(&path, e.message))?
            .ok_or_else(|| {
                SignatureError::resolution(&path, format!("No module named '{}'", target.module))
            })?;

        let Some(member) = &target.member else {
            tracing::debug!("Resolved module {}", target.module);
            return Ok(module);
        };

        let object = self
            .host
            .member(&module, member)
            .map_err(|e| SignatureError::resolution(&path, e.message))?
            .ok_or_else(|| {
                SignatureError::resolution(
                    &path,
                    format!(
                        "Module '{}' does not define a '{}' attribute/class",
                        target.module, member
                    ),
                )
            })?;

        tracing::debug!("Resolved {}", path);
        Ok(object)
    }
}
