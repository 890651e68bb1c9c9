//! apisnap core - public API signature snapshots and structural diffing.
//!
//! This crate builds a [`Signature`] tree describing the public surface of a
//! module (its classes, functions, attributes and generators, recursively),
//! persists it as a baseline, and later compares a freshly built tree against
//! that baseline to catch accidental API drift.
//!
//! # Features
//!
//! - **Host-agnostic**: live objects are inspected through the [`Reflector`]
//!   trait; [`memory::ObjectGraph`] is a bundled in-memory host
//! - **Cycle-safe**: back-references to enclosing modules or classes become
//!   `recursive` leaves instead of recursing forever
//! - **Structured reports**: mismatches nest per member with missing,
//!   unknown and changed entries
//! - **Python host** (`python` feature): reflect an embedded CPython module
//!   via pyo3
//!
//! # Usage
//!
//! ```rust,ignore
//! use apisnap_core::{build_signature, check_signature, memory::ObjectGraph};
//!
//! let mut graph = ObjectGraph::new();
//! let pkg = graph.add_module("pkg");
//! graph.add_class(pkg, "Client");
//!
//! let baseline = build_signature(&graph, "pkg")?;
//! check_signature(&graph, "pkg", &baseline)?;
//! ```

pub mod differ;
pub mod error;
pub mod factory;
pub mod locator;
pub mod memory;
#[cfg(feature = "python")]
pub mod python;
pub mod reflect;
pub mod snapshot;
pub mod types;

pub use differ::{structurally_equal, validate, ErrorReport, ReportSummary};
pub use error::{Result, SignatureError, ValidationError};
pub use factory::{BuildOptions, SignatureFactory};
pub use locator::{Locator, PathLocator, TargetPath};
pub use reflect::{ModuleImporter, ObjectId, ObjectKind, Reflector};
pub use snapshot::Snapshot;
pub use types::{
    AttributeSignature, FunctionSignature, GeneratorSignature, NodeSignature, Signature,
    SignatureKind,
};

/// Build the signature of the object named by `path`.
///
/// `path` is `module.submodule` or `module.submodule:Member`. Fails with
/// [`SignatureError::Resolution`] when the module or member does not exist.
pub fn build_signature<H: ModuleImporter>(host: &H, path: &str) -> Result<Signature> {
    build_signature_with(host, path, &BuildOptions::default())
}

/// [`build_signature`] with explicit build options.
pub fn build_signature_with<H: ModuleImporter>(
    host: &H,
    path: &str,
    options: &BuildOptions,
) -> Result<Signature> {
    let target = TargetPath::parse(path)?;
    let object = PathLocator::new(host).locate(&target)?;

    let signature = SignatureFactory::new(host)
        .with_options(options.clone())
        .build(&object)?;

    tracing::debug!("Built signature of {} ({} nodes)", target, signature.count());
    Ok(signature)
}

/// Build the signature of an already resolved object, skipping path lookup.
pub fn build_signature_for_live_object<R: Reflector>(
    reflector: &R,
    object: &R::Object,
) -> Result<Signature> {
    SignatureFactory::new(reflector).build(object)
}

/// Rebuild the signature at `path` and validate it against `baseline`.
///
/// Returns [`SignatureError::Validation`] carrying the full report when the
/// API drifted.
pub fn check_signature<H: ModuleImporter>(
    host: &H,
    path: &str,
    baseline: &Signature,
) -> Result<()> {
    check_signature_with(host, path, baseline, &BuildOptions::default())
}

/// [`check_signature`] with explicit build options.
pub fn check_signature_with<H: ModuleImporter>(
    host: &H,
    path: &str,
    baseline: &Signature,
    options: &BuildOptions,
) -> Result<()> {
    let candidate = build_signature_with(host, path, options)?;

    match validate(&candidate, baseline) {
        None => {
            tracing::info!("API of {} matches its baseline", path);
            Ok(())
        }
        Some(report) => {
            tracing::info!(
                "API of {} drifted: {} difference(s)",
                path,
                report.entries().len()
            );
            Err(ValidationError::new(path, report).into())
        }
    }
}
