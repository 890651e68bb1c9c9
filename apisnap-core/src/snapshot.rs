//! Signature serialization and baseline persistence.
//!
//! Signatures serialize to JSON via serde. [`serialize`]/[`deserialize`]
//! handle a bare signature; [`Snapshot`] wraps one with the metadata written
//! to baseline files.
//!
//! # Snapshot Format
//!
//! ```json
//! {
//!   "version": "1",
//!   "target": "api_module.api_package1",
//!   "created_at": "2026-01-01T00:00:00Z",
//!   "signature": { "kind": "module", "name": "api_package1", "children": { ... } }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SignatureError};
use crate::types::Signature;

/// Current snapshot format version. Increment when the format changes.
pub const SNAPSHOT_VERSION: &str = "1";

/// Default directory for baseline files, relative to the project root.
pub const DEFAULT_BASELINE_DIR: &str = ".apisnap";

/// Serialize a signature to an opaque byte sequence.
pub fn serialize(signature: &Signature) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(signature)?)
}

/// Reconstruct a signature from bytes produced by [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<Signature> {
    Ok(serde_json::from_slice(bytes)?)
}

/// A persisted baseline: a signature tree plus the target it was built from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version for compatibility checking.
    pub version: String,
    /// Target path the signature was built from.
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub signature: Signature,
}

impl Snapshot {
    pub fn new(target: impl Into<String>, signature: Signature) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            target: target.into(),
            created_at: Utc::now(),
            signature,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode a snapshot, rejecting unknown format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SignatureError::Serialization {
                message: format!(
                    "unsupported snapshot version {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            });
        }
        Ok(snapshot)
    }

    /// Load a snapshot from disk.
    ///
    /// Unlike a cache, a baseline that cannot be read or decoded is an error:
    /// it is never replaced by an empty or default snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let snapshot = Self::from_bytes(&bytes).map_err(|e| match e {
            SignatureError::Serialization { message } => SignatureError::Serialization {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })?;
        tracing::debug!(
            "Loaded snapshot of {} ({} signatures) from {:?}",
            snapshot.target,
            snapshot.signature.count(),
            path
        );
        Ok(snapshot)
    }

    /// Save atomically: write a temp file next to `path`, then rename it over.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| SignatureError::Io(e.error))?;

        tracing::debug!("Saved snapshot of {} to {:?}", self.target, path);
        Ok(())
    }

    /// Default baseline file for `target` inside `dir`.
    ///
    /// `pkg.mod:Class` maps to `<dir>/pkg.mod__Class.json`.
    pub fn default_path(dir: &Path, target: &str) -> PathBuf {
        dir.join(format!("{}.json", target.replace(':', "__")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::validate;
    use crate::types::{AttributeSignature, FunctionSignature, GeneratorSignature, NodeSignature};
    use tempfile::TempDir;

    fn sample() -> Signature {
        let mut func = FunctionSignature::new("run");
        func.parameters = vec!["x".into()];
        func.defaults = vec![Signature::Attribute(AttributeSignature::new("x", "int"))];
        Signature::Module(
            NodeSignature::new("pkg")
                .with_child("run", Signature::Function(func))
                .with_child(
                    "VERSION",
                    Signature::Attribute(AttributeSignature::new("VERSION", "str")),
                ),
        )
    }

    #[test]
    fn test_round_trip_validates_both_ways() {
        let original = sample();
        let restored = deserialize(&serialize(&original).unwrap()).unwrap();
        assert!(validate(&restored, &original).is_none());
        assert!(validate(&original, &restored).is_none());
    }

    /// A tree touching every variant and every optional field.
    fn every_variant() -> Signature {
        let mut send = FunctionSignature::new("send");
        send.parameters = vec!["self".into(), "payload".into()];
        send.variadic_positional = Some("args".into());
        send.variadic_keyword = Some("kw".into());
        send.keyword_only = vec!["timeout".into()];
        send.keyword_only_defaults.insert(
            "timeout".into(),
            Signature::Attribute(AttributeSignature::new("timeout", "float")),
        );
        send.annotations.insert(
            "payload".into(),
            Signature::Class(NodeSignature::back_reference("Client")),
        );
        send.annotations.insert(
            "return".into(),
            Signature::Attribute(AttributeSignature::new("return", "int")),
        );

        let client = NodeSignature::new("Client")
            .with_child("send", Signature::Function(send))
            .with_child("stream", Signature::Generator(GeneratorSignature::new("stream")))
            .with_child("native", Signature::Function(FunctionSignature::opaque("native")));

        Signature::Module(
            NodeSignature::new("pkg")
                .with_child("Client", Signature::Class(client))
                .with_child("pkg", Signature::Module(NodeSignature::back_reference("pkg"))),
        )
    }

    #[test]
    fn test_round_trip_keeps_every_variant() {
        let original = every_variant();
        let bytes = serialize(&original).unwrap();
        let restored = deserialize(&bytes).unwrap();

        assert_eq!(restored, original);
        assert!(validate(&restored, &original).is_none());
        assert!(validate(&original, &restored).is_none());

        let Some(Signature::Module(cycle)) = restored.get("pkg") else {
            panic!("expected the self reference to survive");
        };
        assert!(cycle.recursive);
        let Some(Signature::Function(send)) = restored.get("Client.send") else {
            panic!("expected Client.send to survive");
        };
        assert!(matches!(
            send.annotations.get("payload"),
            Some(Signature::Class(node)) if node.recursive
        ));
        assert_eq!(send.keyword_only_defaults["timeout"].label(), "float");
        assert!(matches!(
            restored.get("Client.stream"),
            Some(Signature::Generator(_))
        ));
        assert!(matches!(
            restored.get("Client.native"),
            Some(Signature::Function(f)) if f.is_opaque
        ));

        // Only back references carry the flag on the wire.
        let json = String::from_utf8(bytes).unwrap();
        assert_eq!(json.matches("\"recursive\":true").count(), 2);
        assert!(!json.contains("\"recursive\":false"));
    }

    #[test]
    fn test_truncated_bytes_fail_distinctly() {
        let bytes = serialize(&sample()).unwrap();
        let err = deserialize(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, SignatureError::Serialization { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baselines").join("pkg.json");

        let snapshot = Snapshot::new("pkg", sample());
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.target, "pkg");
        assert_eq!(loaded.version, SNAPSHOT_VERSION);
        assert!(validate(&loaded.signature, &snapshot.signature).is_none());
    }

    #[test]
    fn test_no_temp_files_left_after_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkg.json");
        Snapshot::new("pkg", sample()).save(&path).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("pkg.json")]);
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut snapshot = Snapshot::new("pkg", sample());
        snapshot.version = "0".to_string();
        let bytes = serde_json::to_vec(&snapshot).unwrap();

        let err = Snapshot::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported snapshot version"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Snapshot::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SignatureError::Io(_)));
    }

    #[test]
    fn test_corrupt_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"{\"version\": \"1\", \"target\":").unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(err, SignatureError::Serialization { .. }));
        assert!(err.to_string().contains("corrupt.json"));
    }

    #[test]
    fn test_default_path() {
        let path = Snapshot::default_path(Path::new(".apisnap"), "pkg.mod:Client");
        assert_eq!(path, Path::new(".apisnap/pkg.mod__Client.json"));
    }
}
