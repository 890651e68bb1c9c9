//! Build command - snapshot a target's public API into a baseline file.

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use apisnap_core::{build_signature_with, Snapshot};

use crate::config::ApisnapConfig;
use crate::output::{OutputConfig, Outputter};

/// Result of a successful build
#[derive(Debug, Serialize)]
pub struct BuildResult {
    pub target: String,
    pub path: PathBuf,
    pub signatures: usize,
}

impl Outputter for BuildResult {
    fn to_table(&self, _config: &OutputConfig) -> String {
        format!(
            "{} {} -> {} ({} signatures)",
            "SAVED:".green().bold(),
            self.target.cyan(),
            self.path.display(),
            self.signatures
        )
    }
}

/// Resolve where a baseline for `target` lives.
pub fn baseline_path(explicit: Option<&Path>, config: &ApisnapConfig, target: &str) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Snapshot::default_path(&config.baseline_dir(), target))
}

pub fn run(
    target: &str,
    output: Option<&Path>,
    config: &ApisnapConfig,
    output_config: &OutputConfig,
) -> anyhow::Result<()> {
    let host = super::live_host(config)?;
    let signature = build_signature_with(&host, target, &config.build_options())
        .with_context(|| format!("Failed to build signature of '{}'", target))?;

    let path = baseline_path(output, config, target);
    let snapshot = Snapshot::new(target, signature);
    snapshot
        .save(&path)
        .with_context(|| format!("Failed to save baseline to {}", path.display()))?;

    tracing::info!("Saved baseline of {} to {:?}", target, path);

    BuildResult {
        target: target.to_string(),
        path,
        signatures: snapshot.signature.count(),
    }
    .output(output_config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_path_defaults_to_config_dir() {
        let config = ApisnapConfig::default();
        assert_eq!(
            baseline_path(None, &config, "pkg.mod:Client"),
            PathBuf::from(".apisnap/pkg.mod__Client.json")
        );
    }

    #[test]
    fn test_explicit_baseline_path_wins() {
        let config = ApisnapConfig::default();
        let explicit = Path::new("custom/pkg.json");
        assert_eq!(baseline_path(Some(explicit), &config, "pkg"), explicit);
    }
}
