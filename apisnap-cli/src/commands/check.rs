//! Check command - rebuild a target and validate it against its baseline.

use anyhow::Context;
use std::path::Path;

use apisnap_core::{check_signature_with, SignatureError, Snapshot};

use super::build::baseline_path;
use super::DriftReport;
use crate::config::ApisnapConfig;
use crate::output::{OutputConfig, Outputter};

/// Exits with status 1 when the API drifted from the baseline.
pub fn run(
    target: &str,
    baseline: Option<&Path>,
    config: &ApisnapConfig,
    output_config: &OutputConfig,
) -> anyhow::Result<()> {
    let path = baseline_path(baseline, config, target);
    let snapshot = Snapshot::load(&path)
        .with_context(|| format!("Failed to load baseline {}", path.display()))?;

    if snapshot.target != target {
        tracing::warn!(
            "Baseline {} was built from '{}', checking '{}'",
            path.display(),
            snapshot.target,
            target
        );
    }

    let host = super::live_host(config)?;
    let report = match check_signature_with(
        &host,
        target,
        &snapshot.signature,
        &config.build_options(),
    ) {
        Ok(()) => None,
        Err(SignatureError::Validation(err)) => Some(err.report),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to check '{}'", target));
        }
    };

    let drifted = report.is_some();
    DriftReport::new(path.display().to_string(), target, report).output(output_config);

    if drifted {
        std::process::exit(1);
    }
    Ok(())
}
