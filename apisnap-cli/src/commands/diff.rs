//! Diff command - compare two stored snapshots.

use anyhow::Context;
use std::path::Path;

use apisnap_core::{validate, Snapshot};

use super::DriftReport;
use crate::output::{OutputConfig, Outputter};

/// Compare `candidate` against `baseline`; exits with status 1 on drift.
pub fn run(baseline: &Path, candidate: &Path, output_config: &OutputConfig) -> anyhow::Result<()> {
    let base = Snapshot::load(baseline)
        .with_context(|| format!("Failed to load baseline {}", baseline.display()))?;
    let cand = Snapshot::load(candidate)
        .with_context(|| format!("Failed to load candidate {}", candidate.display()))?;

    if base.target != cand.target {
        tracing::warn!(
            "Comparing snapshots of different targets: '{}' vs '{}'",
            base.target,
            cand.target
        );
    }

    let report = validate(&cand.signature, &base.signature);
    let drifted = report.is_some();

    DriftReport::new(
        baseline.display().to_string(),
        candidate.display().to_string(),
        report,
    )
    .output(output_config);

    if drifted {
        std::process::exit(1);
    }
    Ok(())
}
