//! Command implementations for the apisnap CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod build;
pub mod check;
pub mod diff;
pub mod show;

use colored::Colorize;
use serde::Serialize;

use apisnap_core::differ::{ChangeCategory, ErrorReport, ReportEntry, ReportSummary};

use crate::config::ApisnapConfig;
use crate::output::{OutputConfig, Outputter, TreeNode, TreeOutput};

/// Host used by `build` and `check` to reach live modules.
#[cfg(feature = "python")]
pub(crate) fn live_host(
    config: &ApisnapConfig,
) -> anyhow::Result<apisnap_core::python::PyReflector> {
    let reflector = apisnap_core::python::PyReflector::new()?;
    Ok(reflector.with_sys_path(&config.python_paths())?)
}

#[cfg(not(feature = "python"))]
pub(crate) fn live_host(
    _config: &ApisnapConfig,
) -> anyhow::Result<apisnap_core::memory::ObjectGraph> {
    anyhow::bail!(
        "apisnap was built without the `python` feature; \
         rebuild with `--features python` to snapshot live modules"
    )
}

/// Outcome of comparing a candidate signature against a baseline.
#[derive(Debug, Serialize)]
pub struct DriftReport {
    pub baseline: String,
    pub candidate: String,
    pub clean: bool,
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ErrorReport>,
}

impl DriftReport {
    pub fn new(
        baseline: impl Into<String>,
        candidate: impl Into<String>,
        report: Option<ErrorReport>,
    ) -> Self {
        let (summary, entries) = match &report {
            Some(report) => (report.summary(), report.entries()),
            None => (ReportSummary::default(), Vec::new()),
        };
        Self {
            baseline: baseline.into(),
            candidate: candidate.into(),
            clean: report.is_none(),
            summary,
            entries,
            report,
        }
    }

    fn section(&self, category: ChangeCategory) -> Vec<&ReportEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect()
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl Outputter for DriftReport {
    fn to_table(&self, _config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} -> {}\n",
            "API:".cyan().bold(),
            self.baseline.yellow(),
            self.candidate.green()
        ));

        if self.clean {
            output.push_str(&format!("{}\n", "No API drift detected.".green()));
            return output;
        }

        let summary = &self.summary;
        output.push_str(&format!(
            "Found {} difference(s): {} missing, {} unknown, {} changed, {} kind mismatch(es)\n\n",
            summary.total().to_string().red(),
            summary.missing,
            summary.unknown,
            summary.changed,
            summary.kind_mismatches
        ));

        let kind = self.section(ChangeCategory::KindMismatch);
        if !kind.is_empty() {
            output.push_str(&format!(
                "{} ({}):\n",
                "KIND MISMATCH".red().bold(),
                kind.len()
            ));
            for entry in &kind {
                output.push_str(&format!(
                    "  ! {}\n    {}\n",
                    display_path(&entry.path).red(),
                    entry.description.dimmed()
                ));
            }
        }

        let missing = self.section(ChangeCategory::Missing);
        if !missing.is_empty() {
            output.push_str(&format!("{} ({}):\n", "MISSING".red().bold(), missing.len()));
            for entry in &missing {
                output.push_str(&format!("  - {}\n", display_path(&entry.path).red()));
            }
        }

        let unknown = self.section(ChangeCategory::Unknown);
        if !unknown.is_empty() {
            output.push_str(&format!("{} ({}):\n", "UNKNOWN".green().bold(), unknown.len()));
            for entry in &unknown {
                output.push_str(&format!("  + {}\n", display_path(&entry.path).green()));
            }
        }

        let changed = self.section(ChangeCategory::Changed);
        if !changed.is_empty() {
            output.push_str(&format!("{} ({}):\n", "CHANGED".yellow().bold(), changed.len()));
            for entry in &changed {
                output.push_str(&format!(
                    "  ~ {}\n    {}\n",
                    display_path(&entry.path).yellow(),
                    entry.description.dimmed()
                ));
            }
        }

        output
    }

    fn to_tree(&self, config: &OutputConfig) -> String {
        match &self.report {
            Some(report) => {
                TreeOutput::format(&TreeNode::from_report(&self.baseline, report, config))
            }
            None => self.to_table(config),
        }
    }
}
