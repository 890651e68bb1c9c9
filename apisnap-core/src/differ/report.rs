//! Report types produced by signature validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::SignatureKind;

/// Structured description of how a candidate differs from its baseline.
///
/// Composite mismatches nest per member; leaf mismatches are flat descriptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ErrorReport {
    /// The two signatures are of different kinds; nothing else was compared.
    KindMismatch {
        baseline: SignatureKind,
        candidate: SignatureKind,
    },
    /// Per-member errors of a module or class, keyed by member name.
    Members {
        members: BTreeMap<String, ErrorReport>,
    },
    /// Present in the baseline, absent now.
    MissingElement,
    /// Newly introduced since the baseline.
    UnknownElement,
    /// One side is a back-reference to an enclosing object and the other is not.
    RecursionChanged { baseline: bool, candidate: bool },
    FunctionChanged {
        baseline: String,
        candidate: String,
        /// One line per differing parameter-structure field.
        details: Vec<String>,
    },
    AttributeChanged { baseline: String, candidate: String },
}

/// Coarse category of a report leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Missing,
    Unknown,
    Changed,
    KindMismatch,
}

impl ChangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::Missing => "missing",
            ChangeCategory::Unknown => "unknown",
            ChangeCategory::Changed => "changed",
            ChangeCategory::KindMismatch => "kind_mismatch",
        }
    }
}

/// A single flattened report leaf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Dotted member path from the checked root; empty for the root itself.
    pub path: String,
    pub category: ChangeCategory,
    pub description: String,
}

/// Summary counts over all report leaves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub missing: u32,
    pub unknown: u32,
    pub changed: u32,
    pub kind_mismatches: u32,
}

impl ReportSummary {
    pub fn total(&self) -> u32 {
        self.missing + self.unknown + self.changed + self.kind_mismatches
    }

    fn increment(&mut self, category: ChangeCategory) {
        match category {
            ChangeCategory::Missing => self.missing += 1,
            ChangeCategory::Unknown => self.unknown += 1,
            ChangeCategory::Changed => self.changed += 1,
            ChangeCategory::KindMismatch => self.kind_mismatches += 1,
        }
    }
}

impl ErrorReport {
    /// Number of entries at this level: member count for composites, 1 for leaves.
    pub fn len(&self) -> usize {
        match self {
            ErrorReport::Members { members } => members.len(),
            _ => 1,
        }
    }

    /// Reports are never constructed empty; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nested report for a direct member, if any.
    pub fn member(&self, name: &str) -> Option<&ErrorReport> {
        match self {
            ErrorReport::Members { members } => members.get(name),
            _ => None,
        }
    }

    /// Category of a leaf report; `None` for composites.
    pub fn category(&self) -> Option<ChangeCategory> {
        match self {
            ErrorReport::Members { .. } => None,
            ErrorReport::MissingElement => Some(ChangeCategory::Missing),
            ErrorReport::UnknownElement => Some(ChangeCategory::Unknown),
            ErrorReport::KindMismatch { .. } => Some(ChangeCategory::KindMismatch),
            ErrorReport::RecursionChanged { .. }
            | ErrorReport::FunctionChanged { .. }
            | ErrorReport::AttributeChanged { .. } => Some(ChangeCategory::Changed),
        }
    }

    /// Human-readable description of a leaf report.
    pub fn description(&self) -> String {
        match self {
            ErrorReport::KindMismatch {
                baseline,
                candidate,
            } => format!("type mismatch (baseline: {}, actual: {})", baseline, candidate),
            ErrorReport::Members { members } => format!("{} member(s) differ", members.len()),
            ErrorReport::MissingElement => "missing element".to_string(),
            ErrorReport::UnknownElement => "unknown element".to_string(),
            ErrorReport::RecursionChanged {
                baseline,
                candidate,
            } => format!(
                "recursive reference changed (baseline: {}, actual: {})",
                baseline, candidate
            ),
            ErrorReport::FunctionChanged {
                baseline,
                candidate,
                details,
            } => {
                let mut s = format!(
                    "function signature changed: {} -> {}",
                    baseline, candidate
                );
                if !details.is_empty() {
                    s.push_str(&format!(" [{}]", details.join("; ")));
                }
                s
            }
            ErrorReport::AttributeChanged {
                baseline,
                candidate,
            } => format!("attribute type changed: {} -> {}", baseline, candidate),
        }
    }

    /// Flatten into leaf entries sorted by dotted path.
    pub fn entries(&self) -> Vec<ReportEntry> {
        let mut entries = Vec::new();
        self.collect_entries("", &mut entries);
        entries
    }

    fn collect_entries(&self, prefix: &str, out: &mut Vec<ReportEntry>) {
        match self {
            ErrorReport::Members { members } => {
                for (name, nested) in members {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", prefix, name)
                    };
                    nested.collect_entries(&path, out);
                }
            }
            leaf => {
                if let Some(category) = leaf.category() {
                    out.push(ReportEntry {
                        path: prefix.to_string(),
                        category,
                        description: leaf.description(),
                    });
                }
            }
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in self.entries() {
            summary.increment(entry.category);
        }
        summary
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .entries()
            .into_iter()
            .map(|entry| {
                if entry.path.is_empty() {
                    entry.description
                } else {
                    format!("{}: {}", entry.path, entry.description)
                }
            })
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ErrorReport {
        let mut inner = BTreeMap::new();
        inner.insert("ApiClass".to_string(), ErrorReport::MissingElement);
        inner.insert("new_var".to_string(), ErrorReport::UnknownElement);

        let mut outer = BTreeMap::new();
        outer.insert(
            "package".to_string(),
            ErrorReport::Members { members: inner },
        );
        outer.insert(
            "VERSION".to_string(),
            ErrorReport::AttributeChanged {
                baseline: "str".to_string(),
                candidate: "tuple".to_string(),
            },
        );
        ErrorReport::Members { members: outer }
    }

    #[test]
    fn test_entries_are_flattened_and_sorted() {
        let entries = sample_report().entries();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["VERSION", "package.ApiClass", "package.new_var"]);
        assert_eq!(entries[1].category, ChangeCategory::Missing);
        assert_eq!(entries[2].description, "unknown element");
    }

    #[test]
    fn test_len_counts_direct_members() {
        let report = sample_report();
        assert_eq!(report.len(), 2);
        assert_eq!(report.member("package").map(ErrorReport::len), Some(2));
        assert_eq!(ErrorReport::MissingElement.len(), 1);
    }

    #[test]
    fn test_summary_counts_leaves() {
        let summary = sample_report().summary();
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.kind_mismatches, 0);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_display_root_leaf_has_no_path() {
        let report = ErrorReport::KindMismatch {
            baseline: SignatureKind::Module,
            candidate: SignatureKind::Class,
        };
        assert_eq!(
            report.to_string(),
            "type mismatch (baseline: module, actual: class)"
        );
    }

    #[test]
    fn test_display_nested() {
        let text = sample_report().to_string();
        assert!(text.contains("package.ApiClass: missing element"));
        assert!(text.contains("VERSION: attribute type changed: str -> tuple"));
    }

    #[test]
    fn test_report_json_tagging() {
        let json = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["error"], "members");
        assert_eq!(json["members"]["package"]["members"]["ApiClass"]["error"], "missing_element");
    }
}
