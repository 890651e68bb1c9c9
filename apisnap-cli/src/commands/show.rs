//! Show command - render a stored snapshot.

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use apisnap_core::{Signature, Snapshot};

use crate::output::{OutputConfig, Outputter, TreeNode, TreeOutput};

/// A loaded snapshot plus summary figures
#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub target: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub signatures: usize,
    pub signature: Signature,
}

impl From<Snapshot> for ShowResult {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            signatures: snapshot.signature.count(),
            target: snapshot.target,
            version: snapshot.version,
            created_at: snapshot.created_at,
            signature: snapshot.signature,
        }
    }
}

impl Outputter for ShowResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        format!(
            "{} {}\n{} {}\n{} {}\n\n{}",
            "Target:".cyan(),
            self.target.bold(),
            "Created:".cyan(),
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            "Signatures:".cyan(),
            self.signatures,
            self.to_tree(config)
        )
    }

    fn to_tree(&self, config: &OutputConfig) -> String {
        TreeOutput::format(&TreeNode::from_signature("", &self.signature, config))
    }
}

pub fn run(file: &Path, output_config: &OutputConfig) -> anyhow::Result<()> {
    let snapshot =
        Snapshot::load(file).with_context(|| format!("Failed to load {}", file.display()))?;
    ShowResult::from(snapshot).output(output_config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use apisnap_core::{FunctionSignature, NodeSignature};

    #[test]
    fn test_table_has_header_and_tree() {
        colored::control::set_override(false);
        let run = Signature::Function(FunctionSignature::new("run"));
        let signature = Signature::Module(NodeSignature::new("pkg").with_child("run", run));
        let result = ShowResult::from(Snapshot::new("pkg", signature));
        let config = OutputConfig::new(OutputFormat::Table).without_colors();

        let text = result.to_table(&config);
        assert!(text.contains("Target: pkg"));
        assert!(text.contains("Signatures: 2"));
        assert!(text.contains("└── Function run()"));
    }
}
