//! Tree output formatting for hierarchical display.
//!
//! Renders signature trees and nested reports like the `tree` command, with
//! Unicode box-drawing characters.

use super::OutputConfig;
use apisnap_core::differ::ErrorReport;
use apisnap_core::Signature;
use colored::Colorize;

/// Tree branch characters
struct TreeChars {
    pipe: &'static str,
    branch: &'static str,
    last: &'static str,
    space: &'static str,
}

impl TreeChars {
    const UNICODE: TreeChars = TreeChars {
        pipe: "\u{2502}   ",                 // |
        branch: "\u{251c}\u{2500}\u{2500} ", // |--
        last: "\u{2514}\u{2500}\u{2500} ",   // L--
        space: "    ",
    };
}

/// A labelled node in a rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Signature tree; `key` is the name the member is visible under.
    pub fn from_signature(key: &str, signature: &Signature, config: &OutputConfig) -> Self {
        let mut label = if key.is_empty() || key == signature.name() {
            signature.to_string()
        } else {
            format!("{} = {}", key, signature)
        };

        let mut children = Vec::new();
        if let Some(node) = signature.node() {
            if node.recursive {
                label.push_str(" (recursive)");
            }
            children = node
                .children
                .iter()
                .map(|(name, child)| TreeNode::from_signature(name, child, config))
                .collect();
        }

        if config.use_colors() {
            label = match signature {
                Signature::Module(_) => label.cyan().bold().to_string(),
                Signature::Class(_) => label.yellow().bold().to_string(),
                Signature::Function(_) => label.green().to_string(),
                Signature::Generator(_) => label.magenta().to_string(),
                Signature::Attribute(_) => label.dimmed().to_string(),
            };
        }

        Self { label, children }
    }

    /// Nested report; composites become branches keyed by member name.
    pub fn from_report(key: &str, report: &ErrorReport, config: &OutputConfig) -> Self {
        match report {
            ErrorReport::Members { members } => {
                let label = if config.use_colors() {
                    key.bold().to_string()
                } else {
                    key.to_string()
                };
                Self {
                    label,
                    children: members
                        .iter()
                        .map(|(name, nested)| TreeNode::from_report(name, nested, config))
                        .collect(),
                }
            }
            leaf => {
                let description = leaf.description();
                let description = if config.use_colors() {
                    match leaf {
                        ErrorReport::MissingElement => description.red().to_string(),
                        ErrorReport::UnknownElement => description.green().to_string(),
                        _ => description.yellow().to_string(),
                    }
                } else {
                    description
                };
                Self::leaf(format!("{}: {}", key, description))
            }
        }
    }
}

/// Tree output formatter
pub struct TreeOutput;

impl TreeOutput {
    pub fn format(root: &TreeNode) -> String {
        let mut lines = vec![root.label.clone()];
        Self::format_children(&root.children, "", &mut lines);
        lines.join("\n")
    }

    fn format_children(children: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
        let chars = &TreeChars::UNICODE;
        let len = children.len();

        for (i, child) in children.iter().enumerate() {
            let is_last = i + 1 == len;
            let connector = if is_last { chars.last } else { chars.branch };
            lines.push(format!("{}{}{}", prefix, connector, child.label));

            let child_prefix = format!(
                "{}{}",
                prefix,
                if is_last { chars.space } else { chars.pipe }
            );
            Self::format_children(&child.children, &child_prefix, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use apisnap_core::{AttributeSignature, NodeSignature};
    use std::collections::BTreeMap;

    fn plain() -> OutputConfig {
        OutputConfig::new(OutputFormat::Tree).without_colors()
    }

    #[test]
    fn test_format_nested() {
        let root = TreeNode {
            label: "root".to_string(),
            children: vec![
                TreeNode {
                    label: "a".to_string(),
                    children: vec![TreeNode::leaf("a1")],
                },
                TreeNode::leaf("b"),
            ],
        };

        let expected = "root\n├── a\n│   └── a1\n└── b";
        assert_eq!(TreeOutput::format(&root), expected);
    }

    #[test]
    fn test_signature_tree() {
        let signature = Signature::Module(
            NodeSignature::new("pkg")
                .with_child(
                    "VERSION",
                    Signature::Attribute(AttributeSignature::new("VERSION", "str")),
                )
                .with_child("loop_back", Signature::Module(NodeSignature::back_reference("pkg"))),
        );

        let text = TreeOutput::format(&TreeNode::from_signature("", &signature, &plain()));
        assert!(text.starts_with("Module pkg"));
        assert!(text.contains("├── Attribute VERSION (str)"));
        assert!(text.contains("└── loop_back = Module pkg (recursive)"));
    }

    #[test]
    fn test_report_tree() {
        let mut inner = BTreeMap::new();
        inner.insert("Client".to_string(), ErrorReport::MissingElement);
        let mut outer = BTreeMap::new();
        outer.insert("sub".to_string(), ErrorReport::Members { members: inner });
        let report = ErrorReport::Members { members: outer };

        let text = TreeOutput::format(&TreeNode::from_report("pkg", &report, &plain()));
        assert_eq!(text, "pkg\n└── sub\n    └── Client: missing element");
    }
}
