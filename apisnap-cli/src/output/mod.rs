//! Output formatting for the apisnap CLI.
//!
//! Every command result implements [`Outputter`] and can be rendered as a
//! colored table, JSON or a box-drawing tree. Colors are dropped when stdout
//! is not a TTY unless the config forces them.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod json;
mod tree;

pub use self::json::JsonOutput;
pub use self::tree::{TreeNode, TreeOutput};

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable report (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
    /// Tree format mirroring the module hierarchy
    Tree,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "tree" => Ok(OutputFormat::Tree),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub no_color: bool,
    /// Minified JSON
    pub compact: bool,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
            compact: false,
        }
    }

    /// Detect TTY context. `Some(_)` forces colors on or off.
    pub fn auto_detect_with_color_override(
        format: OutputFormat,
        color_override: Option<bool>,
    ) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        Self {
            format,
            no_color: !color_override.unwrap_or(is_tty),
            compact: false,
        }
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }

    pub fn without_colors(mut self) -> Self {
        self.no_color = true;
        self
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }
}

/// Types that can be rendered in any supported format.
pub trait Outputter: Serialize {
    fn to_table(&self, config: &OutputConfig) -> String;

    fn to_json(&self, config: &OutputConfig) -> String {
        JsonOutput::format(self, config)
    }

    /// Falls back to the table rendering.
    fn to_tree(&self, config: &OutputConfig) -> String {
        self.to_table(config)
    }

    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
            OutputFormat::Tree => self.to_tree(config),
        }
    }

    fn output(&self, config: &OutputConfig) {
        println!("{}", self.render(config));
    }
}
