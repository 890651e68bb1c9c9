//! apisnap configuration loading from `.apisnaprc.toml`.
//!
//! Configuration is optional; every setting has a default and command-line
//! flags take precedence over the file.
//!
//! # Example Configuration
//!
//! ```toml
//! [build]
//! private_prefix = "_"
//!
//! [python]
//! paths = ["src", "vendor"]
//!
//! [output]
//! format = "table"
//! color = true
//!
//! [baseline]
//! directory = ".apisnap"
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use apisnap_core::factory::{BuildOptions, DEFAULT_PRIVATE_PREFIX};
use apisnap_core::snapshot::DEFAULT_BASELINE_DIR;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".apisnaprc.toml";

/// Root configuration structure loaded from `.apisnaprc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct ApisnapConfig {
    #[serde(default)]
    pub build: BuildSettings,

    #[serde(default)]
    pub python: PythonSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub baseline: BaselineSettings,
}

/// Signature build settings.
#[derive(Debug, Deserialize, Default)]
pub struct BuildSettings {
    /// Prefix marking private members. Default: `_`.
    ///
    /// An empty string treats every member as public.
    #[serde(default)]
    pub private_prefix: Option<String>,
}

/// Embedded interpreter settings (used with the `python` feature).
#[derive(Debug, Deserialize, Default)]
pub struct PythonSettings {
    /// Extra `sys.path` entries, relative to the working directory.
    ///
    /// Default: the working directory itself.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Output formatting preferences. Command-line flags override these.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `table`, `json`, `tree`
    #[serde(default)]
    pub format: Option<String>,

    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

/// Where baselines are stored.
#[derive(Debug, Deserialize, Default)]
pub struct BaselineSettings {
    /// Default: `.apisnap`
    #[serde(default)]
    pub directory: Option<String>,
}

impl ApisnapConfig {
    /// Load configuration from `.apisnaprc.toml` in `root`.
    ///
    /// Missing or unparsable files yield defaults; parse errors are logged
    /// as warnings.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    /// Like [`ApisnapConfig::load`], but a config file that exists and cannot
    /// be read or parsed is an error.
    pub fn load_strict(root: &Path) -> anyhow::Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            private_prefix: self
                .build
                .private_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_PRIVATE_PREFIX.to_string()),
        }
    }

    pub fn python_paths(&self) -> Vec<PathBuf> {
        if self.python.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.python.paths.iter().map(PathBuf::from).collect()
        }
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    pub fn baseline_dir(&self) -> PathBuf {
        PathBuf::from(
            self.baseline
                .directory
                .as_deref()
                .unwrap_or(DEFAULT_BASELINE_DIR),
        )
    }
}
