//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.orderdash.toml` files.

use crate::analysis::aggregator::{DEFAULT_RATING, DEFAULT_TOP_N};
use crate::models::{Frequency, KpiDeltas};
use crate::source::DEFAULT_SOURCE_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".orderdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dataset source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Dashboard computation settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the dataset is loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CSV export URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Local CSV file; takes precedence over `url` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Download timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            file: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Dashboard computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows in the top products / top customers tables.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Avg Rating shown when the dataset has no ratings.
    #[serde(default = "default_rating_fallback")]
    pub rating_fallback: f64,

    /// Revenue trend bucket size.
    #[serde(default)]
    pub frequency: Frequency,

    /// Show delta strings under the KPI cards.
    #[serde(default = "default_true")]
    pub show_deltas: bool,

    /// Delta strings per KPI.
    #[serde(default)]
    pub deltas: KpiDeltas,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            rating_fallback: default_rating_fallback(),
            frequency: Frequency::default(),
            show_deltas: true,
            deltas: KpiDeltas::default(),
        }
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_rating_fallback() -> f64 {
    DEFAULT_RATING
}

fn default_true() -> bool {
    true
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "orderdash_report.md".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.source {
            self.source.url = url.clone();
            self.source.file = None;
        }
        if let Some(ref file) = args.file {
            self.source.file = Some(file.display().to_string());
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(top_n) = args.top_n {
            self.dashboard.top_n = top_n;
        }
        if let Some(frequency) = args.frequency {
            self.dashboard.frequency = frequency;
        }
        if args.no_deltas {
            self.dashboard.show_deltas = false;
        }

        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
