//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Frequency, MenuItem};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// OrderDash - order analytics dashboard for e-commerce CSV exports
///
/// Loads an order export, computes KPIs, trends, distributions and
/// top-N rankings, and writes them as a Markdown or JSON dashboard.
///
/// Examples:
///   orderdash
///   orderdash --file orders.csv --category "Mobiles & Tablets"
///   orderdash --from 2021-01-01 --to 2021-06-30 --frequency monthly
///   orderdash --menu main-dashboard,payment-analytics --format json -o dash.json
///   orderdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV export URL to load
    ///
    /// Defaults to the URL in .orderdash.toml, or the bundled sample sheet.
    #[arg(short, long, value_name = "URL", env = "ORDERDASH_SOURCE")]
    pub source: Option<String>,

    /// Local CSV file to load instead of a URL
    #[arg(short, long, value_name = "FILE", conflicts_with = "source")]
    pub file: Option<PathBuf>,

    /// Pages to render (comma-separated)
    #[arg(
        short,
        long,
        value_name = "PAGES",
        value_delimiter = ',',
        default_value = "main-dashboard"
    )]
    pub menu: Vec<MenuItem>,

    /// Only aggregate rows of this category ("All" for every category)
    #[arg(short = 'k', long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// First order date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last order date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Revenue trend bucket size
    #[arg(long, value_name = "FREQ")]
    pub frequency: Option<Frequency>,

    /// Rows in the top products and top customers tables
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Download timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Hide the delta strings under the KPI cards
    #[arg(long)]
    pub no_deltas: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the dashboard
    ///
    /// Defaults to the path in .orderdash.toml, or orderdash_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .orderdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the category selector entries and exit
    #[arg(long)]
    pub list_categories: bool,

    /// Generate a default .orderdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.source {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref path) = self.file {
            if !path.is_file() {
                return Err(format!("Dataset file does not exist: {}", path.display()));
            }
        }

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(format!(
                    "--from ({}) must not be after --to ({})",
                    from, to
                ));
            }
        }

        if self.top_n == Some(0) {
            return Err("Top-N must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.menu.is_empty() {
            return Err("At least one page must be selected with --menu".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            source: None,
            file: None,
            menu: vec![MenuItem::MainDashboard],
            category: None,
            from: None,
            to: None,
            frequency: None,
            top_n: None,
            timeout: None,
            no_deltas: false,
            format: OutputFormat::Markdown,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            list_categories: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_menu_list() {
        let args = Args::parse_from([
            "orderdash",
            "--menu",
            "main-dashboard,payment-analytics",
            "--frequency",
            "weekly",
            "--from",
            "2021-01-01",
        ]);
        assert_eq!(
            args.menu,
            vec![MenuItem::MainDashboard, MenuItem::PaymentAnalytics]
        );
        assert_eq!(args.frequency, Some(Frequency::Weekly));
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2021, 1, 1));
    }

    #[test]
    fn test_default_menu_is_main_dashboard() {
        let args = Args::parse_from(["orderdash"]);
        assert_eq!(args.menu, vec![MenuItem::MainDashboard]);
        assert_eq!(args.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.source = Some("ftp://example.com/data.csv".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_file() {
        let mut args = make_args();
        args.file = Some(PathBuf::from("/no/such/orders.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_inverted_period() {
        let mut args = make_args();
        args.from = NaiveDate::from_ymd_opt(2021, 2, 1);
        args.to = NaiveDate::from_ymd_opt(2021, 1, 1);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_top_n() {
        let mut args = make_args();
        args.top_n = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
