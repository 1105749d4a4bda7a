//! Dataset loading.
//!
//! This module fetches the order export (over HTTP or from disk) and parses
//! it into a `Table`, inferring a type for every cell.

use crate::models::{parse_date, Row, Table, Value};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Google Sheets CSV export of the Tokopedia order sample.
pub const DEFAULT_SOURCE_URL: &str =
    "https://docs.google.com/spreadsheets/d/1EXl9nfmH4KXKud7_9X1FcX8mvNCcsJR8ayf7zQn2vyw/export?format=csv";

/// Cell contents read as missing values.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// Errors raised while fetching or parsing the dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0} contains no header row")]
    EmptySource(String),
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// Stable identity used as the cache key.
    pub fn identity(&self) -> String {
        match self {
            DataSource::Url(url) => url.clone(),
            DataSource::File(path) => format!("file://{}", path.display()),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Options for loading a dataset.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether to show a spinner while downloading.
    pub show_progress: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            show_progress: true,
        }
    }
}

/// Load and parse a dataset.
pub async fn load_source(source: &DataSource, options: &LoaderOptions) -> Result<Table, LoadError> {
    info!("Loading dataset: {}", source);

    let text = match source {
        DataSource::Url(url) => fetch_text(url, options).await?,
        DataSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?
        }
    };

    let table = parse_csv(&text, &source.to_string())?;
    info!(
        "Loaded {} rows x {} columns",
        table.row_count(),
        table.columns().len()
    );

    Ok(table)
}

/// Download the CSV body of a URL.
async fn fetch_text(url: &str, options: &LoaderOptions) -> Result<String, LoadError> {
    let http_error = |source| LoadError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .build()
        .map_err(http_error)?;

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Downloading dataset...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = async {
        let response = client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.text().await.map_err(http_error)
    }
    .await;

    if let Some(pb) = spinner {
        match &result {
            Ok(body) => pb.finish_with_message(format!("Downloaded {} bytes", body.len())),
            Err(_) => pb.abandon_with_message("Download failed"),
        }
    }

    result
}

/// Parse CSV text into a table.
///
/// The first record is the header. Short records are padded with absent
/// cells, long ones are cut to the header width, and records the CSV reader
/// rejects are skipped with a warning.
pub fn parse_csv(text: &str, origin: &str) -> Result<Table, LoadError> {
    // Strip UTF-8 BOM if present
    let text = text.trim_start_matches('\u{FEFF}');

    if text.trim().is_empty() {
        return Err(LoadError::EmptySource(origin.to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!("CSV headers: {:?}", columns);

    let width = columns.len();
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed CSV record: {}", e);
                skipped += 1;
                continue;
            }
        };

        let values = (0..width)
            .map(|i| record.get(i).map(infer_value).unwrap_or(Value::Absent))
            .collect();
        rows.push(Row::new(values));
    }

    if skipped > 0 {
        warn!("Skipped {} malformed CSV records from {}", skipped, origin);
    }

    Ok(Table::new(columns, rows))
}

/// Infer the type of a raw CSV cell.
pub fn infer_value(raw: &str) -> Value {
    let raw = raw.trim();

    if MISSING_MARKERS.contains(&raw) {
        return Value::Absent;
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }

    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }

    if let Some(date) = parse_date(raw) {
        return Value::Date(date);
    }

    Value::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_infer_value() {
        assert_eq!(infer_value(""), Value::Absent);
        assert_eq!(infer_value("NaN"), Value::Absent);
        assert_eq!(infer_value("True"), Value::Boolean(true));
        assert_eq!(infer_value("42"), Value::Integer(42));
        assert_eq!(infer_value(" 3.5 "), Value::Float(3.5));
        assert_eq!(
            infer_value("2021-11-19"),
            Value::Date(NaiveDate::from_ymd_opt(2021, 11, 19).unwrap())
        );
        assert_eq!(infer_value("inf"), Value::Text("inf".to_string()));
        assert_eq!(
            infer_value("Mobiles & Tablets"),
            Value::Text("Mobiles & Tablets".to_string())
        );
    }

    #[test]
    fn test_parse_csv_basic() {
        let text = "order_id,price,qty_ordered,category\n\
                    100,1500.5,2,Beauty\n\
                    101,,1,Mobiles\n";

        let table = parse_csv(text, "test").unwrap();

        assert_eq!(
            table.columns(),
            &["order_id", "price", "qty_ordered", "category"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].get(1), &Value::Float(1500.5));
        assert_eq!(table.rows()[1].get(1), &Value::Absent);
        assert_eq!(table.rows()[1].get(3), &Value::Text("Mobiles".to_string()));
    }

    #[test]
    fn test_parse_csv_strips_bom_and_pads_short_records() {
        let text = "\u{FEFF}a,b,c\n1\n1,2,3,4\n";

        let table = parse_csv(text, "test").unwrap();

        assert_eq!(table.columns()[0], "a");
        assert_eq!(table.rows()[0].get(1), &Value::Absent);
        assert_eq!(table.rows()[1].get(2), &Value::Integer(3));
    }

    #[test]
    fn test_parse_csv_header_only_is_empty_table() {
        let table = parse_csv("order_id,price\n", "test").unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(table.has_column("price"));
    }

    #[test]
    fn test_parse_csv_empty_text_fails() {
        let err = parse_csv("  \n", "sheet").unwrap_err();
        assert!(matches!(err, LoadError::EmptySource(ref origin) if origin == "sheet"));
    }

    #[test]
    fn test_load_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "order_id,qty_ordered").unwrap();
        writeln!(file, "1,3").unwrap();

        let source = DataSource::File(file.path().to_path_buf());
        let table = tokio_test::block_on(load_source(&source, &LoaderOptions::default())).unwrap();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows()[0].get(1), &Value::Integer(3));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let source = DataSource::File(PathBuf::from("/definitely/not/here.csv"));
        let result = tokio_test::block_on(load_source(&source, &LoaderOptions::default()));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_source_identity() {
        let url = DataSource::Url("https://example.com/data.csv".to_string());
        assert_eq!(url.identity(), "https://example.com/data.csv");

        let file = DataSource::File(PathBuf::from("orders.csv"));
        assert_eq!(file.identity(), "file://orders.csv");
        assert_eq!(file.to_string(), "orders.csv");
    }
}
