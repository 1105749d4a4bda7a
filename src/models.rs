//! Data models for the order dashboard.
//!
//! This module contains the in-memory dataset representation (`Table`,
//! `Row`, `Value`) and the plain data structures produced by the
//! aggregation engine and handed to the report generator.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Calendar-date formats recognised in date-valued cells.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Timestamp formats recognised in date-valued cells (time part is discarded).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a date or timestamp string, truncating to the calendar day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.date_naive())
}

/// A single cell of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing cell (empty string, `NaN`, `null`, ...).
    Absent,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

static ABSENT: Value = Value::Absent;

impl Value {
    /// Returns true when the cell carries no value.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Numeric reading of the cell. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Calendar-date reading of the cell.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Key used when grouping or counting distinct values.
    ///
    /// Absent cells have no key and are left out of every group.
    pub fn group_key(&self) -> Option<String> {
        if self.is_absent() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Absent => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

/// One record of the dataset, positionally aligned with the table header.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Value at a column position; out-of-range positions read as absent.
    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&ABSENT)
    }
}

/// The loaded dataset: an immutable, fully materialized table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table from a header and rows.
    ///
    /// Rows are padded with absent cells (or truncated) to the header width.
    /// When a column name repeats, lookups resolve to its first occurrence.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let mut index = HashMap::new();
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.values.resize(width, Value::Absent);
                row
            })
            .collect();

        Self {
            columns,
            index,
            rows,
        }
    }

    /// Convenience constructor used by tests and fixtures.
    #[allow(dead_code)] // Fixture helper
    pub fn from_records(columns: &[&str], records: Vec<Vec<Value>>) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            records.into_iter().map(Row::new).collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// Time bucket used by the revenue trend panel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One point per calendar day
    #[default]
    Daily,
    /// One point per ISO week (keyed by its Monday)
    Weekly,
    /// One point per calendar month (keyed by its first day)
    Monthly,
}

impl Frequency {
    /// Truncate a date to the start of its bucket.
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let offset = Duration::days(date.weekday().num_days_from_monday() as i64);
                date.checked_sub_signed(offset).unwrap_or(date)
            }
            Frequency::Monthly => {
                NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "Daily"),
            Frequency::Weekly => write!(f, "Weekly"),
            Frequency::Monthly => write!(f, "Monthly"),
        }
    }
}

/// Sidebar navigation entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum MenuItem {
    #[serde(rename = "Main Dashboard")]
    MainDashboard,
    #[serde(rename = "Product & Inventory")]
    ProductInventory,
    #[serde(rename = "Customer Analytics")]
    CustomerAnalytics,
    #[serde(rename = "Sales & Revenue")]
    SalesRevenue,
    #[serde(rename = "Payment Analytics")]
    PaymentAnalytics,
}

impl MenuItem {
    #[allow(dead_code)] // Sidebar listing
    pub const ALL: [MenuItem; 5] = [
        MenuItem::MainDashboard,
        MenuItem::ProductInventory,
        MenuItem::CustomerAnalytics,
        MenuItem::SalesRevenue,
        MenuItem::PaymentAnalytics,
    ];

    /// Returns an emoji shown next to the page title.
    pub fn emoji(&self) -> &'static str {
        match self {
            MenuItem::MainDashboard => "📈",
            MenuItem::ProductInventory => "📦",
            MenuItem::CustomerAnalytics => "👥",
            MenuItem::SalesRevenue => "💰",
            MenuItem::PaymentAnalytics => "💳",
        }
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::MainDashboard => write!(f, "Main Dashboard"),
            MenuItem::ProductInventory => write!(f, "Product & Inventory"),
            MenuItem::CustomerAnalytics => write!(f, "Customer Analytics"),
            MenuItem::SalesRevenue => write!(f, "Sales & Revenue"),
            MenuItem::PaymentAnalytics => write!(f, "Payment Analytics"),
        }
    }
}

/// Raw scalar KPIs before display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub active_customers: usize,
    pub avg_rating: f64,
}

/// Delta strings shown under each KPI card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDeltas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_orders: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_customers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<String>,
}

impl Default for KpiDeltas {
    fn default() -> Self {
        Self {
            total_orders: Some("+12.5%".to_string()),
            total_revenue: Some("+8.3%".to_string()),
            active_customers: Some("+15.2%".to_string()),
            avg_rating: Some("+0.3%".to_string()),
        }
    }
}

/// A KPI card: label, formatted value and optional delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

/// One group of a `GroupedAggregate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub key: String,
    pub value: f64,
}

/// Rows partitioned by a categorical key and reduced by sum, sorted descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedAggregate {
    pub key_field: String,
    pub value_field: String,
    pub rows: Vec<GroupedRow>,
}

/// One point of a `TimeSeries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Rows partitioned by date bucket and reduced by sum, sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub date_field: String,
    pub value_field: String,
    pub frequency: Frequency,
    pub points: Vec<TimePoint>,
}

/// Occurrences of one distinct categorical value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub value: String,
    pub count: usize,
}

/// Frequency count of each distinct value of a column, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionCount {
    pub field: String,
    pub count_field: String,
    pub rows: Vec<CountRow>,
}

/// One entry of the long-form order status series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    #[serde(rename = "Status_Tipe")]
    pub status_type: String,
    #[serde(rename = "Status")]
    pub status: Value,
}

/// Order status flags reshaped to long form, plus the per-label counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDistribution {
    pub entries: Vec<StatusEntry>,
    pub counts: DistributionCount,
}

/// A ranked customer, with display labels as field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomer {
    #[serde(rename = "ID Customer")]
    pub customer_id: String,
    #[serde(rename = "Total Harga (Rp)")]
    pub total_price: f64,
    #[serde(rename = "Total Qty")]
    pub total_qty: f64,
    #[serde(rename = "Total Revenue (Rp)")]
    pub total_revenue: f64,
}

impl TopCustomer {
    /// Column headings, in field order.
    pub const HEADERS: [&'static str; 4] = [
        "ID Customer",
        "Total Harga (Rp)",
        "Total Qty",
        "Total Revenue (Rp)",
    ];
}

/// A renderable dashboard panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", content = "data", rename_all = "snake_case")]
pub enum Panel {
    RevenueTrend(TimeSeries),
    OrderStatus(StatusDistribution),
    PaymentMethods(DistributionCount),
    CategoryPerformance(GroupedAggregate),
    TopProducts(GroupedAggregate),
    TopCustomers(Vec<TopCustomer>),
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::RevenueTrend(_) => "Revenue Trend",
            Panel::OrderStatus(_) => "Order Status Distribution",
            Panel::PaymentMethods(_) => "Payment Method Breakdown",
            Panel::CategoryPerformance(_) => "Category Performance",
            Panel::TopProducts(_) => "Top Products",
            Panel::TopCustomers(_) => "Top Customers",
        }
    }

    /// Returns an emoji shown next to the panel heading.
    pub fn emoji(&self) -> &'static str {
        match self {
            Panel::RevenueTrend(_) => "📊",
            Panel::OrderStatus(_) => "📦",
            Panel::PaymentMethods(_) => "💳",
            Panel::CategoryPerformance(_) => "🏷️",
            Panel::TopProducts(_) => "🔥",
            Panel::TopCustomers(_) => "👑",
        }
    }

    /// Number of records the panel hands to the renderer.
    pub fn len(&self) -> usize {
        match self {
            Panel::RevenueTrend(series) => series.points.len(),
            Panel::OrderStatus(status) => status.entries.len(),
            Panel::PaymentMethods(dist) => dist.rows.len(),
            Panel::CategoryPerformance(agg) | Panel::TopProducts(agg) => agg.rows.len(),
            Panel::TopCustomers(rows) => rows.len(),
        }
    }
}

/// Everything rendered for one menu selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub menu: MenuItem,
    /// Rows remaining after filters were applied.
    pub rows_analyzed: usize,
    /// Expected columns present in the dataset.
    pub available_columns: Vec<String>,
    /// Entries for the category selector ("All" first).
    pub category_options: Vec<String>,
    pub kpis: Vec<Kpi>,
    pub panels: Vec<Panel>,
    /// Shown instead of panels for pages that are not implemented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Identity of the dataset source (URL or path).
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub rows_loaded: usize,
    /// Human-readable description of the active filters.
    pub filters: String,
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2021-11-19"), Some(date(2021, 11, 19)));
        assert_eq!(parse_date("11/19/2021"), Some(date(2021, 11, 19)));
        assert_eq!(parse_date("2021-11-19 13:45:00"), Some(date(2021, 11, 19)));
        assert_eq!(parse_date("2021-11-19T23:59:59"), Some(date(2021, 11, 19)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_value_readings() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Boolean(true).as_f64(), Some(1.0));
        assert_eq!(Value::from("2.5").as_f64(), Some(2.5));
        assert_eq!(Value::from("abc").as_f64(), None);
        assert_eq!(Value::Absent.as_f64(), None);
        assert_eq!(Value::from("2021-01-02").as_date(), Some(date(2021, 1, 2)));
        assert_eq!(Value::Absent.group_key(), None);
        assert_eq!(Value::Integer(42).group_key(), Some("42".to_string()));
    }

    #[test]
    fn test_table_pads_short_rows() {
        let table = Table::from_records(
            &["a", "b", "c"],
            vec![vec![Value::Integer(1)], vec![1i64.into(), 2i64.into(), 3i64.into()]],
        );

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].get(2), &Value::Absent);
        assert_eq!(table.rows()[1].get(2), &Value::Integer(3));
        assert_eq!(table.rows()[1].get(99), &Value::Absent);
        assert_eq!(table.column_index("b"), Some(1));
        assert!(!table.has_column("z"));
    }

    #[test]
    fn test_duplicate_column_resolves_to_first() {
        let table = Table::from_records(
            &["x", "x"],
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        assert_eq!(table.column_index("x"), Some(0));
    }

    #[test]
    fn test_frequency_bucket() {
        // 2021-11-19 is a Friday
        let friday = date(2021, 11, 19);
        assert_eq!(Frequency::Daily.bucket(friday), friday);
        assert_eq!(Frequency::Weekly.bucket(friday), date(2021, 11, 15));
        assert_eq!(Frequency::Monthly.bucket(friday), date(2021, 11, 1));
    }

    #[test]
    fn test_weekly_bucket_at_earliest_date() {
        assert_eq!(Frequency::Weekly.bucket(NaiveDate::MIN), NaiveDate::MIN);
        assert_eq!(Frequency::Monthly.bucket(NaiveDate::MIN), NaiveDate::MIN);
    }

    #[test]
    fn test_menu_display() {
        assert_eq!(MenuItem::MainDashboard.to_string(), "Main Dashboard");
        assert_eq!(MenuItem::ProductInventory.to_string(), "Product & Inventory");
        assert_eq!(MenuItem::ALL.len(), 5);
    }

    #[test]
    fn test_top_customer_serializes_display_labels() {
        let row = TopCustomer {
            customer_id: "C1".to_string(),
            total_price: 20.0,
            total_qty: 4.0,
            total_revenue: 40.0,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"ID Customer\":\"C1\""));
        assert!(json.contains("\"Total Revenue (Rp)\":40.0"));
    }

    #[test]
    fn test_panel_serializes_adjacently_tagged() {
        let panel = Panel::TopCustomers(Vec::new());
        let json = serde_json::to_string(&panel).unwrap();
        assert_eq!(json, r#"{"panel":"top_customers","data":[]}"#);
    }
}
