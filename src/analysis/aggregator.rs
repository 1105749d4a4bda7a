//! Order aggregation and statistics.
//!
//! This module computes every KPI and panel of the dashboard from a
//! filtered view of the dataset. Each operation is gated on the columns it
//! needs and degrades to its fallback (or to `None`, meaning the panel is
//! omitted) when they are missing. Nothing here fails: absent cells are left
//! out of every reduction, and cells that cannot be read as a number or a
//! date are skipped for that aggregate only and logged.

use crate::analysis::filter::TableView;
use crate::analysis::schema::{Column, ColumnAvailability};
use crate::models::{
    CountRow, DistributionCount, Frequency, GroupedAggregate, GroupedRow, KpiSummary,
    StatusDistribution, StatusEntry, TimePoint, TimeSeries, TopCustomer, Value,
};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Avg Rating shown when the dataset carries no ratings.
pub const DEFAULT_RATING: f64 = 4.7;

/// Default length of the ranked top-N tables.
pub const DEFAULT_TOP_N: usize = 10;

pub const REVENUE_COLUMNS: &[Column] = &[Column::Price, Column::QtyOrdered];
pub const TREND_COLUMNS: &[Column] = &[Column::OrderDate, Column::QtyOrdered];
pub const STATUS_COLUMNS: &[Column] = &[Column::IsGross, Column::IsValid, Column::IsNet];
pub const PAYMENT_COLUMNS: &[Column] = &[Column::PaymentMethod];
pub const CATEGORY_COLUMNS: &[Column] = &[Column::Category, Column::QtyOrdered];
pub const PRODUCT_COLUMNS: &[Column] = &[Column::SkuName, Column::QtyOrdered];
pub const CUSTOMER_COLUMNS: &[Column] = &[Column::CustomerId, Column::Price, Column::QtyOrdered];

/// Outcome of reading a typed value out of a cell.
enum Reading<T> {
    Present(T),
    Absent,
    Malformed,
}

fn read_number(value: &Value) -> Reading<f64> {
    if value.is_absent() {
        return Reading::Absent;
    }
    match value.as_f64() {
        Some(v) => Reading::Present(v),
        None => Reading::Malformed,
    }
}

fn read_date(value: &Value) -> Reading<NaiveDate> {
    if value.is_absent() {
        return Reading::Absent;
    }
    match value.as_date() {
        Some(d) => Reading::Present(d),
        None => Reading::Malformed,
    }
}

/// Counts unreadable cells for one aggregate and logs them once.
struct SkipCounter {
    aggregate: &'static str,
    skipped: usize,
}

impl SkipCounter {
    fn new(aggregate: &'static str) -> Self {
        Self {
            aggregate,
            skipped: 0,
        }
    }

    /// Unwraps a reading, counting malformed cells.
    fn take<T>(&mut self, reading: Reading<T>) -> Option<T> {
        match reading {
            Reading::Present(v) => Some(v),
            Reading::Absent => None,
            Reading::Malformed => {
                self.skipped += 1;
                None
            }
        }
    }

    fn finish(self) {
        if self.skipped > 0 {
            warn!(
                "{}: skipped {} malformed values",
                self.aggregate, self.skipped
            );
        }
    }
}

/// Group accumulator that keeps groups in first-seen order.
struct Groups<T> {
    index: HashMap<String, usize>,
    entries: Vec<(String, T)>,
}

impl<T: Default> Groups<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: String) -> &mut T {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, T::default()));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    fn into_entries(self) -> Vec<(String, T)> {
        self.entries
    }
}

/// Stable sort, largest first. Equal values keep their first-seen order.
fn sort_descending<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn distinct_count(view: &TableView<'_>, column: Column) -> usize {
    view.values(column)
        .filter_map(Value::group_key)
        .collect::<HashSet<_>>()
        .len()
}

/// Sum `value` per distinct `key`, groups in first-seen order.
fn sum_by(
    view: &TableView<'_>,
    key: Column,
    value: Column,
    aggregate: &'static str,
) -> Vec<GroupedRow> {
    let (Some(key_idx), Some(value_idx)) = (view.index_of(key), view.index_of(value)) else {
        return Vec::new();
    };

    let mut groups: Groups<f64> = Groups::new();
    let mut skips = SkipCounter::new(aggregate);

    for row in view.rows() {
        let Some(group) = row.get(key_idx).group_key() else {
            continue;
        };
        let total = groups.entry(group);
        if let Some(v) = skips.take(read_number(row.get(value_idx))) {
            *total += v;
        }
    }
    skips.finish();

    groups
        .into_entries()
        .into_iter()
        .map(|(key, value)| GroupedRow { key, value })
        .collect()
}

/// Total Orders: distinct `order_id`, or the row count without that column.
pub fn total_orders(view: &TableView<'_>, availability: &ColumnAvailability) -> usize {
    if availability.contains(Column::OrderId) {
        distinct_count(view, Column::OrderId)
    } else {
        view.len()
    }
}

/// Total Revenue: sum of `price × qty_ordered`, or 0 without those columns.
pub fn total_revenue(view: &TableView<'_>, availability: &ColumnAvailability) -> f64 {
    if !availability.contains_all(REVENUE_COLUMNS) {
        return 0.0;
    }
    let (Some(price_idx), Some(qty_idx)) = (
        view.index_of(Column::Price),
        view.index_of(Column::QtyOrdered),
    ) else {
        return 0.0;
    };

    let mut skips = SkipCounter::new("Total Revenue");
    let mut total = 0.0;
    for row in view.rows() {
        let price = skips.take(read_number(row.get(price_idx)));
        let qty = skips.take(read_number(row.get(qty_idx)));
        if let (Some(price), Some(qty)) = (price, qty) {
            total += price * qty;
        }
    }
    skips.finish();

    total
}

/// Active Customers: distinct `customer_id`, or 0 without that column.
pub fn active_customers(view: &TableView<'_>, availability: &ColumnAvailability) -> usize {
    if availability.contains(Column::CustomerId) {
        distinct_count(view, Column::CustomerId)
    } else {
        0
    }
}

/// Avg Rating rounded to two decimals, or `fallback` when there is nothing to average.
pub fn avg_rating(view: &TableView<'_>, availability: &ColumnAvailability, fallback: f64) -> f64 {
    if !availability.contains(Column::Rating) {
        return fallback;
    }

    let mut skips = SkipCounter::new("Avg Rating");
    let ratings: Vec<f64> = view
        .values(Column::Rating)
        .filter_map(|v| skips.take(read_number(v)))
        .collect();
    skips.finish();

    if ratings.is_empty() {
        debug!("No ratings to average, using fallback {}", fallback);
        return fallback;
    }

    round2(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// All four scalar KPIs.
pub fn kpi_summary(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
    rating_fallback: f64,
) -> KpiSummary {
    KpiSummary {
        total_orders: total_orders(view, availability),
        total_revenue: total_revenue(view, availability),
        active_customers: active_customers(view, availability),
        avg_rating: avg_rating(view, availability, rating_fallback),
    }
}

/// Revenue Trend: `qty_ordered` summed per date bucket, oldest first.
pub fn revenue_trend(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
    frequency: Frequency,
) -> Option<TimeSeries> {
    if !availability.contains_all(TREND_COLUMNS) {
        return None;
    }
    let date_idx = view.index_of(Column::OrderDate)?;
    let qty_idx = view.index_of(Column::QtyOrdered)?;

    let mut date_skips = SkipCounter::new("Revenue Trend (order_date)");
    let mut qty_skips = SkipCounter::new("Revenue Trend (qty_ordered)");
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for row in view.rows() {
        let Some(date) = date_skips.take(read_date(row.get(date_idx))) else {
            continue;
        };
        let total = buckets.entry(frequency.bucket(date)).or_default();
        if let Some(qty) = qty_skips.take(read_number(row.get(qty_idx))) {
            *total += qty;
        }
    }
    date_skips.finish();
    qty_skips.finish();

    Some(TimeSeries {
        date_field: Column::OrderDate.name().to_string(),
        value_field: Column::QtyOrdered.name().to_string(),
        frequency,
        points: buckets
            .into_iter()
            .map(|(date, value)| TimePoint { date, value })
            .collect(),
    })
}

/// Order Status Distribution: the three flag columns melted to long form.
///
/// Entries are column-major: every `is_gross` value, then `is_valid`, then
/// `is_net`, giving three entries per row.
pub fn order_status(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
) -> Option<StatusDistribution> {
    if !availability.contains_all(STATUS_COLUMNS) {
        return None;
    }

    let mut entries = Vec::with_capacity(view.len() * STATUS_COLUMNS.len());
    for column in STATUS_COLUMNS {
        entries.extend(view.values(*column).map(|value| StatusEntry {
            status_type: column.name().to_string(),
            status: value.clone(),
        }));
    }

    let mut groups: Groups<usize> = Groups::new();
    for entry in &entries {
        *groups.entry(entry.status_type.clone()) += 1;
    }

    Some(StatusDistribution {
        entries,
        counts: DistributionCount {
            field: "Status_Tipe".to_string(),
            count_field: "count".to_string(),
            rows: counted_rows(groups),
        },
    })
}

fn counted_rows(groups: Groups<usize>) -> Vec<CountRow> {
    let mut rows: Vec<CountRow> = groups
        .into_entries()
        .into_iter()
        .map(|(value, count)| CountRow { value, count })
        .collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row.count));
    rows
}

/// Payment Method Breakdown: occurrences of each payment method, most frequent first.
pub fn payment_methods(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
) -> Option<DistributionCount> {
    if !availability.contains_all(PAYMENT_COLUMNS) {
        return None;
    }

    let mut groups: Groups<usize> = Groups::new();
    for key in view.values(Column::PaymentMethod).filter_map(Value::group_key) {
        *groups.entry(key) += 1;
    }

    Some(DistributionCount {
        field: Column::PaymentMethod.name().to_string(),
        count_field: "count".to_string(),
        rows: counted_rows(groups),
    })
}

/// Category Performance: `qty_ordered` summed per category, largest first.
pub fn category_performance(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
) -> Option<GroupedAggregate> {
    if !availability.contains_all(CATEGORY_COLUMNS) {
        return None;
    }

    let mut rows = sum_by(
        view,
        Column::Category,
        Column::QtyOrdered,
        "Category Performance",
    );
    sort_descending(&mut rows, |r| r.value);

    Some(GroupedAggregate {
        key_field: Column::Category.name().to_string(),
        value_field: Column::QtyOrdered.name().to_string(),
        rows,
    })
}

/// Top Products: `qty_ordered` summed per SKU, largest first, at most `n` rows.
pub fn top_products(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
    n: usize,
) -> Option<GroupedAggregate> {
    if !availability.contains_all(PRODUCT_COLUMNS) {
        return None;
    }

    let mut rows = sum_by(view, Column::SkuName, Column::QtyOrdered, "Top Products");
    sort_descending(&mut rows, |r| r.value);
    rows.truncate(n);

    Some(GroupedAggregate {
        key_field: Column::SkuName.name().to_string(),
        value_field: Column::QtyOrdered.name().to_string(),
        rows,
    })
}

#[derive(Debug, Default)]
struct CustomerTotals {
    price: f64,
    qty: f64,
    revenue: f64,
}

/// Top Customers: price, quantity and derived revenue summed per customer,
/// ranked by revenue, at most `n` rows.
///
/// Revenue is computed per row from `price × qty_ordered` without adding a
/// column to the table.
pub fn top_customers(
    view: &TableView<'_>,
    availability: &ColumnAvailability,
    n: usize,
) -> Option<Vec<TopCustomer>> {
    if !availability.contains_all(CUSTOMER_COLUMNS) {
        return None;
    }
    let customer_idx = view.index_of(Column::CustomerId)?;
    let price_idx = view.index_of(Column::Price)?;
    let qty_idx = view.index_of(Column::QtyOrdered)?;

    let mut groups: Groups<CustomerTotals> = Groups::new();
    let mut skips = SkipCounter::new("Top Customers");

    for row in view.rows() {
        let Some(customer) = row.get(customer_idx).group_key() else {
            continue;
        };
        let totals = groups.entry(customer);
        let price = skips.take(read_number(row.get(price_idx)));
        let qty = skips.take(read_number(row.get(qty_idx)));

        if let Some(price) = price {
            totals.price += price;
        }
        if let Some(qty) = qty {
            totals.qty += qty;
        }
        if let (Some(price), Some(qty)) = (price, qty) {
            totals.revenue += price * qty;
        }
    }
    skips.finish();

    let mut ranked = groups.into_entries();
    sort_descending(&mut ranked, |(_, totals)| totals.revenue);
    ranked.truncate(n);

    Some(
        ranked
            .into_iter()
            .map(|(customer_id, totals)| TopCustomer {
                customer_id,
                total_price: totals.price,
                total_qty: totals.qty,
                total_revenue: totals.revenue,
            })
            .collect(),
    )
}
