//! Row filters applied before aggregation.
//!
//! Filters never touch the loaded table; they produce a `TableView` that
//! borrows the rows which pass every predicate.

use crate::analysis::schema::{Column, ColumnAvailability};
use crate::models::{Row, Table, Value};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Label of the "no category filter" selector entry.
pub const ALL_CATEGORIES: &str = "All";

/// Category selector state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Interpret a selector value; `None` or "All" disables the filter.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            None | Some("") => CategoryFilter::All,
            Some(s) if s.eq_ignore_ascii_case(ALL_CATEGORIES) => CategoryFilter::All,
            Some(s) => CategoryFilter::Only(s.to_string()),
        }
    }
}

/// Inclusive order-date window; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Returns `None` when neither bound is set.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_bound = |d: Option<NaiveDate>| d.map_or("…".to_string(), |d| d.to_string());
        write!(f, "{} to {}", fmt_bound(self.start), fmt_bound(self.end))
    }
}

/// All user-selected filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub category: CategoryFilter,
    pub period: Option<DateRange>,
}

impl Filters {
    /// Human-readable summary for report metadata.
    pub fn describe(&self) -> String {
        let category = match &self.category {
            CategoryFilter::All => ALL_CATEGORIES.to_string(),
            CategoryFilter::Only(c) => c.clone(),
        };
        match &self.period {
            Some(range) => format!("category: {}, period: {}", category, range),
            None => format!("category: {}, period: all", category),
        }
    }
}

/// The subset of table rows an aggregation pass works on.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    table: &'a Table,
    rows: Vec<&'a Row>,
}

impl<'a> TableView<'a> {
    /// View over every row of the table.
    pub fn all(table: &'a Table) -> Self {
        Self {
            table,
            rows: table.rows().iter().collect(),
        }
    }

    pub fn rows(&self) -> &[&'a Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of an expected column in the underlying table.
    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.table.column_index(column.name())
    }

    /// Values of one column across the view (absent when the column is missing).
    pub fn values(&self, column: Column) -> impl Iterator<Item = &'a Value> + '_ {
        let index = self.index_of(column);
        self.rows.iter().copied().map(move |row| match index {
            Some(i) => row.get(i),
            None => &ABSENT_CELL,
        })
    }

    fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

static ABSENT_CELL: Value = Value::Absent;

/// Apply the filters as row predicates.
///
/// A filter whose column is not in the dataset is skipped with a warning.
pub fn apply_filters<'a>(
    table: &'a Table,
    availability: &ColumnAvailability,
    filters: &Filters,
) -> TableView<'a> {
    let mut view = TableView::all(table);

    if let CategoryFilter::Only(selected) = &filters.category {
        match view.index_of(Column::Category) {
            Some(idx) if availability.contains(Column::Category) => {
                view.retain(|row| row.get(idx).group_key().as_deref() == Some(selected.as_str()));
                debug!("Category filter '{}' kept {} rows", selected, view.len());
            }
            _ => warn!(
                "Category filter '{}' ignored: dataset has no '{}' column",
                selected,
                Column::Category
            ),
        }
    }

    if let Some(range) = filters.period {
        match view.index_of(Column::OrderDate) {
            Some(idx) if availability.contains(Column::OrderDate) => {
                let mut unparseable = 0usize;
                view.retain(|row| match row.get(idx).as_date() {
                    Some(date) => range.contains(date),
                    None => {
                        unparseable += 1;
                        false
                    }
                });
                if unparseable > 0 {
                    warn!(
                        "Period filter dropped {} rows with missing or unparseable '{}'",
                        unparseable,
                        Column::OrderDate
                    );
                }
                debug!("Period filter {} kept {} rows", range, view.len());
            }
            _ => warn!(
                "Period filter ignored: dataset has no '{}' column",
                Column::OrderDate
            ),
        }
    }

    view
}

/// Entries for the category selector: "All" followed by distinct
/// categories in first-seen order.
pub fn category_options(view: &TableView<'_>, availability: &ColumnAvailability) -> Vec<String> {
    let mut options = vec![ALL_CATEGORIES.to_string()];
    if !availability.contains(Column::Category) {
        return options;
    }

    let mut seen = HashSet::new();
    for value in view.values(Column::Category) {
        if let Some(key) = value.group_key() {
            if seen.insert(key.clone()) {
                options.push(key);
            }
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::schema::probe;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> Table {
        Table::from_records(
            &["category", "order_date", "qty_ordered"],
            vec![
                vec!["Mobiles".into(), date(2021, 1, 1).into(), 1i64.into()],
                vec!["Beauty".into(), date(2021, 1, 5).into(), 2i64.into()],
                vec!["Mobiles".into(), date(2021, 2, 1).into(), 3i64.into()],
                vec![Value::Absent, Value::from("garbage"), 4i64.into()],
            ],
        )
    }

    #[test]
    fn test_no_filters_keeps_all_rows() {
        let table = sample_table();
        let view = apply_filters(&table, &probe(&table), &Filters::default());
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_category_filter_applies() {
        let table = sample_table();
        let filters = Filters {
            category: CategoryFilter::Only("Mobiles".to_string()),
            period: None,
        };

        let view = apply_filters(&table, &probe(&table), &filters);

        assert_eq!(view.len(), 2);
        assert!(view
            .values(Column::Category)
            .all(|v| v == &Value::from("Mobiles")));
    }

    #[test]
    fn test_period_filter_is_inclusive_and_drops_unparseable() {
        let table = sample_table();
        let filters = Filters {
            category: CategoryFilter::All,
            period: DateRange::new(Some(date(2021, 1, 1)), Some(date(2021, 1, 5))),
        };

        let view = apply_filters(&table, &probe(&table), &filters);

        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_filter_on_missing_column_is_ignored() {
        let table = Table::from_records(&["qty_ordered"], vec![vec![1i64.into()]]);
        let filters = Filters {
            category: CategoryFilter::Only("Mobiles".to_string()),
            period: DateRange::new(Some(date(2021, 1, 1)), None),
        };

        let view = apply_filters(&table, &probe(&table), &filters);

        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_category_from_selection() {
        assert_eq!(CategoryFilter::from_selection(None), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_selection(Some("all")),
            CategoryFilter::All
        );
        assert_eq!(
            CategoryFilter::from_selection(Some("Beauty")),
            CategoryFilter::Only("Beauty".to_string())
        );
    }

    #[test]
    fn test_category_options_first_seen_order() {
        let table = sample_table();
        let view = TableView::all(&table);

        let options = category_options(&view, &probe(&table));

        assert_eq!(options, vec!["All", "Mobiles", "Beauty"]);
    }

    #[test]
    fn test_date_range_open_bounds() {
        assert!(DateRange::new(None, None).is_none());
        let range = DateRange::new(None, Some(date(2021, 1, 31))).unwrap();
        assert!(range.contains(date(1999, 1, 1)));
        assert!(!range.contains(date(2021, 2, 1)));
    }

    #[test]
    fn test_filters_describe() {
        let filters = Filters {
            category: CategoryFilter::Only("Beauty".to_string()),
            period: DateRange::new(Some(date(2021, 1, 1)), None),
        };
        assert_eq!(
            filters.describe(),
            "category: Beauty, period: 2021-01-01 to …"
        );
    }
}
