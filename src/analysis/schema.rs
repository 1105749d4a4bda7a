//! Schema probing.
//!
//! Inspects the table header once per load and records which of the
//! expected order columns are present. Every aggregation is gated on
//! this set instead of checking column names ad hoc.

use crate::models::Table;
use std::collections::BTreeSet;
use std::fmt;

/// Columns the dashboard knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    OrderId,
    OrderDate,
    CustomerId,
    Price,
    QtyOrdered,
    Rating,
    Category,
    SkuName,
    PaymentMethod,
    IsGross,
    IsValid,
    IsNet,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::OrderId,
        Column::OrderDate,
        Column::CustomerId,
        Column::Price,
        Column::QtyOrdered,
        Column::Rating,
        Column::Category,
        Column::SkuName,
        Column::PaymentMethod,
        Column::IsGross,
        Column::IsValid,
        Column::IsNet,
    ];

    /// Header name of the column in the dataset.
    pub fn name(&self) -> &'static str {
        match self {
            Column::OrderId => "order_id",
            Column::OrderDate => "order_date",
            Column::CustomerId => "customer_id",
            Column::Price => "price",
            Column::QtyOrdered => "qty_ordered",
            Column::Rating => "rating",
            Column::Category => "category",
            Column::SkuName => "sku_name",
            Column::PaymentMethod => "payment_method",
            Column::IsGross => "is_gross",
            Column::IsValid => "is_valid",
            Column::IsNet => "is_net",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The set of expected columns present in the loaded table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAvailability {
    present: BTreeSet<Column>,
}

impl ColumnAvailability {
    pub fn contains(&self, column: Column) -> bool {
        self.present.contains(&column)
    }

    /// True when every required column is present.
    pub fn contains_all(&self, required: &[Column]) -> bool {
        required.iter().all(|c| self.present.contains(c))
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.present.len()
    }

    /// Present columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Column> + '_ {
        self.present.iter().copied()
    }

    /// Header names of the present columns.
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|c| c.name().to_string()).collect()
    }
}

impl FromIterator<Column> for ColumnAvailability {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self {
            present: iter.into_iter().collect(),
        }
    }
}

/// Determine which expected columns the table exposes.
///
/// Only the header is inspected, so this never fails and does not depend
/// on the number of rows.
pub fn probe(table: &Table) -> ColumnAvailability {
    Column::ALL
        .iter()
        .copied()
        .filter(|c| table.has_column(c.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn test_probe_finds_present_columns() {
        let table = Table::from_records(
            &["order_id", "price", "unrelated"],
            vec![vec![Value::from("A"), Value::Integer(10), Value::Absent]],
        );

        let availability = probe(&table);

        assert!(availability.contains(Column::OrderId));
        assert!(availability.contains(Column::Price));
        assert!(!availability.contains(Column::QtyOrdered));
        assert_eq!(availability.len(), 2);
        assert_eq!(availability.names(), vec!["order_id", "price"]);
    }

    #[test]
    fn test_probe_empty_header() {
        let availability = probe(&Table::default());
        assert!(availability.is_empty());
        assert!(availability.contains_all(&[]));
    }

    #[test]
    fn test_contains_all_requires_every_column() {
        let table = Table::from_records(&["price", "qty_ordered"], Vec::new());
        let availability = probe(&table);

        assert!(availability.contains_all(&[Column::Price, Column::QtyOrdered]));
        assert!(!availability.contains_all(&[Column::Price, Column::CustomerId]));
    }

    #[test]
    fn test_probe_is_case_sensitive() {
        let table = Table::from_records(&["Order_ID"], Vec::new());
        assert!(!probe(&table).contains(Column::OrderId));
    }
}
