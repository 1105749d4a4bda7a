//! Analysis modules.
//!
//! Schema probing, row filtering, the aggregation engine and the
//! per-page dashboard assembly built on top of them.

pub mod aggregator;
pub mod dashboard;
pub mod filter;
pub mod schema;

pub use dashboard::{build_dashboard, DashboardSettings};
pub use filter::{category_options, CategoryFilter, DateRange, Filters, TableView};
pub use schema::{probe, Column};
