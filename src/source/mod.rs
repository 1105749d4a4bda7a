//! Dataset source handling.
//!
//! Loading the order export and memoizing it between render passes.

pub mod cache;
pub mod loader;

pub use cache::DatasetCache;
pub use loader::{DataSource, LoaderOptions, DEFAULT_SOURCE_URL};
