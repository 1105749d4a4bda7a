//! Memoized dataset loads.
//!
//! A table is loaded once per source identity and shared read-only between
//! render passes until the cache is cleared.

use crate::models::Table;
use crate::source::loader::{load_source, DataSource, LoadError, LoaderOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Loaded tables keyed by source identity.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<Table>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for a source, loading it on first use.
    ///
    /// Failed loads are not cached.
    pub async fn get_or_load(
        &mut self,
        source: &DataSource,
        options: &LoaderOptions,
    ) -> Result<Arc<Table>, LoadError> {
        let key = source.identity();

        if let Some(table) = self.entries.get(&key) {
            debug!("Dataset cache hit: {}", key);
            return Ok(Arc::clone(table));
        }

        debug!("Dataset cache miss: {}", key);
        let table = Arc::new(load_source(source, options).await?);
        self.entries.insert(key, Arc::clone(&table));

        Ok(table)
    }

    /// Drop every cached table.
    #[allow(dead_code)] // Explicit invalidation for long-lived sessions
    pub fn clear(&mut self) {
        debug!("Clearing {} cached datasets", self.entries.len());
        self.entries.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn quiet() -> LoaderOptions {
        LoaderOptions {
            show_progress: false,
            ..LoaderOptions::default()
        }
    }

    #[test]
    fn test_second_load_hits_cache() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "order_id\n1\n2").unwrap();
        let source = DataSource::File(file.path().to_path_buf());
        let mut cache = DatasetCache::new();

        let first = tokio_test::block_on(cache.get_or_load(&source, &quiet())).unwrap();
        let second = tokio_test::block_on(cache.get_or_load(&source, &quiet())).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.row_count(), 2);
    }

    #[test]
    fn test_cached_table_survives_source_removal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "order_id\n1").unwrap();
        let source = DataSource::File(file.path().to_path_buf());
        let mut cache = DatasetCache::new();

        tokio_test::block_on(cache.get_or_load(&source, &quiet())).unwrap();
        drop(file);

        let table = tokio_test::block_on(cache.get_or_load(&source, &quiet())).unwrap();
        assert_eq!(table.row_count(), 1);

        cache.clear();
        assert!(cache.is_empty());
        let reloaded = tokio_test::block_on(cache.get_or_load(&source, &quiet()));
        assert!(reloaded.is_err());
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let source = DataSource::File("/no/such/orders.csv".into());
        let mut cache = DatasetCache::new();

        let result = tokio_test::block_on(cache.get_or_load(&source, &quiet()));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
