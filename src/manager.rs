//! High-level orchestration: consolidation, persistence, search and reporting behind one handle.

use std::fmt;
use std::path::Path;

use tracing::info;

use crate::config::StockConfig;
use crate::consolidation::{Consolidation, Consolidator};
use crate::error::{StockError, StockResult};
use crate::report::{ExportFormat, ReportEngine};
use crate::search::{QueryEngine, SearchQuery};
use crate::store::{QueryCriteria, SqliteStore, TableStore};
use crate::types::DataSet;

/// Which report [`StockManager::generate_report`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Per-category totals plus a grand-total row.
    Summary,
    /// Records with `quantity < threshold`.
    Critical { threshold: i64 },
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => f.write_str("summary"),
            Self::Critical { threshold } => write!(f, "critical (threshold {threshold})"),
        }
    }
}

/// Owns a [`TableStore`] and the most recently consolidated dataset.
///
/// The consolidated dataset is the source of free-text searches and reports; store queries go to
/// the store.
pub struct StockManager<S: TableStore> {
    store: S,
    config: StockConfig,
    consolidator: Consolidator,
    query: QueryEngine,
    current: Option<DataSet>,
}

impl StockManager<SqliteStore> {
    /// Open the SQLite database at [`StockConfig::database_path`].
    pub fn open(config: StockConfig) -> StockResult<Self> {
        let store = SqliteStore::open(&config.database_path)?;
        Ok(Self::new(store, config))
    }
}

impl<S: TableStore> StockManager<S> {
    pub fn new(store: S, config: StockConfig) -> Self {
        let consolidator = Consolidator::new(config.consolidation.clone());
        let query = QueryEngine::new(config.report.mapping.clone());
        Self {
            store,
            config,
            consolidator,
            query,
            current: None,
        }
    }

    /// Prepare the store for use.
    pub fn initialize(&self) -> StockResult<()> {
        self.store.ensure_schema()
    }

    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The dataset produced by the last successful [`Self::consolidate_directory`] or
    /// [`Self::load_report_source`].
    pub fn current(&self) -> Option<&DataSet> {
        self.current.as_ref()
    }

    /// Consolidate every CSV file in `dir`, append the result to the store and keep it as the
    /// current dataset.
    pub fn consolidate_directory(&mut self, dir: impl AsRef<Path>) -> StockResult<Consolidation> {
        let consolidation = self.consolidator.consolidate_directory(dir)?;
        let inserted = self.store.insert(&consolidation.dataset)?;
        info!(inserted, "stored consolidated records");
        self.current = Some(consolidation.dataset.clone());
        Ok(consolidation)
    }

    /// Consolidate `dir` and keep the result as the current dataset. The store is not touched.
    pub fn load_report_source(&mut self, dir: impl AsRef<Path>) -> StockResult<Consolidation> {
        let consolidation = self.consolidator.consolidate_directory(dir)?;
        self.current = Some(consolidation.dataset.clone());
        Ok(consolidation)
    }

    /// Merge the CSV file `incoming` into the CSV file `existing` on disk.
    pub fn import_file(
        &self,
        existing: impl AsRef<Path>,
        incoming: impl AsRef<Path>,
    ) -> StockResult<DataSet> {
        self.consolidator.import_file(existing, incoming)
    }

    /// Query the store.
    pub fn search(&self, criteria: &QueryCriteria) -> StockResult<DataSet> {
        self.store.query(criteria)
    }

    /// Free-text search over the current dataset.
    pub fn search_text(&self, query: &SearchQuery) -> StockResult<DataSet> {
        self.query.search(self.current_or_empty()?, query)
    }

    /// Build a report over the current dataset, write it to `path` and return it.
    pub fn generate_report(
        &self,
        kind: ReportKind,
        path: impl AsRef<Path>,
        format: ExportFormat,
    ) -> StockResult<DataSet> {
        let path = path.as_ref();
        let engine = ReportEngine::with_options(self.current_or_empty()?, self.config.report.clone())?;
        let report = match kind {
            ReportKind::Summary => engine.summary_report()?,
            ReportKind::Critical { threshold } => engine.critical_stock(threshold)?,
        };
        engine.export(&report, path, format)?;
        info!(%kind, path = %path.display(), %format, rows = report.row_count(), "generated report");
        Ok(report)
    }

    /// Close the store.
    pub fn close(mut self) -> StockResult<()> {
        self.store.close()
    }

    fn current_or_empty(&self) -> StockResult<&DataSet> {
        self.current.as_ref().ok_or(StockError::EmptyInput)
    }
}

impl<S: TableStore + fmt::Debug> fmt::Debug for StockManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StockManager")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("current_rows", &self.current.as_ref().map(DataSet::row_count))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportKind, StockManager};
    use crate::config::StockConfig;
    use crate::error::StockError;
    use crate::report::ExportFormat;
    use crate::search::SearchQuery;
    use crate::store::{QueryCriteria, SqliteStore};

    fn manager() -> StockManager<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        let manager = StockManager::new(store, StockConfig::default());
        manager.initialize().unwrap();
        manager
    }

    #[test]
    fn reports_and_text_search_need_a_consolidated_dataset() {
        let manager = manager();
        assert!(manager.current().is_none());
        let path = std::env::temp_dir().join("never_written_report.csv");
        assert!(matches!(
            manager.generate_report(ReportKind::Summary, &path, ExportFormat::Csv),
            Err(StockError::EmptyInput)
        ));
        assert!(matches!(
            manager.search_text(&SearchQuery::default()),
            Err(StockError::EmptyInput)
        ));
    }

    #[test]
    fn fresh_store_has_no_records() {
        let manager = manager();
        assert!(manager.search(&QueryCriteria::new()).unwrap().is_empty());
        manager.close().unwrap();
    }

    #[test]
    fn loading_a_report_source_leaves_the_store_alone() {
        let mut manager = manager();
        for _ in 0..2 {
            let loaded = manager.load_report_source("tests/fixtures/stock").unwrap();
            assert_eq!(loaded.dataset.row_count(), 3);
        }
        assert_eq!(manager.current().map(|d| d.row_count()), Some(3));
        assert!(manager.search(&QueryCriteria::new()).unwrap().is_empty());
    }

    #[test]
    fn report_kind_display() {
        assert_eq!(ReportKind::Summary.to_string(), "summary");
        assert_eq!(
            ReportKind::Critical { threshold: 5 }.to_string(),
            "critical (threshold 5)"
        );
    }
}
