//! Top-level configuration for a [`crate::manager::StockManager`].

use std::path::PathBuf;

use crate::consolidation::ConsolidationOptions;
use crate::report::ReportOptions;

/// Default SQLite database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "stocks.sqlite";

/// Default quantity below which a record is reported as critical.
pub const DEFAULT_CRITICAL_THRESHOLD: i64 = 10;

/// Settings shared by the orchestrator and the CLI. Use [`Default`] for the standard setup.
#[derive(Debug, Clone)]
pub struct StockConfig {
    /// Database file opened by [`crate::manager::StockManager::open`].
    pub database_path: PathBuf,
    /// Threshold used when a critical-stock report does not name one.
    pub critical_threshold: i64,
    pub consolidation: ConsolidationOptions,
    pub report: ReportOptions,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            consolidation: ConsolidationOptions::default(),
            report: ReportOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StockConfig;
    use crate::report::{CategoryOrder, DEFAULT_TOTAL_LABEL};

    #[test]
    fn defaults() {
        let config = StockConfig::default();
        assert_eq!(config.database_path.to_str(), Some("stocks.sqlite"));
        assert_eq!(config.critical_threshold, 10);
        assert!(!config.consolidation.parallel);
        assert_eq!(config.report.total_label, DEFAULT_TOTAL_LABEL);
        assert_eq!(config.report.category_order, CategoryOrder::Alphabetical);
    }
}
