pub mod sqlite;

use std::path::Path;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::models::ProductRecord;
use crate::utils::error::Result;

pub use sqlite::SqliteProductStore;

/// Where finished product records go.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductSink: Send + Sync {
    /// Store one record and return its id.
    async fn save(&self, record: &ProductRecord) -> Result<i64>;

    /// Write every stored record to a CSV file. Returns the number of rows.
    async fn export_csv(&self, path: &Path) -> Result<usize>;
}
