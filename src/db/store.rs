use async_trait::async_trait;
use thiserror::Error;

use super::filter::{Filter, Select};
use super::record::Record;
use crate::core::error::SafeDeleteError;
use crate::schema::ModelMeta;


#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Integrity error: {0}")]
    Integrity(String),
    #[error("No such table: {0}")]
    UnknownTable(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for SafeDeleteError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Integrity(msg) => SafeDeleteError::Integrity(msg),
            other => SafeDeleteError::Store(other.to_string()),
        }
    }
}


/// Persistence boundary. Everything above it works on [`Record`]s and [`Filter`]s;
/// soft delete visibility is never pushed down into the store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Declares a table and its constraints. Calling it again for an existing table keeps its rows.
    async fn create_table(&self, meta: &ModelMeta) -> Result<(), StoreError>;

    async fn select(&self, table: &str, select: &Select) -> Result<Vec<Record>, StoreError>;

    async fn count(&self, table: &str, filter: &Filter) -> Result<usize, StoreError> {
        Ok(self.select(table, &Select::new(filter.clone())).await?.len())
    }

    /// Inserts a row, assigning the primary key when it is missing. Returns the stored row.
    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError>;

    /// Merges `values` into every row matching `filter`. Returns the number of rows touched.
    async fn update(&self, table: &str, filter: &Filter, values: &Record) -> Result<usize, StoreError>;

    /// Physically removes every row matching `filter`.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<usize, StoreError>;
}
