pub mod admin;
pub mod core;
pub mod database;
pub mod db;
pub mod deletion;
pub mod query;
pub mod schema;


pub use admin::{ActionResponse, Column, DeletedFilter, SafeDeleteAdmin};
pub use crate::core::config::SafeDeleteConfig;
pub use crate::core::error::{Result, SafeDeleteError};
pub use database::Database;
pub use db::{Filter, MemoryStore, Record, Store, StoreError};
pub use deletion::{DeletePolicy, DeletionOutcome, DeletionResult, RestoreResult};
pub use query::{Manager, Prefetched, QuerySet, Visibility};
pub use schema::{ModelMeta, OnDelete};


pub const DEFAULT_DELETED_FIELD: &str = schema::DEFAULT_DELETED_FIELD;
