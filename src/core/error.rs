use thiserror::Error;


#[derive(Error, Debug)]
pub enum SafeDeleteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delete policy violation: {table} records cannot be deleted ({policy})")]
    PolicyViolation { table: String, policy: String },

    #[error("Validation error: {table} with this {field} already exists ({value})")]
    Validation {
        table: String,
        field: String,
        value: String,
    },

    #[error("{table} matching query does not exist: {lookup}")]
    NotFound { table: String, lookup: String },

    #[error("get() returned more than one {table}: {count} rows")]
    MultipleObjectsReturned { table: String, count: usize },

    #[error("{table} {pk} is not deleted")]
    NotDeleted { table: String, pk: String },

    #[error("Cannot delete {table} {pk}: referenced through protected foreign key {referenced_by}")]
    Protected {
        table: String,
        pk: String,
        referenced_by: String,
    },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Record of {0} has no primary key")]
    MissingPrimaryKey(String),

    #[error("Expected a record object, got: {0}")]
    NotARecord(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for SafeDeleteError {
    fn from(e: config::ConfigError) -> Self {
        SafeDeleteError::Config(e.to_string())
    }
}


pub type Result<T> = std::result::Result<T, SafeDeleteError>;
