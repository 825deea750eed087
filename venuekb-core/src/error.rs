use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum VenueKbError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IPC error: {0}")]
    Ipc(String),
}

/// Knowledge store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Knowledge entry {0} not found")]
    NotFound(Uuid),

    #[error("Invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}
