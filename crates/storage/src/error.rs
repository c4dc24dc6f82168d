use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// True for failures of the database itself, as opposed to bad or
    /// missing data in an individual row.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            StorageError::Database(_) | StorageError::Migration(_)
        )
    }
}
