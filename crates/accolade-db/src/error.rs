//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors. The [`ProgressStore`](accolade_engine::ProgressStore)
//! implementation boxes them into a
//! [`StoreError`](accolade_engine::StoreError) tagged with the operation,
//! except [`DbError::InvalidRecord`], which maps to its own variant.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to engine types.
    #[error("Invalid progress record: {0}")]
    InvalidRecord(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
