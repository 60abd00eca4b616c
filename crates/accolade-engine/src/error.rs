//! Error types for the achievement engine.
//!
//! Store and sink errors are defined here rather than next to their traits
//! so that out-of-crate implementations (the `PostgreSQL` store) only need
//! to depend on this module's types. [`EngineError`] wraps all of them.

use accolade_types::DefinitionError;

/// Boxed error produced by a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by a [`ProgressStore`](crate::store::ProgressStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed to complete an operation.
    #[error("progress store {operation} failed: {source}")]
    Backend {
        /// The operation that failed (`read` or `write`).
        operation: &'static str,
        /// The underlying backend error.
        #[source]
        source: BoxError,
    },

    /// The backend returned a record the engine cannot interpret.
    #[error("invalid progress record: {message}")]
    InvalidRecord {
        /// What was wrong with the record.
        message: String,
    },
}

impl StoreError {
    /// Wrap a backend error raised by a read.
    pub fn read(source: impl Into<BoxError>) -> Self {
        Self::Backend {
            operation: "read",
            source: source.into(),
        }
    }

    /// Wrap a backend error raised by a write.
    pub fn write(source: impl Into<BoxError>) -> Self {
        Self::Backend {
            operation: "write",
            source: source.into(),
        }
    }
}

/// Errors returned by a [`SyncSink`](crate::sink::SyncSink).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The transport failed to deliver the message.
    #[error("sync transport failed: {message}")]
    Transport {
        /// Transport-specific failure description.
        message: String,
    },
}

/// Errors that can occur while running engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Reading or writing progress failed. Nothing was emitted.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// Progress was persisted but the sync message could not be delivered.
    #[error("sink error: {source}")]
    Sink {
        /// The underlying sink error.
        #[from]
        source: SinkError,
    },

    /// A definition was rejected at registration.
    #[error("definition error: {source}")]
    Definition {
        /// The underlying validation error.
        #[from]
        source: DefinitionError,
    },
}
