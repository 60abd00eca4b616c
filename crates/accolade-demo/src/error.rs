//! Error types for the demo binary.
//!
//! [`DemoError`] wraps every failure mode during startup and the scripted
//! run so `main` can propagate with `?`.

/// Top-level error for the demo binary.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: accolade_engine::ConfigError,
    },

    /// An achievement definition was rejected.
    #[error("definition error: {source}")]
    Definition {
        /// The underlying validation error.
        #[from]
        source: accolade_types::DefinitionError,
    },

    /// An engine operation failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: accolade_engine::EngineError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying data layer error.
        #[from]
        source: accolade_db::DbError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
