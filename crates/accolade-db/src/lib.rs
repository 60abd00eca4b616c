//! `PostgreSQL` persistence for the Accolade achievement engine.
//!
//! Provides [`PgProgressStore`], a [`ProgressStore`](accolade_engine::ProgressStore)
//! backed by the `achievement_progress` table, and the connection pool it
//! runs on.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool configuration and migrations
//! - [`progress_store`] -- The progress table reads and batched upserts
//! - [`error`] -- [`DbError`]

pub mod error;
pub mod postgres;
pub mod progress_store;

pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use progress_store::PgProgressStore;
