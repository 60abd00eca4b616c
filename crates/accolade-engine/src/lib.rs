//! Achievement progress engine for Accolade.
//!
//! Tracks per-subject progress toward a forest of achievement definitions,
//! applies updates transactionally, and compiles each committed change into
//! the minimal visibility-filtered message a client needs.
//!
//! # Modules
//!
//! - [`registry`] -- Definition arena with validated parent links
//! - [`visibility`] -- Evaluation of visibility rules against a snapshot
//! - [`store`] -- The [`ProgressStore`] contract and [`InMemoryStore`]
//! - [`transaction`] -- The clamped working copy mutated inside a transaction
//! - [`compiler`] -- Incremental and full-resync sync compilation
//! - [`sink`] -- The [`SyncSink`] contract and [`BroadcastSink`]
//! - [`engine`] -- [`AchievementEngine`], which ties them together
//! - [`config`] -- YAML configuration
//! - [`error`] -- Engine, store, and sink errors

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod sink;
pub mod store;
pub mod transaction;
pub mod visibility;

pub use compiler::{CompiledSync, SyncCompiler, SyncMode};
pub use config::{AccoladeConfig, ConfigError, StoreBackend, StoreConfig};
pub use engine::{AchievementEngine, UpdateOutcome};
pub use error::{BoxError, EngineError, SinkError, StoreError};
pub use registry::Registry;
pub use sink::{BroadcastSink, SyncSink};
pub use store::{InMemoryStore, ProgressStore};
pub use transaction::Transaction;
pub use visibility::VisibilityEvaluator;
