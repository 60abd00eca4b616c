//! Shared type definitions for the Accolade achievement engine.
//!
//! This crate is the single source of truth for the definition model:
//! what an achievement is, how it is displayed, and which visibility rule
//! decides whether a subject may see it. It also defines the sync message
//! shape handed to transports. It has no behavior beyond small query
//! methods; evaluation and persistence live in `accolade-engine`.
//!
//! # Modules
//!
//! - [`ids`] -- Namespaced [`AchievementId`] and UUID-backed [`SubjectId`]
//! - [`display`] -- Client layout and presentation metadata
//! - [`visibility`] -- The closed set of visibility predicates
//! - [`achievement`] -- The immutable [`Achievement`] definition and its builder
//! - [`progress`] -- Progress maps and the clamping law
//! - [`sync`] -- Compiled synchronization messages
//! - [`error`] -- Definition validation errors

pub mod achievement;
pub mod display;
pub mod error;
pub mod ids;
pub mod progress;
pub mod sync;
pub mod visibility;

// Re-export all public types at crate root for convenience.
pub use achievement::{Achievement, AchievementBuilder, criterion_label};
pub use display::{Display, Frame};
pub use error::DefinitionError;
pub use ids::{AchievementId, SubjectId};
pub use progress::{ProgressMap, clamp_progress};
pub use sync::{AchievementUpdate, CriteriaProgress, SyncMessage};
pub use visibility::Visibility;
