//! Definition validation errors.
//!
//! These are configuration errors: they surface when an achievement is
//! built or registered, never while progress is being updated.

use crate::ids::AchievementId;

/// Errors raised while building or registering achievement definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// An id string is not a valid `namespace:path` key.
    #[error("invalid achievement id `{id}`: {reason}")]
    InvalidId {
        /// The rejected input.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The requirement must be at least one step.
    #[error("achievement {id} has a requirement of zero")]
    ZeroRequirement {
        /// The offending achievement.
        id: AchievementId,
    },

    /// Another definition already uses this id.
    #[error("achievement {0} is already registered")]
    DuplicateId(AchievementId),

    /// The parent is not part of the definition set.
    #[error("achievement {id} references unknown parent {parent}")]
    UnknownParent {
        /// The child definition.
        id: AchievementId,
        /// The missing parent id.
        parent: AchievementId,
    },

    /// Following parent links from this achievement leads back to it.
    #[error("achievement {id} is part of a parent cycle")]
    ParentCycle {
        /// An achievement on the cycle.
        id: AchievementId,
    },
}
