//! Synchronization messages handed to transports.
//!
//! A [`SyncMessage`] is the compiled, visibility-filtered view of one
//! subject's progress change. Raw step counts are converted into the
//! per-criterion shape clients expect: an achievement with requirement `n`
//! and progress `p` is sent as `n` criteria of which the first `p` are
//! completed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::Achievement;
use crate::display::Display;
use crate::ids::{AchievementId, SubjectId};

/// Criterion-level progress for one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaProgress {
    /// Every criterion label, in order.
    pub criteria: Vec<String>,
    /// The labels that are completed.
    pub completed: Vec<String>,
}

/// One achievement as sent to a client: definition view plus progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementUpdate {
    /// The achievement id.
    pub id: AchievementId,
    /// The parent id, for tree placement.
    pub parent: Option<AchievementId>,
    /// Presentation metadata.
    pub display: Display,
    /// Steps needed to complete.
    pub requirement: u32,
    /// Steps completed, already clamped to the requirement.
    pub progress: u32,
    /// The same progress in per-criterion form.
    pub criteria: CriteriaProgress,
}

impl AchievementUpdate {
    /// Build the wire view of `achievement` at `progress`.
    pub fn new(achievement: &Achievement, progress: u32) -> Self {
        let progress = progress.min(achievement.requirement());
        Self {
            id: achievement.id().clone(),
            parent: achievement.parent().cloned(),
            display: achievement.display().clone(),
            requirement: achievement.requirement(),
            progress,
            criteria: CriteriaProgress {
                criteria: achievement.criteria(),
                completed: achievement.completed_criteria(progress),
            },
        }
    }

    /// Whether the update shows the achievement as completed.
    pub const fn is_granted(&self) -> bool {
        self.progress >= self.requirement
    }
}

/// A compiled synchronization message for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// The subject the message is addressed to.
    pub subject: SubjectId,
    /// When true the client discards its prior state before applying.
    pub is_reset: bool,
    /// Achievements to add or refresh.
    pub updates: BTreeMap<AchievementId, AchievementUpdate>,
    /// Achievements to remove from view.
    pub removals: BTreeSet<AchievementId>,
    /// When the message was compiled.
    pub compiled_at: DateTime<Utc>,
}

impl SyncMessage {
    /// Whether the message carries nothing to apply.
    ///
    /// A reset message is never empty: it tells the client to drop its state.
    pub fn is_empty(&self) -> bool {
        !self.is_reset && self.updates.is_empty() && self.removals.is_empty()
    }
}
