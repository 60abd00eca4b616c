//! Scoped progress mutation.
//!
//! A [`Transaction`] is a working copy of one subject's progress, seeded by
//! a single store read. Operations only touch the working copy; the engine
//! diffs it against the seed and commits exactly once after the caller's
//! closure returns. Every write is clamped to `[0, requirement]`.

use accolade_types::{AchievementId, ProgressMap, SubjectId};

use crate::registry::Registry;
use crate::visibility::progress_of;

/// Working copy of one subject's progress.
#[derive(Debug)]
pub struct Transaction<'r> {
    subject: SubjectId,
    registry: &'r Registry,
    seed: ProgressMap,
    working: ProgressMap,
}

/// The result of a finished transaction, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    /// Progress as read from the store, for every tracked achievement.
    pub seed: ProgressMap,
    /// Progress after the transaction's operations.
    pub working: ProgressMap,
    /// The entries of `working` that differ from `seed`.
    pub diff: ProgressMap,
}

impl<'r> Transaction<'r> {
    /// Start a transaction over every achievement in `registry`.
    ///
    /// `stored` holds the values read from the store; registered ids it
    /// lacks are seeded with zero and ids it has but the registry does not
    /// are ignored. Stored values are clamped to the current requirement.
    pub fn new(subject: SubjectId, registry: &'r Registry, stored: &ProgressMap) -> Self {
        let seed: ProgressMap = registry
            .iter()
            .map(|achievement| {
                let value = progress_of(stored, achievement.id());
                (
                    achievement.id().clone(),
                    achievement.clamp(i64::from(value)),
                )
            })
            .collect();
        Self {
            subject,
            registry,
            working: seed.clone(),
            seed,
        }
    }

    /// The subject this transaction mutates.
    pub const fn subject(&self) -> SubjectId {
        self.subject
    }

    /// Current working progress of `id`, or `None` if it is not tracked.
    pub fn progress(&self, id: &AchievementId) -> Option<u32> {
        self.working.get(id).copied()
    }

    /// Complete `id`. Returns false if `id` is not tracked.
    pub fn grant(&mut self, id: &AchievementId) -> bool {
        self.apply(id, |current, requirement| {
            current.saturating_add(i64::from(requirement))
        })
    }

    /// Add `steps` to `id`, capped at the requirement.
    pub fn grant_steps(&mut self, id: &AchievementId, steps: u32) -> bool {
        self.apply(id, |current, _| current.saturating_add(i64::from(steps)))
    }

    /// Reset `id` to zero. Returns false if `id` is not tracked.
    pub fn revoke(&mut self, id: &AchievementId) -> bool {
        self.apply(id, |current, requirement| {
            current.saturating_sub(i64::from(requirement))
        })
    }

    /// Remove `steps` from `id`, floored at zero.
    pub fn revoke_steps(&mut self, id: &AchievementId, steps: u32) -> bool {
        self.apply(id, |current, _| current.saturating_sub(i64::from(steps)))
    }

    /// Set `id` to `value`, clamped into `[0, requirement]`.
    pub fn set(&mut self, id: &AchievementId, value: i64) -> bool {
        self.apply(id, |_, _| value)
    }

    /// Complete every tracked achievement.
    ///
    /// Returns false only when nothing is tracked.
    pub fn grant_all(&mut self) -> bool {
        let registry = self.registry;
        for achievement in registry.iter() {
            self.working
                .insert(achievement.id().clone(), achievement.requirement());
        }
        !self.working.is_empty()
    }

    /// Reset every tracked achievement to zero.
    ///
    /// Returns false only when nothing is tracked.
    pub fn revoke_all(&mut self) -> bool {
        for value in self.working.values_mut() {
            *value = 0;
        }
        !self.working.is_empty()
    }

    /// Entries whose working value differs from the seed.
    pub fn changes(&self) -> ProgressMap {
        self.working
            .iter()
            .filter(|(id, value)| self.seed.get(*id) != Some(*value))
            .map(|(id, value)| (id.clone(), *value))
            .collect()
    }

    /// Finish the transaction.
    pub fn into_commit(self) -> PendingCommit {
        let diff = self.changes();
        PendingCommit {
            seed: self.seed,
            working: self.working,
            diff,
        }
    }

    fn apply(&mut self, id: &AchievementId, next: impl FnOnce(i64, u32) -> i64) -> bool {
        let Some(achievement) = self.registry.get(id) else {
            return false;
        };
        let Some(current) = self.working.get_mut(id) else {
            return false;
        };
        *current = achievement.clamp(next(i64::from(*current), achievement.requirement()));
        true
    }
}
