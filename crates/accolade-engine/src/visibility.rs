//! Visibility evaluation.
//!
//! Evaluation is a pure function of a definition, the registry it belongs
//! to, and one subject's progress snapshot. Absent progress reads as zero.
//! `ParentGranted` looks only at the direct parent's progress; it never
//! consults the parent's own visibility rule.

use std::collections::BTreeSet;

use accolade_types::{Achievement, AchievementId, ProgressMap, SubjectId, Visibility};
use tracing::trace;

use crate::registry::Registry;

/// Evaluates visibility rules against a registry.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityEvaluator<'r> {
    registry: &'r Registry,
}

impl<'r> VisibilityEvaluator<'r> {
    /// Create an evaluator over `registry`.
    pub const fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Whether `achievement` is shown to `subject` given `snapshot`.
    pub fn is_visible(
        &self,
        achievement: &Achievement,
        snapshot: &ProgressMap,
        subject: SubjectId,
    ) -> bool {
        let visible = self.evaluate(achievement.visibility(), achievement, snapshot);
        trace!(%subject, achievement = %achievement.id(), visible, "visibility evaluated");
        visible
    }

    /// Whether the registered achievement `id` is granted in `snapshot`.
    ///
    /// Unknown ids are never granted.
    pub fn is_granted(&self, id: &AchievementId, snapshot: &ProgressMap) -> bool {
        self.registry
            .get(id)
            .is_some_and(|achievement| achievement.is_granted(progress_of(snapshot, id)))
    }

    /// Split the ids in `scope` into shown (with progress) and hidden.
    ///
    /// Ids that are not registered are skipped.
    pub fn partition<'a>(
        &self,
        snapshot: &ProgressMap,
        subject: SubjectId,
        scope: impl IntoIterator<Item = &'a AchievementId>,
    ) -> (ProgressMap, BTreeSet<AchievementId>) {
        let mut shown = ProgressMap::new();
        let mut hidden = BTreeSet::new();
        for id in scope {
            let Some(achievement) = self.registry.get(id) else {
                continue;
            };
            if self.is_visible(achievement, snapshot, subject) {
                shown.insert(id.clone(), progress_of(snapshot, id));
            } else {
                hidden.insert(id.clone());
            }
        }
        (shown, hidden)
    }

    fn evaluate(&self, rule: &Visibility, achievement: &Achievement, snapshot: &ProgressMap) -> bool {
        match rule {
            Visibility::Always => true,
            Visibility::HaveProgress => progress_of(snapshot, achievement.id()) > 0,
            Visibility::Granted => achievement.is_granted(progress_of(snapshot, achievement.id())),
            Visibility::ParentGranted => achievement
                .parent()
                .is_none_or(|parent| self.is_granted(parent, snapshot)),
            Visibility::All(rules) => rules
                .iter()
                .all(|inner| self.evaluate(inner, achievement, snapshot)),
            Visibility::Any(rules) => rules
                .iter()
                .any(|inner| self.evaluate(inner, achievement, snapshot)),
        }
    }
}

/// Progress of `id` in `snapshot`, zero when absent.
pub fn progress_of(snapshot: &ProgressMap, id: &AchievementId) -> u32 {
    snapshot.get(id).copied().unwrap_or(0)
}
