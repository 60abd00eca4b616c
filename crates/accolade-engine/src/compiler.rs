//! Synchronization compilation.
//!
//! Given a subject's progress before and after a transaction, the compiler
//! decides what the client must be told. Each state is partitioned into
//! shown and hidden achievements against *itself*, then:
//!
//! - incremental: updates are shown entries whose progress differs from the
//!   previously shown value (or that were not shown before); removals are
//!   hidden entries that were not hidden before.
//! - full resync: every shown entry is an update and there are no removals;
//!   the client drops its state first.

use std::collections::BTreeSet;

use accolade_types::{AchievementId, AchievementUpdate, ProgressMap, SubjectId, SyncMessage};
use chrono::Utc;

use crate::registry::Registry;
use crate::visibility::VisibilityEvaluator;

/// How a compilation relates to the client's current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Send only what changed relative to the baseline.
    Incremental,
    /// Send the complete shown set.
    FullResync,
}

/// Compiled updates and removals, before conversion to the wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledSync {
    /// Shown achievements to add or refresh, with their progress.
    pub updates: ProgressMap,
    /// Achievements the client must stop showing.
    pub removals: BTreeSet<AchievementId>,
}

impl CompiledSync {
    /// Whether nothing needs to be sent.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.removals.is_empty()
    }

    /// Build the wire message for `subject`.
    ///
    /// Updates whose id is no longer registered are dropped.
    pub fn into_message(self, registry: &Registry, subject: SubjectId, is_reset: bool) -> SyncMessage {
        let updates = self
            .updates
            .into_iter()
            .filter_map(|(id, progress)| {
                let achievement = registry.get(&id)?;
                Some((id, AchievementUpdate::new(achievement, progress)))
            })
            .collect();
        SyncMessage {
            subject,
            is_reset,
            updates,
            removals: self.removals,
            compiled_at: Utc::now(),
        }
    }
}

/// Compiles progress changes into client updates.
#[derive(Debug, Clone, Copy)]
pub struct SyncCompiler<'r> {
    registry: &'r Registry,
}

impl<'r> SyncCompiler<'r> {
    /// Create a compiler over `registry`.
    pub const fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Compile every registered achievement.
    pub fn compile(
        &self,
        subject: SubjectId,
        state: &ProgressMap,
        baseline: &ProgressMap,
        mode: SyncMode,
    ) -> CompiledSync {
        self.compile_scoped(subject, state, baseline, mode, self.registry.ids())
    }

    /// Compile only the achievements in `scope`.
    ///
    /// Visibility is still evaluated against the full snapshots, so a scoped
    /// compile agrees with [`compile`](Self::compile) on every id it covers.
    pub fn compile_scoped<'a>(
        &self,
        subject: SubjectId,
        state: &ProgressMap,
        baseline: &ProgressMap,
        mode: SyncMode,
        scope: impl IntoIterator<Item = &'a AchievementId> + Clone,
    ) -> CompiledSync {
        let evaluator = VisibilityEvaluator::new(self.registry);
        let (shown, hidden) = evaluator.partition(state, subject, scope.clone());

        if mode == SyncMode::FullResync {
            return CompiledSync {
                updates: shown,
                removals: BTreeSet::new(),
            };
        }

        let (shown_before, hidden_before) = evaluator.partition(baseline, subject, scope);
        let updates = shown
            .into_iter()
            .filter(|(id, progress)| shown_before.get(id) != Some(progress))
            .collect();
        let removals = hidden
            .into_iter()
            .filter(|id| !hidden_before.contains(id))
            .collect();
        CompiledSync { updates, removals }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use accolade_types::{Achievement, Display, Visibility};

    use super::*;

    fn id(path: &str) -> AchievementId {
        AchievementId::new("test", path).unwrap()
    }

    fn registry() -> Registry {
        Registry::from_definitions([
            Achievement::builder(id("root"), Display::new(0.0, 0.0, "i", "Root", ""))
                .build()
                .unwrap(),
            Achievement::builder(id("child"), Display::new(1.0, 0.0, "i", "Child", ""))
                .parent(id("root"))
                .requirement(10)
                .visibility(Visibility::ParentGranted)
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn unchanged_state_compiles_to_nothing() {
        let registry = registry();
        let state = ProgressMap::from([(id("root"), 1), (id("child"), 3)]);
        let compiled = SyncCompiler::new(&registry).compile(
            SubjectId::new(),
            &state,
            &state,
            SyncMode::Incremental,
        );
        assert!(compiled.is_empty());
    }

    #[test]
    fn granting_parent_reveals_child() {
        let registry = registry();
        let before = ProgressMap::from([(id("root"), 0), (id("child"), 0)]);
        let after = ProgressMap::from([(id("root"), 1), (id("child"), 0)]);
        let compiled =
            SyncCompiler::new(&registry).compile(SubjectId::new(), &after, &before, SyncMode::Incremental);
        assert_eq!(
            compiled.updates,
            ProgressMap::from([(id("root"), 1), (id("child"), 0)])
        );
        assert!(compiled.removals.is_empty());
    }

    #[test]
    fn revoking_parent_removes_child() {
        let registry = registry();
        let before = ProgressMap::from([(id("root"), 1), (id("child"), 4)]);
        let after = ProgressMap::from([(id("root"), 0), (id("child"), 4)]);
        let compiled =
            SyncCompiler::new(&registry).compile(SubjectId::new(), &after, &before, SyncMode::Incremental);
        assert_eq!(compiled.updates, ProgressMap::from([(id("root"), 0)]));
        assert_eq!(compiled.removals, BTreeSet::from([id("child")]));
    }

    #[test]
    fn full_resync_sends_every_shown_entry() {
        let registry = registry();
        let state = ProgressMap::from([(id("root"), 0), (id("child"), 0)]);
        let compiled =
            SyncCompiler::new(&registry).compile(SubjectId::new(), &state, &state, SyncMode::FullResync);
        assert_eq!(compiled.updates, ProgressMap::from([(id("root"), 0)]));
        assert!(compiled.removals.is_empty());
    }

    #[test]
    fn scoped_compile_matches_full_compile_on_scope() {
        let registry = registry();
        let before = ProgressMap::from([(id("root"), 0), (id("child"), 0)]);
        let after = ProgressMap::from([(id("root"), 1), (id("child"), 0)]);
        let compiler = SyncCompiler::new(&registry);
        let full = compiler.compile(SubjectId::new(), &after, &before, SyncMode::Incremental);
        let scope = registry.visibility_dependents(&id("root"));
        let scoped = compiler.compile_scoped(
            SubjectId::new(),
            &after,
            &before,
            SyncMode::Incremental,
            &scope,
        );
        assert_eq!(full, scoped);
    }

    #[test]
    fn message_carries_criteria() {
        let registry = registry();
        let compiled = CompiledSync {
            updates: ProgressMap::from([(id("child"), 2), (id("ghost"), 1)]),
            removals: BTreeSet::new(),
        };
        let message = compiled.into_message(&registry, SubjectId::new(), false);
        assert_eq!(message.updates.len(), 1);
        let update = message.updates.get(&id("child")).unwrap();
        assert_eq!(update.criteria.completed, vec!["0", "1"]);
    }
}
