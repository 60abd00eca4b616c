//! The achievement engine.
//!
//! [`AchievementEngine`] owns the definition registry and runs transactions
//! against an injected [`ProgressStore`] and [`SyncSink`]. A transaction
//! proceeds in a fixed order:
//!
//! 1. take the subject's lock and snapshot the registry,
//! 2. read stored progress once,
//! 3. run the caller's operations on a working copy,
//! 4. diff; on an empty diff stop here,
//! 5. write the diff, compile the sync message, emit it.
//!
//! Only one transaction per subject is in flight at a time. Different
//! subjects proceed in parallel.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use accolade_types::{Achievement, AchievementId, DefinitionError, ProgressMap, SubjectId};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::compiler::{SyncCompiler, SyncMode};
use crate::error::EngineError;
use crate::registry::Registry;
use crate::sink::SyncSink;
use crate::store::ProgressStore;
use crate::transaction::{PendingCommit, Transaction};
use crate::visibility::{VisibilityEvaluator, progress_of};

/// Result of a single-achievement update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The achievement is not registered. Nothing was read or written.
    NotFound,
    /// The update would not change stored progress. Nothing was written.
    NoOp,
    /// Progress changed and was persisted. A sync message was emitted only
    /// if the subject's visible view changed.
    Applied,
}

impl UpdateOutcome {
    /// Whether progress changed.
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Per-subject transaction locks.
///
/// Entries are created on demand and pruned once nobody holds or waits on
/// them.
#[derive(Debug, Default)]
struct SubjectLocks {
    locks: Mutex<BTreeMap<SubjectId, Arc<Mutex<()>>>>,
}

impl SubjectLocks {
    async fn acquire(&self, subject: SubjectId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(subject).or_default())
        };
        lock.lock_owned().await
    }
}

/// Transactional achievement progress engine.
#[derive(Debug)]
pub struct AchievementEngine<S, K> {
    registry: RwLock<Arc<Registry>>,
    store: S,
    sink: K,
    locks: SubjectLocks,
}

impl<S: ProgressStore, K: SyncSink> AchievementEngine<S, K> {
    /// Create an engine with no definitions.
    pub fn new(store: S, sink: K) -> Self {
        Self::with_registry(Registry::new(), store, sink)
    }

    /// Create an engine over an already validated registry.
    pub fn with_registry(registry: Registry, store: S, sink: K) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            store,
            sink,
            locks: SubjectLocks::default(),
        }
    }

    /// The progress store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The sync sink.
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a definition, replacing any existing one with the same id.
    ///
    /// Returns the replaced definition. Transactions already running keep
    /// the registry they started with.
    pub async fn register(
        &self,
        definition: Achievement,
    ) -> Result<Option<Arc<Achievement>>, EngineError> {
        let id = definition.id().clone();
        let mut guard = self.registry.write().await;
        let previous = Arc::make_mut(&mut guard).insert(definition)?;
        if previous.is_some() {
            warn!(achievement = %id, "achievement definition replaced");
        } else {
            debug!(achievement = %id, "achievement registered");
        }
        Ok(previous)
    }

    /// Register a definition, rejecting an id that is already taken.
    pub async fn try_register(&self, definition: Achievement) -> Result<(), EngineError> {
        let id = definition.id().clone();
        let mut guard = self.registry.write().await;
        if guard.contains(&id) {
            return Err(DefinitionError::DuplicateId(id).into());
        }
        Arc::make_mut(&mut guard).insert(definition)?;
        debug!(achievement = %id, "achievement registered");
        Ok(())
    }

    /// Look up a definition.
    pub async fn get(&self, id: &AchievementId) -> Option<Arc<Achievement>> {
        self.registry.read().await.get(id).cloned()
    }

    /// A snapshot of every registered definition.
    pub async fn definitions(&self) -> Arc<Registry> {
        Arc::clone(&*self.registry.read().await)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Stored progress of `id` for `subject`, or `None` if `id` is not
    /// registered.
    pub async fn progress(
        &self,
        subject: SubjectId,
        id: &AchievementId,
    ) -> Result<Option<u32>, EngineError> {
        let Some(achievement) = self.get(id).await else {
            return Ok(None);
        };
        let stored = self.store.read(subject, std::slice::from_ref(id)).await?;
        Ok(Some(achievement.clamp(i64::from(progress_of(&stored, id)))))
    }

    /// Progress of every registered achievement for `subject`; absent
    /// entries read as zero.
    pub async fn progress_all(&self, subject: SubjectId) -> Result<ProgressMap, EngineError> {
        let registry = self.definitions().await;
        let ids: Vec<AchievementId> = registry.ids().cloned().collect();
        let stored = self.store.read(subject, &ids).await?;
        Ok(registry
            .iter()
            .map(|achievement| {
                let value = progress_of(&stored, achievement.id());
                (achievement.id().clone(), achievement.clamp(i64::from(value)))
            })
            .collect())
    }

    /// Whether `subject` is currently shown `id`. Unknown ids are not.
    pub async fn is_visible(
        &self,
        subject: SubjectId,
        id: &AchievementId,
    ) -> Result<bool, EngineError> {
        let registry = self.definitions().await;
        let Some(achievement) = registry.get(id) else {
            return Ok(false);
        };
        let mut ids = vec![id.clone()];
        ids.extend(achievement.parent().cloned());
        let stored = self.store.read(subject, &ids).await?;
        Ok(VisibilityEvaluator::new(&registry).is_visible(achievement, &stored, subject))
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Run `operations` as one transaction for `subject`.
    ///
    /// The closure mutates a working copy; the engine commits it once after
    /// the closure returns, emitting at most one sync message. On a store
    /// error nothing is emitted and the working copy is discarded.
    pub async fn transaction<F, R>(&self, subject: SubjectId, operations: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut Transaction<'_>) -> R + Send,
        R: Send,
    {
        let _guard = self.locks.acquire(subject).await;
        let registry = self.definitions().await;
        let ids: Vec<AchievementId> = registry.ids().cloned().collect();
        let stored = self.store.read(subject, &ids).await?;

        let mut tx = Transaction::new(subject, &registry, &stored);
        let result = operations(&mut tx);
        let pending = tx.into_commit();

        self.commit(subject, &registry, &pending, None).await?;
        Ok(result)
    }

    /// Complete `id` for `subject`.
    pub async fn grant(
        &self,
        subject: SubjectId,
        id: &AchievementId,
    ) -> Result<UpdateOutcome, EngineError> {
        self.update(subject, id, |tx, id| tx.grant(id)).await
    }

    /// Add `steps` to `id` for `subject`.
    pub async fn grant_steps(
        &self,
        subject: SubjectId,
        id: &AchievementId,
        steps: u32,
    ) -> Result<UpdateOutcome, EngineError> {
        self.update(subject, id, |tx, id| tx.grant_steps(id, steps))
            .await
    }

    /// Reset `id` to zero for `subject`.
    pub async fn revoke(
        &self,
        subject: SubjectId,
        id: &AchievementId,
    ) -> Result<UpdateOutcome, EngineError> {
        self.update(subject, id, |tx, id| tx.revoke(id)).await
    }

    /// Remove `steps` from `id` for `subject`.
    pub async fn revoke_steps(
        &self,
        subject: SubjectId,
        id: &AchievementId,
        steps: u32,
    ) -> Result<UpdateOutcome, EngineError> {
        self.update(subject, id, |tx, id| tx.revoke_steps(id, steps))
            .await
    }

    /// Set `id` to `value` (clamped) for `subject`.
    pub async fn set(
        &self,
        subject: SubjectId,
        id: &AchievementId,
        value: i64,
    ) -> Result<UpdateOutcome, EngineError> {
        self.update(subject, id, |tx, id| tx.set(id, value)).await
    }

    /// Complete every registered achievement for `subject`.
    ///
    /// Returns false only when nothing is registered.
    pub async fn grant_all(&self, subject: SubjectId) -> Result<bool, EngineError> {
        self.transaction(subject, |tx| tx.grant_all()).await
    }

    /// Reset every registered achievement for `subject`.
    ///
    /// Returns false only when nothing is registered.
    pub async fn revoke_all(&self, subject: SubjectId) -> Result<bool, EngineError> {
        self.transaction(subject, |tx| tx.revoke_all()).await
    }

    /// Send `subject` its complete view, replacing whatever the client has.
    ///
    /// Achievements marked default-granted are granted first and the grant
    /// is persisted like any other change. The reset message is emitted even
    /// when nothing is shown.
    pub async fn show_all(&self, subject: SubjectId) -> Result<(), EngineError> {
        let _guard = self.locks.acquire(subject).await;
        let registry = self.definitions().await;
        let ids: Vec<AchievementId> = registry.ids().cloned().collect();
        let stored = self.store.read(subject, &ids).await?;

        let mut tx = Transaction::new(subject, &registry, &stored);
        for achievement in registry.iter().filter(|a| a.default_granted()) {
            tx.grant(achievement.id());
        }
        let pending = tx.into_commit();
        if !pending.diff.is_empty() {
            self.store.write(subject, &pending.diff).await?;
            info!(%subject, granted = pending.diff.len(), "default achievements granted");
        }

        let compiled = SyncCompiler::new(&registry).compile(
            subject,
            &pending.working,
            &pending.seed,
            SyncMode::FullResync,
        );
        let message = compiled.into_message(&registry, subject, true);
        debug!(%subject, updates = message.updates.len(), "full resync compiled");
        self.sink.emit(message).await?;
        Ok(())
    }

    /// Apply one operation to one achievement and compile only the entries
    /// whose visibility it can affect.
    async fn update<F>(
        &self,
        subject: SubjectId,
        id: &AchievementId,
        operation: F,
    ) -> Result<UpdateOutcome, EngineError>
    where
        F: FnOnce(&mut Transaction<'_>, &AchievementId) -> bool + Send,
    {
        let registry = self.definitions().await;
        let Some(achievement) = registry.get(id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        let _guard = self.locks.acquire(subject).await;
        let scope = registry.visibility_dependents(id);
        let mut reads: BTreeSet<AchievementId> = scope.clone();
        reads.extend(achievement.parent().cloned());
        let reads: Vec<AchievementId> = reads.into_iter().collect();
        let stored = self.store.read(subject, &reads).await?;

        let mut tx = Transaction::new(subject, &registry, &stored);
        let before = tx.progress(id);
        operation(&mut tx, id);
        if tx.progress(id) == before {
            return Ok(UpdateOutcome::NoOp);
        }
        let pending = tx.into_commit();

        self.commit(subject, &registry, &pending, Some(&scope)).await?;
        Ok(UpdateOutcome::Applied)
    }

    /// Persist a finished transaction and emit its sync message.
    ///
    /// Returns whether anything was written.
    async fn commit(
        &self,
        subject: SubjectId,
        registry: &Registry,
        pending: &PendingCommit,
        scope: Option<&BTreeSet<AchievementId>>,
    ) -> Result<bool, EngineError> {
        if pending.diff.is_empty() {
            debug!(%subject, "transaction made no changes");
            return Ok(false);
        }
        self.store.write(subject, &pending.diff).await?;

        let compiler = SyncCompiler::new(registry);
        let compiled = match scope {
            Some(scope) => compiler.compile_scoped(
                subject,
                &pending.working,
                &pending.seed,
                SyncMode::Incremental,
                scope,
            ),
            None => compiler.compile(subject, &pending.working, &pending.seed, SyncMode::Incremental),
        };
        if compiled.is_empty() {
            debug!(%subject, changed = pending.diff.len(), "progress committed, nothing visible changed");
            return Ok(true);
        }

        let message = compiled.into_message(registry, subject, false);
        debug!(
            %subject,
            changed = pending.diff.len(),
            updates = message.updates.len(),
            removals = message.removals.len(),
            "progress committed"
        );
        self.sink.emit(message).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use accolade_types::{Display, Visibility};

    use super::*;
    use crate::sink::BroadcastSink;
    use crate::store::InMemoryStore;

    fn id(path: &str) -> AchievementId {
        AchievementId::new("test", path).unwrap()
    }

    fn def(path: &str) -> Achievement {
        Achievement::builder(id(path), Display::new(0.0, 0.0, "i", path, ""))
            .build()
            .unwrap()
    }

    fn engine() -> AchievementEngine<InMemoryStore, BroadcastSink> {
        AchievementEngine::new(InMemoryStore::new(), BroadcastSink::new(16))
    }

    #[tokio::test]
    async fn register_replaces_and_try_register_rejects() {
        let engine = engine();
        assert!(engine.register(def("a")).await.unwrap().is_none());
        assert!(engine.register(def("a")).await.unwrap().is_some());

        let err = engine.try_register(def("a")).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Definition {
                source: DefinitionError::DuplicateId(_)
            }
        ));
        engine.try_register(def("b")).await.unwrap();
        assert_eq!(engine.definitions().await.len(), 2);
    }

    #[tokio::test]
    async fn register_rejects_unknown_parent() {
        let engine = engine();
        let orphan = Achievement::builder(id("orphan"), Display::new(0.0, 0.0, "i", "t", ""))
            .parent(id("nobody"))
            .build()
            .unwrap();
        assert!(engine.register(orphan).await.is_err());
        assert!(engine.get(&id("orphan")).await.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_without_store_access() {
        let engine = engine();
        let subject = SubjectId::new();
        let outcome = engine.grant(subject, &id("missing")).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert_eq!(engine.store().subject_count().await, 0);
    }

    #[tokio::test]
    async fn grant_then_grant_again_is_noop() {
        let engine = engine();
        engine.register(def("a")).await.unwrap();
        let subject = SubjectId::new();
        assert_eq!(engine.grant(subject, &id("a")).await.unwrap(), UpdateOutcome::Applied);
        assert_eq!(engine.grant(subject, &id("a")).await.unwrap(), UpdateOutcome::NoOp);
        assert_eq!(engine.progress(subject, &id("a")).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn revoke_at_zero_is_noop() {
        let engine = engine();
        engine.register(def("a")).await.unwrap();
        let outcome = engine.revoke(SubjectId::new(), &id("a")).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::NoOp);
        assert!(!outcome.is_applied());
    }

    #[tokio::test]
    async fn progress_of_unknown_is_none() {
        let engine = engine();
        assert_eq!(engine.progress(SubjectId::new(), &id("x")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn is_visible_reads_parent() {
        let engine = engine();
        engine.register(def("root")).await.unwrap();
        let child = Achievement::builder(id("child"), Display::new(1.0, 0.0, "i", "t", ""))
            .parent(id("root"))
            .visibility(Visibility::ParentGranted)
            .build()
            .unwrap();
        engine.register(child).await.unwrap();
        let subject = SubjectId::new();

        assert!(!engine.is_visible(subject, &id("child")).await.unwrap());
        engine.grant(subject, &id("root")).await.unwrap();
        assert!(engine.is_visible(subject, &id("child")).await.unwrap());
        assert!(!engine.is_visible(subject, &id("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn transaction_returns_closure_result() {
        let engine = engine();
        engine.register(def("a")).await.unwrap();
        let subject = SubjectId::new();
        let granted = engine
            .transaction(subject, |tx| tx.grant(&id("a")) && !tx.grant(&id("b")))
            .await
            .unwrap();
        assert!(granted);
        assert_eq!(
            engine.progress_all(subject).await.unwrap(),
            ProgressMap::from([(id("a"), 1)])
        );
    }
}
