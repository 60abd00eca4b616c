//! The progress store contract and an in-memory implementation.
//!
//! A store holds progress keyed by `(subject, achievement)`. The engine
//! reads once per transaction and writes only the changed entries, so a
//! store never sees a no-op write from the engine.

use std::collections::BTreeMap;
use std::future::Future;

use accolade_types::{AchievementId, ProgressMap, SubjectId};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Persistent progress storage.
pub trait ProgressStore: Send + Sync {
    /// Read the stored progress of `achievements` for `subject`.
    ///
    /// The result contains only requested ids that have a stored value;
    /// absent ids read as zero. The returned map is consistent with a
    /// single point in time.
    fn read(
        &self,
        subject: SubjectId,
        achievements: &[AchievementId],
    ) -> impl Future<Output = Result<ProgressMap, StoreError>> + Send;

    /// Persist `diff` for `subject`, all entries or none.
    ///
    /// An empty diff must be a no-op.
    fn write(
        &self,
        subject: SubjectId,
        diff: &ProgressMap,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Process-local store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    progress: RwLock<BTreeMap<SubjectId, ProgressMap>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything stored for `subject`, including zero values written by
    /// revocations.
    pub async fn progress_of(&self, subject: SubjectId) -> ProgressMap {
        self.progress
            .read()
            .await
            .get(&subject)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of subjects with stored progress.
    pub async fn subject_count(&self) -> usize {
        self.progress.read().await.len()
    }
}

impl ProgressStore for InMemoryStore {
    async fn read(
        &self,
        subject: SubjectId,
        achievements: &[AchievementId],
    ) -> Result<ProgressMap, StoreError> {
        let guard = self.progress.read().await;
        let Some(stored) = guard.get(&subject) else {
            return Ok(ProgressMap::new());
        };
        Ok(achievements
            .iter()
            .filter_map(|id| stored.get(id).map(|value| (id.clone(), *value)))
            .collect())
    }

    async fn write(&self, subject: SubjectId, diff: &ProgressMap) -> Result<(), StoreError> {
        if diff.is_empty() {
            return Ok(());
        }
        let mut guard = self.progress.write().await;
        let stored = guard.entry(subject).or_default();
        stored.extend(diff.iter().map(|(id, value)| (id.clone(), *value)));
        Ok(())
    }
}
