//! The `achievement_progress` table.
//!
//! Reads select only the requested achievements. Writes upsert the whole
//! diff in one statement inside one transaction, so a diff is persisted
//! completely or not at all.

use accolade_engine::{ProgressStore, StoreError};
use accolade_types::{AchievementId, ProgressMap, SubjectId};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// [`ProgressStore`] backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgProgressStore {
    pool: PgPool,
}

impl PgProgressStore {
    /// Create a store on `pool`. Migrations must already have run.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load stored progress of `achievements` for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidRecord`] if a stored row is out of range.
    pub async fn load(
        &self,
        subject: SubjectId,
        achievements: &[AchievementId],
    ) -> Result<ProgressMap, DbError> {
        if achievements.is_empty() {
            return Ok(ProgressMap::new());
        }
        let keys: Vec<String> = achievements.iter().map(ToString::to_string).collect();

        let rows = sqlx::query_as::<_, (String, i64)>(
            r"SELECT achievement_id, progress
              FROM achievement_progress
              WHERE subject_id = $1 AND achievement_id = ANY($2)",
        )
        .bind(subject.into_inner())
        .bind(&keys)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode_row).collect()
    }

    /// Upsert every entry of `diff` for `subject` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the transaction fails; nothing is
    /// written in that case.
    pub async fn save(&self, subject: SubjectId, diff: &ProgressMap) -> Result<(), DbError> {
        if diff.is_empty() {
            return Ok(());
        }

        let len = diff.len();
        let mut subjects: Vec<Uuid> = Vec::with_capacity(len);
        let mut keys: Vec<String> = Vec::with_capacity(len);
        let mut values: Vec<i64> = Vec::with_capacity(len);
        for (id, value) in diff {
            subjects.push(subject.into_inner());
            keys.push(id.to_string());
            values.push(i64::from(*value));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"INSERT INTO achievement_progress (subject_id, achievement_id, progress, updated_at)
              SELECT s, a, p, $4 FROM UNNEST($1::UUID[], $2::TEXT[], $3::BIGINT[]) AS t(s, a, p)
              ON CONFLICT (subject_id, achievement_id)
              DO UPDATE SET progress = EXCLUDED.progress, updated_at = EXCLUDED.updated_at",
        )
        .bind(&subjects)
        .bind(&keys)
        .bind(&values)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(%subject, count = len, "Upserted achievement progress (batch UNNEST)");
        Ok(())
    }

    /// Delete every stored row for `subject`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn forget_subject(&self, subject: SubjectId) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM achievement_progress WHERE subject_id = $1")
            .bind(subject.into_inner())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl ProgressStore for PgProgressStore {
    async fn read(
        &self,
        subject: SubjectId,
        achievements: &[AchievementId],
    ) -> Result<ProgressMap, StoreError> {
        self.load(subject, achievements).await.map_err(read_error)
    }

    async fn write(&self, subject: SubjectId, diff: &ProgressMap) -> Result<(), StoreError> {
        self.save(subject, diff).await.map_err(StoreError::write)
    }
}

/// Corrupt rows keep their own variant so callers can tell them apart from
/// connectivity failures.
fn read_error(err: DbError) -> StoreError {
    match err {
        DbError::InvalidRecord(message) => StoreError::InvalidRecord { message },
        other => StoreError::read(other),
    }
}

/// Map a `(achievement_id, progress)` row to engine types.
fn decode_row((key, progress): (String, i64)) -> Result<(AchievementId, u32), DbError> {
    let id: AchievementId = key
        .parse()
        .map_err(|e| DbError::InvalidRecord(format!("achievement id `{key}`: {e}")))?;
    let progress = u32::try_from(progress)
        .map_err(|e| DbError::InvalidRecord(format!("progress {progress} for {id}: {e}")))?;
    Ok((id, progress))
}
