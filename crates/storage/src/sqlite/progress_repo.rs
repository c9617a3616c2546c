use training_core::model::{ModuleKey, UserId};

use super::{SqliteRepository, mapping::map_progress_row};
use crate::mapping::answers_to_json;
use crate::repository::{ProgressPatch, ProgressRecord, ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = r"
    user_id, module_key, percent, status, time_spent,
    quiz_score, attempts, answers, completed_at
";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn fetch(
        &self,
        user: UserId,
        key: &ModuleKey,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM module_progress WHERE user_id = ?1 AND module_key = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(user.to_string())
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn fetch_many(
        &self,
        user: UserId,
        keys: &[ModuleKey],
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM module_progress WHERE user_id = ?1 AND module_key IN ("
        );
        for i in 0..keys.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 2).to_string());
        }
        sql.push(')');

        let mut q = sqlx::query(&sql).bind(user.to_string());
        for key in keys {
            q = q.bind(key.as_str());
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn upsert(
        &self,
        user: UserId,
        key: &ModuleKey,
        patch: &ProgressPatch,
    ) -> Result<(), StorageError> {
        // Omitted patch fields fall through to the column default on first
        // insert and to the stored value on conflict.
        let answers_json = patch.answers.as_ref().map(answers_to_json).transpose()?;

        sqlx::query(
            r"
            INSERT INTO module_progress (
                user_id, module_key, percent, status, time_spent,
                quiz_score, attempts, answers, completed_at
            )
            VALUES (
                ?1, ?2,
                COALESCE(?3, 0),
                COALESCE(?4, 'not_started'),
                COALESCE(?5, 0),
                ?6,
                COALESCE(?7, 0),
                COALESCE(?8, '{}'),
                ?9
            )
            ON CONFLICT(user_id, module_key) DO UPDATE SET
                percent = COALESCE(?3, module_progress.percent),
                status = COALESCE(?4, module_progress.status),
                time_spent = COALESCE(?5, module_progress.time_spent),
                quiz_score = COALESCE(?6, module_progress.quiz_score),
                attempts = COALESCE(?7, module_progress.attempts),
                answers = COALESCE(?8, module_progress.answers),
                completed_at = COALESCE(?9, module_progress.completed_at)
            ",
        )
        .bind(user.to_string())
        .bind(key.as_str())
        .bind(patch.percent.map(i64::from))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.time_spent.map(i64::from))
        .bind(patch.quiz_score.map(i64::from))
        .bind(patch.attempts.map(i64::from))
        .bind(answers_json)
        .bind(patch.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(())
    }
}
