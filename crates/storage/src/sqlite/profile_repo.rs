use training_core::model::{Profile, UserId};

use super::{SqliteRepository, mapping::map_profile_row};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, first_name, full_name, email, date_of_birth
            FROM profiles
            WHERE user_id = ?1
            ",
        )
        .bind(user.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Transport(e.to_string()))?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, first_name, full_name, email, date_of_birth)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                first_name = excluded.first_name,
                full_name = excluded.full_name,
                email = excluded.email,
                date_of_birth = excluded.date_of_birth
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(&profile.first_name)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.date_of_birth)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(())
    }
}
