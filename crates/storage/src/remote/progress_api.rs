use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use training_core::model::{AnswerSheet, ModuleKey, Profile, UserId};

use super::RemoteStore;
use crate::mapping::{module_key_from_text, status_from_text, user_id_from_text};
use crate::repository::{
    ProgressPatch, ProgressRecord, ProgressRepository, ProfileRepository, StorageError,
};

/// Wire shape of one `module_progress` row.
#[derive(Debug, Serialize, Deserialize)]
struct ProgressRow {
    user_id: String,
    module_key: String,
    percent: i64,
    status: String,
    time_spent: i64,
    quiz_score: Option<i64>,
    attempts: i64,
    answers: AnswerSheet,
    completed_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    fn into_record(self) -> Result<ProgressRecord, StorageError> {
        Ok(ProgressRecord {
            user_id: user_id_from_text(&self.user_id)?,
            module_key: module_key_from_text(self.module_key)?,
            percent: self.percent,
            status: status_from_text(&self.status)?,
            time_spent: self.time_spent,
            quiz_score: self.quiz_score,
            attempts: self.attempts,
            answers: self.answers,
            completed_at: self.completed_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRow {
    user_id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    date_of_birth: Option<String>,
}

fn transport(e: reqwest::Error) -> StorageError {
    StorageError::Transport(e.to_string())
}

impl RemoteStore {
    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StorageError> {
        let response = self
            .client
            .get(self.config.rest_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer()?)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(StorageError::Transport(format!(
                "{table} read failed: {}",
                response.status()
            )));
        }

        response.json().await.map_err(transport)
    }

    async fn upsert_row(
        &self,
        table: &str,
        conflict_columns: &str,
        body: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let response = self
            .client
            .post(self.config.rest_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer()?)
            .header("Prefer", "resolution=merge-duplicates")
            .query(&[("on_conflict", conflict_columns)])
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(StorageError::Transport(format!(
                "{table} write failed: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProgressRepository for RemoteStore {
    async fn fetch(
        &self,
        user: UserId,
        key: &ModuleKey,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let rows: Vec<ProgressRow> = self
            .get_rows(
                "module_progress",
                &[
                    ("select", "*".into()),
                    ("user_id", format!("eq.{user}")),
                    ("module_key", format!("eq.{}", key.as_str())),
                ],
            )
            .await?;

        rows.into_iter().next().map(ProgressRow::into_record).transpose()
    }

    async fn fetch_many(
        &self,
        user: UserId,
        keys: &[ModuleKey],
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let key_list = keys
            .iter()
            .map(ModuleKey::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let rows: Vec<ProgressRow> = self
            .get_rows(
                "module_progress",
                &[
                    ("select", "*".into()),
                    ("user_id", format!("eq.{user}")),
                    ("module_key", format!("in.({key_list})")),
                ],
            )
            .await?;

        rows.into_iter().map(ProgressRow::into_record).collect()
    }

    async fn upsert(
        &self,
        user: UserId,
        key: &ModuleKey,
        patch: &ProgressPatch,
    ) -> Result<(), StorageError> {
        // Only supplied fields go on the wire; merge-duplicates leaves the
        // rest of the row untouched.
        let mut body = serde_json::Map::new();
        body.insert("user_id".into(), json!(user.to_string()));
        body.insert("module_key".into(), json!(key.as_str()));
        if let Some(percent) = patch.percent {
            body.insert("percent".into(), json!(percent));
        }
        if let Some(status) = patch.status {
            body.insert("status".into(), json!(status.as_str()));
        }
        if let Some(time_spent) = patch.time_spent {
            body.insert("time_spent".into(), json!(time_spent));
        }
        if let Some(score) = patch.quiz_score {
            body.insert("quiz_score".into(), json!(score));
        }
        if let Some(attempts) = patch.attempts {
            body.insert("attempts".into(), json!(attempts));
        }
        if let Some(answers) = &patch.answers {
            let value = serde_json::to_value(answers)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            body.insert("answers".into(), value);
        }
        if let Some(completed_at) = patch.completed_at {
            body.insert("completed_at".into(), json!(completed_at));
        }

        self.upsert_row(
            "module_progress",
            "user_id,module_key",
            &serde_json::Value::Object(body),
        )
        .await
    }
}

#[async_trait::async_trait]
impl ProfileRepository for RemoteStore {
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, StorageError> {
        let rows: Vec<ProfileRow> = self
            .get_rows(
                "profiles",
                &[("select", "*".into()), ("user_id", format!("eq.{user}"))],
            )
            .await?;

        rows.into_iter()
            .next()
            .map(|row| {
                Ok(Profile {
                    user_id: user_id_from_text(&row.user_id)?,
                    first_name: row.first_name,
                    full_name: row.full_name,
                    email: row.email,
                    date_of_birth: row.date_of_birth,
                })
            })
            .transpose()
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let row = ProfileRow {
            user_id: profile.user_id.to_string(),
            first_name: profile.first_name.clone(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            date_of_birth: profile.date_of_birth.clone(),
        };
        let body =
            serde_json::to_value(&row).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.upsert_row("profiles", "user_id", &body).await
    }
}
