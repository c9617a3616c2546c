use sqlx::Row;
use training_core::model::Profile;

use crate::mapping::{
    answers_from_json, module_key_from_text, ser, status_from_text, user_id_from_text,
};
use crate::repository::{ProgressRecord, StorageError};

pub(crate) fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let user_id_text: String = row.try_get("user_id").map_err(ser)?;
    let module_key_text: String = row.try_get("module_key").map_err(ser)?;
    let status_text: String = row.try_get("status").map_err(ser)?;
    let answers_text: String = row.try_get("answers").map_err(ser)?;

    Ok(ProgressRecord {
        user_id: user_id_from_text(&user_id_text)?,
        module_key: module_key_from_text(module_key_text)?,
        percent: row.try_get("percent").map_err(ser)?,
        status: status_from_text(&status_text)?,
        time_spent: row.try_get("time_spent").map_err(ser)?,
        quiz_score: row.try_get("quiz_score").map_err(ser)?,
        attempts: row.try_get("attempts").map_err(ser)?,
        answers: answers_from_json(&answers_text)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_profile_row(row: &sqlx::sqlite::SqliteRow) -> Result<Profile, StorageError> {
    let user_id_text: String = row.try_get("user_id").map_err(ser)?;
    Ok(Profile {
        user_id: user_id_from_text(&user_id_text)?,
        first_name: row.try_get("first_name").map_err(ser)?,
        full_name: row.try_get("full_name").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        date_of_birth: row.try_get("date_of_birth").map_err(ser)?,
    })
}
