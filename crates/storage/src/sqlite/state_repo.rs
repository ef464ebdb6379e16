use async_trait::async_trait;
use chrono::Utc;
use exam_core::model::{AnswerSheet, ExamSession, QuestionId};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{
    correct_count_key, AutoRemovePolicy, CorrectCountRepository, RemovalPolicyRepository,
    SessionStateRepository, StorageError, ANSWERS_KEY, POLICY_KEY, SESSION_KEY,
};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl SqliteRepository {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM state_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .map_err(conn)?;
        row.map(|r| r.try_get::<String, _>("value").map_err(ser))
            .transpose()
    }

    async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO state_store (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM state_store WHERE key = ?1")
            .bind(key)
            .execute(self.pool())
            .await
            .map_err(conn)?;
        Ok(())
    }
}

#[async_trait]
impl SessionStateRepository for SqliteRepository {
    async fn save_session(
        &self,
        session: &ExamSession,
        answers: &AnswerSheet,
    ) -> Result<(), StorageError> {
        let session_json = serde_json::to_string(session).map_err(ser)?;
        let answers_json = serde_json::to_string(answers).map_err(ser)?;
        self.put_value(SESSION_KEY, &session_json).await?;
        self.put_value(ANSWERS_KEY, &answers_json).await
    }

    async fn load_session(&self) -> Result<Option<(ExamSession, AnswerSheet)>, StorageError> {
        let Some(session_json) = self.get_value(SESSION_KEY).await? else {
            return Ok(None);
        };
        let session: ExamSession = serde_json::from_str(&session_json).map_err(ser)?;
        let answers = match self.get_value(ANSWERS_KEY).await? {
            Some(answers_json) => serde_json::from_str(&answers_json).map_err(ser)?,
            None => AnswerSheet::new(),
        };
        Ok(Some((session, answers)))
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        self.delete_value(SESSION_KEY).await?;
        self.delete_value(ANSWERS_KEY).await
    }
}

#[async_trait]
impl CorrectCountRepository for SqliteRepository {
    async fn correct_count(&self, question_id: &QuestionId) -> Result<u32, StorageError> {
        match self.get_value(&correct_count_key(question_id)).await? {
            Some(value) => value.parse().map_err(ser),
            None => Ok(0),
        }
    }

    async fn set_correct_count(
        &self,
        question_id: &QuestionId,
        count: u32,
    ) -> Result<(), StorageError> {
        self.put_value(&correct_count_key(question_id), &count.to_string())
            .await
    }

    async fn clear_correct_count(&self, question_id: &QuestionId) -> Result<(), StorageError> {
        self.delete_value(&correct_count_key(question_id)).await
    }
}

#[async_trait]
impl RemovalPolicyRepository for SqliteRepository {
    async fn policy(&self) -> Result<Option<AutoRemovePolicy>, StorageError> {
        match self.get_value(POLICY_KEY).await? {
            Some(value) => serde_json::from_str(&value).map(Some).map_err(ser),
            None => Ok(None),
        }
    }

    async fn set_policy(&self, policy: &AutoRemovePolicy) -> Result<(), StorageError> {
        let json = serde_json::to_string(policy).map_err(ser)?;
        self.put_value(POLICY_KEY, &json).await
    }
}
