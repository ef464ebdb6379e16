use async_trait::async_trait;
use exam_core::model::{AnswerSheet, ExamSession, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY LAYOUT ────────────────────────────────────────────────────────────────
//

/// Storage key of the serialized active session.
pub const SESSION_KEY: &str = "examSession";

/// Storage key of the serialized answer mapping.
pub const ANSWERS_KEY: &str = "examAnswers";

/// Storage key of the wrong-question auto-removal policy.
pub const POLICY_KEY: &str = "wrongQuestionAutoRemove";

/// Storage key of the consecutive-correct counter for one question.
#[must_use]
pub fn correct_count_key(question_id: &QuestionId) -> String {
    format!("wrongQuestion_{question_id}_correctCount")
}

//
// ─── POLICY RECORD ─────────────────────────────────────────────────────────────
//

/// Configuration of the wrong-question auto-removal side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRemovePolicy {
    pub enabled: bool,
    /// Consecutive correct answers required before a question leaves the
    /// wrong-question list. Zero is treated as one by the engine.
    #[serde(rename = "removeAfter")]
    pub remove_after: u32,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// The single durable slot holding the active session and its answers.
///
/// Both blobs are written together on every mutation; a reader either gets
/// a parseable pair or an error it can downgrade to "no prior session".
#[async_trait]
pub trait SessionStateRepository: Send + Sync {
    /// Persist the session and the full answer mapping.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either blob cannot be stored.
    async fn save_session(
        &self,
        session: &ExamSession,
        answers: &AnswerSheet,
    ) -> Result<(), StorageError>;

    /// Load the persisted pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when a stored blob does not
    /// parse; callers decide whether that is fatal.
    async fn load_session(&self) -> Result<Option<(ExamSession, AnswerSheet)>, StorageError>;

    /// Drop both blobs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn clear_session(&self) -> Result<(), StorageError>;
}

/// Per-question consecutive-correct counters. These outlive sessions.
#[async_trait]
pub trait CorrectCountRepository: Send + Sync {
    /// Current counter value; missing counters read as zero.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure or an unparseable value.
    async fn correct_count(&self, question_id: &QuestionId) -> Result<u32, StorageError>;

    /// Store a counter value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn set_correct_count(
        &self,
        question_id: &QuestionId,
        count: u32,
    ) -> Result<(), StorageError>;

    /// Remove a counter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn clear_correct_count(&self, question_id: &QuestionId) -> Result<(), StorageError>;
}

/// Reader/writer for the auto-removal policy slot.
#[async_trait]
pub trait RemovalPolicyRepository: Send + Sync {
    /// The configured policy, or `None` when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a malformed slot; the
    /// engine logs and ignores that.
    async fn policy(&self) -> Result<Option<AutoRemovePolicy>, StorageError>;

    /// Replace the policy slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn set_policy(&self, policy: &AutoRemovePolicy) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Key/value backend for testing and prototyping.
///
/// Values are stored as JSON strings under the same keys the SQLite backend
/// uses, so tests can inject malformed blobs with [`InMemoryStateStore::set_raw`].
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw value, bypassing serialization.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn set_raw(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("state store lock")
            .insert(key.to_owned(), value.to_owned());
    }

    /// Read a raw value.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.values.lock().expect("state store lock").get(key).cloned()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl SessionStateRepository for InMemoryStateStore {
    async fn save_session(
        &self,
        session: &ExamSession,
        answers: &AnswerSheet,
    ) -> Result<(), StorageError> {
        let session_json = serde_json::to_string(session).map_err(ser)?;
        let answers_json = serde_json::to_string(answers).map_err(ser)?;
        self.put(SESSION_KEY, session_json)?;
        self.put(ANSWERS_KEY, answers_json)
    }

    async fn load_session(&self) -> Result<Option<(ExamSession, AnswerSheet)>, StorageError> {
        let Some(session_json) = self.get(SESSION_KEY)? else {
            return Ok(None);
        };
        let session: ExamSession = serde_json::from_str(&session_json).map_err(ser)?;
        let answers = match self.get(ANSWERS_KEY)? {
            Some(answers_json) => serde_json::from_str(&answers_json).map_err(ser)?,
            None => AnswerSheet::new(),
        };
        Ok(Some((session, answers)))
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        self.remove(SESSION_KEY)?;
        self.remove(ANSWERS_KEY)
    }
}

#[async_trait]
impl CorrectCountRepository for InMemoryStateStore {
    async fn correct_count(&self, question_id: &QuestionId) -> Result<u32, StorageError> {
        match self.get(&correct_count_key(question_id))? {
            Some(value) => value.parse().map_err(ser),
            None => Ok(0),
        }
    }

    async fn set_correct_count(
        &self,
        question_id: &QuestionId,
        count: u32,
    ) -> Result<(), StorageError> {
        self.put(&correct_count_key(question_id), count.to_string())
    }

    async fn clear_correct_count(&self, question_id: &QuestionId) -> Result<(), StorageError> {
        self.remove(&correct_count_key(question_id))
    }
}

#[async_trait]
impl RemovalPolicyRepository for InMemoryStateStore {
    async fn policy(&self) -> Result<Option<AutoRemovePolicy>, StorageError> {
        match self.get(POLICY_KEY)? {
            Some(value) => serde_json::from_str(&value).map(Some).map_err(ser),
            None => Ok(None),
        }
    }

    async fn set_policy(&self, policy: &AutoRemovePolicy) -> Result<(), StorageError> {
        let json = serde_json::to_string(policy).map_err(ser)?;
        self.put(POLICY_KEY, json)
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the storage contracts behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub session_state: Arc<dyn SessionStateRepository>,
    pub correct_counts: Arc<dyn CorrectCountRepository>,
    pub removal_policy: Arc<dyn RemovalPolicyRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStateStore::new();
        Self::from_store(store)
    }

    /// Wraps one in-memory store so tests can keep a raw handle to it.
    #[must_use]
    pub fn from_store(store: InMemoryStateStore) -> Self {
        let session_state: Arc<dyn SessionStateRepository> = Arc::new(store.clone());
        let correct_counts: Arc<dyn CorrectCountRepository> = Arc::new(store.clone());
        let removal_policy: Arc<dyn RemovalPolicyRepository> = Arc::new(store);
        Self {
            session_state,
            correct_counts,
            removal_policy,
        }
    }
}
