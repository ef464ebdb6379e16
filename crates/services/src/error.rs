//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{ExamError, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Validation errors raised by the catalog stores.
///
/// These carry the human-readable message the admin UI surfaces directly;
/// none of them are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("a {entity} with the same name already exists in this {scope}")]
    DuplicateName {
        entity: &'static str,
        scope: &'static str,
    },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("chapter still has {count} sections; delete them first")]
    ChapterHasSections { count: usize },

    #[error("chapter is referenced by {count} questions and cannot be deleted")]
    ChapterInUse { count: usize },

    #[error("an active {entity} with the same name already exists; enabling failed")]
    ActiveSiblingExists { entity: &'static str },

    #[error("this subject already defines that internal question kind")]
    DuplicateInternalKind,

    #[error("a question type with the same sort order already exists in this subject")]
    DuplicateSortOrder,

    #[error("already the first entry; cannot move up")]
    AlreadyFirst,

    #[error("already the last entry; cannot move down")]
    AlreadyLast,

    #[error("approved tests cannot be deleted")]
    ApprovedTestUndeletable,

    #[error("the selection contains approved tests that cannot be deleted")]
    BatchContainsApproved,

    #[error("only rejected tests can be resubmitted")]
    NotRejected,

    #[error(transparent)]
    Exam(#[from] ExamError),
}

/// Errors emitted by the question bank.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question not found")]
    NotFound,

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Errors emitted by the exam session engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions resolved for the practice session")]
    NoQuestions,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
