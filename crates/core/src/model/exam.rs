use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::catalog::EntityStatus;
use crate::model::ids::{ChapterId, ExamId, PaperId, ProjectId, QuestionId, StageId, SubjectId, TestId};
use crate::model::question::QuestionKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam name cannot be empty")]
    EmptyName,
}

//
// ─── ASSEMBLED EXAMS ───────────────────────────────────────────────────────────
//

/// One slot of an assembled exam: a question reference with its score weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub question_id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub score: u32,
    pub order: u32,
    pub is_optional: bool,
}

/// The write model for creating or replacing an assembled exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamForm {
    pub name: String,
    pub project_id: ProjectId,
    pub subject_id: SubjectId,
    pub learning_stage_id: StageId,
    pub passing_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_to: String,
    pub questions: Vec<ExamQuestion>,
}

/// An exam paper assembled from bank questions.
///
/// `total_score` is derived state: the sum of the mandatory entries' scores,
/// recomputed whenever the question list changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    id: ExamId,
    name: String,
    project_id: ProjectId,
    subject_id: SubjectId,
    learning_stage_id: StageId,
    total_score: u32,
    passing_score: u32,
    year: i32,
    valid_from: String,
    valid_to: String,
    questions: Vec<ExamQuestion>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: String,
    creator_name: String,
    status: EntityStatus,
}

impl Exam {
    /// Creates a new exam, computing the total score from mandatory entries.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyName` for a blank name.
    pub fn new(
        id: ExamId,
        form: ExamForm,
        created_at: DateTime<Utc>,
        creator_id: impl Into<String>,
        creator_name: impl Into<String>,
    ) -> Result<Self, ExamError> {
        if form.name.trim().is_empty() {
            return Err(ExamError::EmptyName);
        }

        let total_score = mandatory_total(&form.questions);
        Ok(Self {
            id,
            name: form.name,
            project_id: form.project_id,
            subject_id: form.subject_id,
            learning_stage_id: form.learning_stage_id,
            total_score,
            passing_score: form.passing_score,
            year: form.year.unwrap_or_else(|| default_year(created_at)),
            valid_from: form.valid_from,
            valid_to: form.valid_to,
            questions: form.questions,
            created_at,
            updated_at: created_at,
            creator_id: creator_id.into(),
            creator_name: creator_name.into(),
            status: EntityStatus::Active,
        })
    }

    /// Replaces the editable fields and recomputes the mandatory total.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyName` for a blank name.
    pub fn apply_form(&mut self, form: ExamForm, now: DateTime<Utc>) -> Result<(), ExamError> {
        if form.name.trim().is_empty() {
            return Err(ExamError::EmptyName);
        }

        self.name = form.name;
        self.project_id = form.project_id;
        self.subject_id = form.subject_id;
        self.learning_stage_id = form.learning_stage_id;
        self.passing_score = form.passing_score;
        if let Some(year) = form.year {
            self.year = year;
        }
        self.valid_from = form.valid_from;
        self.valid_to = form.valid_to;
        self.total_score = mandatory_total(&form.questions);
        self.questions = form.questions;
        self.updated_at = now;
        Ok(())
    }

    pub fn toggle_status(&mut self, now: DateTime<Utc>) {
        self.status = self.status.toggled();
        self.updated_at = now;
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &ExamId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    #[must_use]
    pub fn learning_stage_id(&self) -> &StageId {
        &self.learning_stage_id
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    #[must_use]
    pub fn passing_score(&self) -> u32 {
        self.passing_score
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn valid_from(&self) -> &str {
        &self.valid_from
    }

    #[must_use]
    pub fn valid_to(&self) -> &str {
        &self.valid_to
    }

    #[must_use]
    pub fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn status(&self) -> EntityStatus {
        self.status
    }

    #[must_use]
    pub fn creator_name(&self) -> &str {
        &self.creator_name
    }
}

fn mandatory_total(questions: &[ExamQuestion]) -> u32 {
    questions
        .iter()
        .filter(|q| !q.is_optional)
        .map(|q| q.score)
        .sum()
}

fn default_year(at: DateTime<Utc>) -> i32 {
    use chrono::Datelike;
    at.year()
}

//
// ─── CHAPTER PAPERS ────────────────────────────────────────────────────────────
//

/// A practice paper attached to a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: PaperId,
    pub chapter_id: ChapterId,
    pub chapter_name: String,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_chapter_practice: bool,
}

//
// ─── SCHEDULED TESTS ───────────────────────────────────────────────────────────
//

/// Delivery category of a scheduled test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Formal,
    Mock,
    Practice,
    Quiz,
}

/// Review state of a scheduled test. Only rejected tests can be resubmitted
/// and approved tests can no longer be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// The write model for a scheduled test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTestForm {
    pub name: String,
    pub kind: TestKind,
    pub total_score: u32,
    pub passing_score: u32,
    /// Duration in minutes; descriptive metadata, never enforced.
    pub duration: u32,
    pub start_time: String,
    pub end_time: String,
    pub subject_id: SubjectId,
    pub project_id: ProjectId,
    pub exam_paper_id: ExamId,
    #[serde(default)]
    pub show_answer: bool,
    #[serde(default)]
    pub show_explanation: bool,
    #[serde(default)]
    pub show_score: bool,
    /// 0 means unlimited attempts.
    #[serde(default)]
    pub attempt_limit: u32,
}

/// A test occurrence published to students, gated by an approval workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTest {
    pub id: TestId,
    #[serde(flatten)]
    pub form: ScheduledTestForm,
    pub review: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator_id: String,
    pub creator_name: String,
}
