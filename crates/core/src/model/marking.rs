use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ProjectId, RecordId, SubjectId, TeacherId};

/// Lifecycle of an exam inside the marking workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkingStatus {
    Draft,
    Pending,
    Marking,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkingExamKind {
    Formal,
    Practice,
    Mock,
}

/// How the marked paper was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperGeneration {
    Manual,
    Random,
    Template,
}

/// One exam occurrence tracked by the marking module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingRecord {
    pub id: RecordId,
    pub exam_name: String,
    pub exam_kind: MarkingExamKind,
    pub paper_generation: PaperGeneration,
    /// Minutes; descriptive only.
    pub duration: u32,
    pub total_score: u32,
    pub passing_score: u32,
    pub participant_count: u32,
    pub status: MarkingStatus,
    pub project_id: ProjectId,
    pub subject_id: SubjectId,
    #[serde(default)]
    pub assigned_teachers: Vec<TeacherId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub email: String,
    pub department: String,
}

/// How far the marking of one exam has progressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingProgress {
    pub exam_id: RecordId,
    pub total_count: u32,
    pub marked_count: u32,
    pub unmarked_count: u32,
    /// Whole percent, 0–100.
    pub progress: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentScore {
    pub student_id: String,
    pub student_name: String,
    pub total_score: u32,
    pub objective_score: u32,
    pub subjective_score: u32,
    pub rank: u32,
    pub is_passed: bool,
    pub submitted_at: DateTime<Utc>,
    pub marked_at: DateTime<Utc>,
}

/// Aggregate score sheet for a completed exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStatistics {
    pub exam_id: RecordId,
    pub average_score: f64,
    pub highest_score: u32,
    pub lowest_score: u32,
    /// Percent with one decimal.
    pub pass_rate: f64,
    pub scores: Vec<StudentScore>,
}
