use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{
    ChapterId, KnowledgePointId, ProjectId, QuestionTypeId, RuleId, SectionId, StageId, SubjectId,
};
use crate::model::question::QuestionKind;

/// Enablement status shared by the catalog entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Disabled,
}

impl EntityStatus {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            EntityStatus::Active => EntityStatus::Disabled,
            EntityStatus::Disabled => EntityStatus::Active,
        }
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, EntityStatus::Active)
    }
}

//
// ─── PROJECTS & SUBJECTS ───────────────────────────────────────────────────────
//

/// Top-level certification project (e.g. a professional title track).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

/// A subject under a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

//
// ─── CHAPTERS & SECTIONS ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub chapter_id: ChapterId,
    pub chapter_name: String,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

//
// ─── KNOWLEDGE POINTS ──────────────────────────────────────────────────────────
//

/// A tag linking questions to an examinable concept.
///
/// Names are stored trimmed; uniqueness is enforced case-insensitively by
/// the owning catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgePoint {
    pub id: KnowledgePointId,
    pub subject_id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub chapter_ids: Vec<ChapterId>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub creator_id: String,
}

//
// ─── LEARNING STAGES ───────────────────────────────────────────────────────────
//

/// A study phase under a subject (basics, practice, sprint, …).
///
/// `is_chapter_practice` marks the stage that hosts ad-hoc practice sets
/// rather than acting as a purely structural grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStage {
    pub id: StageId,
    pub subject_id: SubjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: u32,
    pub creator: String,
    pub status: EntityStatus,
    pub is_chapter_practice: bool,
    pub created_at: DateTime<Utc>,
}

//
// ─── QUESTION TYPE DEFINITIONS ─────────────────────────────────────────────────
//

/// Per-subject display configuration for a question kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTypeDef {
    pub id: QuestionTypeId,
    pub subject_id: SubjectId,
    /// The engine-level kind this definition maps onto.
    pub internal_kind: QuestionKind,
    /// Name shown to students in place of the internal kind.
    pub display_name: String,
    pub sort_order: u32,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

//
// ─── PAYMENT RULES ─────────────────────────────────────────────────────────────
//

/// Kind of entity a payment rule can gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicableObject {
    Question,
    Exam,
    Chapter,
    Subject,
}

/// An access/charging rule that catalog entities can reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRule {
    pub id: RuleId,
    /// Stable rule code (`T001`, `T002`, …) referenced by content records.
    pub code: String,
    pub display_name: String,
    pub applicable_to: Vec<ApplicableObject>,
    pub param_placeholder: String,
    pub description: String,
    pub status: EntityStatus,
    /// Lower values sort first.
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

impl PaymentRule {
    #[must_use]
    pub fn applies_to(&self, object: ApplicableObject) -> bool {
        self.applicable_to.contains(&object)
    }
}
