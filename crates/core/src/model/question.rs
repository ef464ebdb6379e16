use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{ChapterId, ExamId, KnowledgePointId, ProjectId, QuestionId, RuleId, SubjectId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question stem cannot be empty")]
    EmptyStem,

    #[error("{kind} questions require a {expected} answer")]
    AnswerShape {
        kind: QuestionKind,
        expected: &'static str,
    },

    #[error("judgment answers must be \"true\" or \"false\"")]
    InvalidJudgmentAnswer,

    #[error("sub-question {index}: {source}")]
    SubQuestion {
        index: usize,
        source: Box<QuestionError>,
    },
}

//
// ─── KIND / SOURCE / DIFFICULTY ────────────────────────────────────────────────
//

/// The answering mode of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
    /// Multiple-style question where the number of correct options is not told.
    Uncertain,
    Judgment,
    Essay,
    Combination,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
            QuestionKind::Uncertain => "uncertain",
            QuestionKind::Judgment => "judgment",
            QuestionKind::Essay => "essay",
            QuestionKind::Combination => "combination",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    Official,
    Simulation,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Lifecycle status of a bank question.
///
/// `Deleted` and `Deprecated` keep the record around for audit; only
/// `Active` questions are served to new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Active,
    Disabled,
    Deleted,
    Deprecated,
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A reference or submitted answer value.
///
/// Mirrors the persisted union of the answer slot: a judgment flag, a set of
/// option labels, or a single scalar (an option label or free text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Many(Vec<String>),
    One(String),
}

impl Answer {
    /// Normalizes the value to a judgment boolean.
    ///
    /// Only the boolean `true` and the literal string `"true"` count as
    /// affirmative; every other value (including label arrays) is `false`.
    #[must_use]
    pub fn as_judgment(&self) -> bool {
        match self {
            Answer::Bool(value) => *value,
            Answer::One(value) => value == "true",
            Answer::Many(_) => false,
        }
    }

    /// Coerces the value to a list of option labels, wrapping scalars.
    #[must_use]
    pub fn to_labels(&self) -> Vec<String> {
        match self {
            Answer::Many(values) => values.clone(),
            Answer::One(value) => vec![value.clone()],
            Answer::Bool(value) => vec![value.to_string()],
        }
    }
}

//
// ─── OPTIONS / SUB-QUESTIONS ───────────────────────────────────────────────────
//

/// One selectable option of an objective question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Option label shown to the student (`A`, `B`, …).
    pub label: String,
    pub content: String,
}

/// An independent mini-question inside a combination question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestion {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    pub answer: Answer,
    pub explanation: String,
}

//
// ─── FORM ──────────────────────────────────────────────────────────────────────
//

/// The write model for creating or replacing a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionForm {
    pub project_id: ProjectId,
    pub subject_id: SubjectId,
    pub chapter_id: ChapterId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub source: QuestionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default)]
    pub knowledge_point_ids: Vec<KnowledgePointId>,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    pub answer: Answer,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_stem: Option<String>,
    #[serde(default)]
    pub sub_questions: Vec<SubQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_rule_id: Option<RuleId>,
    #[serde(default)]
    pub inherit_chapter_rule: bool,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A bank question.
///
/// The answer shape is validated against the question kind on construction
/// and on every form update; a session treats questions as immutable
/// snapshots after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    project_id: ProjectId,
    subject_id: SubjectId,
    chapter_id: ChapterId,
    #[serde(rename = "type")]
    kind: QuestionKind,
    source: QuestionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency: Option<String>,
    #[serde(default)]
    knowledge_point_ids: Vec<KnowledgePointId>,
    stem: String,
    #[serde(default)]
    options: Vec<QuestionOption>,
    answer: Answer,
    explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    main_stem: Option<String>,
    #[serde(default)]
    sub_questions: Vec<SubQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payment_rule_id: Option<RuleId>,
    #[serde(default)]
    inherit_chapter_rule: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_exam_id: Option<ExamId>,
    status: QuestionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deprecated_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deprecated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: String,
}

impl Question {
    /// Creates a new question from a form.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyStem` for a blank stem, or an
    /// answer-shape error when the answer does not match the question kind
    /// (sub-questions included).
    pub fn new(
        id: QuestionId,
        form: QuestionForm,
        created_at: DateTime<Utc>,
        creator_id: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        validate_form(&form)?;

        Ok(Self {
            id,
            project_id: form.project_id,
            subject_id: form.subject_id,
            chapter_id: form.chapter_id,
            kind: form.kind,
            source: form.source,
            year: form.year,
            difficulty: form.difficulty,
            frequency: form.frequency,
            knowledge_point_ids: form.knowledge_point_ids,
            stem: form.stem,
            options: form.options,
            answer: form.answer,
            explanation: form.explanation,
            main_stem: form.main_stem,
            sub_questions: form.sub_questions,
            payment_rule_id: form.payment_rule_id,
            inherit_chapter_rule: form.inherit_chapter_rule,
            from_exam_id: None,
            status: QuestionStatus::Active,
            deprecated_reason: None,
            deprecated_at: None,
            created_at,
            updated_at: created_at,
            creator_id: creator_id.into(),
        })
    }

    /// Creates a question imported from an exam, recording the source exam id.
    ///
    /// # Errors
    ///
    /// Same validation as [`Question::new`].
    pub fn imported_from_exam(
        id: QuestionId,
        form: QuestionForm,
        from_exam_id: ExamId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let mut question = Self::new(id, form, created_at, "system")?;
        question.from_exam_id = Some(from_exam_id);
        Ok(question)
    }

    /// Replaces the editable fields from a form and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Same validation as [`Question::new`].
    pub fn apply_form(
        &mut self,
        form: QuestionForm,
        now: DateTime<Utc>,
    ) -> Result<(), QuestionError> {
        validate_form(&form)?;

        self.project_id = form.project_id;
        self.subject_id = form.subject_id;
        self.chapter_id = form.chapter_id;
        self.kind = form.kind;
        self.source = form.source;
        self.year = form.year;
        self.difficulty = form.difficulty;
        self.frequency = form.frequency;
        self.knowledge_point_ids = form.knowledge_point_ids;
        self.stem = form.stem;
        self.options = form.options;
        self.answer = form.answer;
        self.explanation = form.explanation;
        self.main_stem = form.main_stem;
        self.sub_questions = form.sub_questions;
        self.payment_rule_id = form.payment_rule_id;
        self.inherit_chapter_rule = form.inherit_chapter_rule;
        self.updated_at = now;
        Ok(())
    }

    /// Flips between `Active` and `Disabled`; soft-deleted and deprecated
    /// questions are left alone.
    pub fn toggle_status(&mut self, now: DateTime<Utc>) {
        self.status = match self.status {
            QuestionStatus::Active => QuestionStatus::Disabled,
            QuestionStatus::Disabled => QuestionStatus::Active,
            other => other,
        };
        self.updated_at = now;
    }

    /// Marks the question soft-deleted, keeping the record for audit.
    pub fn soft_delete(&mut self, reason: Option<String>, now: DateTime<Utc>) {
        self.status = QuestionStatus::Deleted;
        self.deprecated_reason = reason;
        self.deprecated_at = Some(now);
        self.updated_at = now;
    }

    /// Marks the question deprecated with a mandatory reason.
    pub fn deprecate(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = QuestionStatus::Deprecated;
        self.deprecated_reason = Some(reason.into());
        self.deprecated_at = Some(now);
        self.updated_at = now;
    }

    /// Removes a knowledge-point link if present.
    pub fn unlink_knowledge_point(&mut self, point_id: &KnowledgePointId) {
        self.knowledge_point_ids.retain(|id| id != point_id);
    }

    /// Adds a knowledge-point link; duplicates are ignored.
    pub fn link_knowledge_point(&mut self, point_id: KnowledgePointId) {
        if !self.knowledge_point_ids.contains(&point_id) {
            self.knowledge_point_ids.push(point_id);
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
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
    pub fn chapter_id(&self) -> &ChapterId {
        &self.chapter_id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn source(&self) -> QuestionSource {
        self.source
    }

    #[must_use]
    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn frequency(&self) -> Option<&str> {
        self.frequency.as_deref()
    }

    #[must_use]
    pub fn knowledge_point_ids(&self) -> &[KnowledgePointId] {
        &self.knowledge_point_ids
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn main_stem(&self) -> Option<&str> {
        self.main_stem.as_deref()
    }

    #[must_use]
    pub fn sub_questions(&self) -> &[SubQuestion] {
        &self.sub_questions
    }

    #[must_use]
    pub fn payment_rule_id(&self) -> Option<&RuleId> {
        self.payment_rule_id.as_ref()
    }

    #[must_use]
    pub fn inherit_chapter_rule(&self) -> bool {
        self.inherit_chapter_rule
    }

    #[must_use]
    pub fn from_exam_id(&self) -> Option<&ExamId> {
        self.from_exam_id.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> QuestionStatus {
        self.status
    }

    #[must_use]
    pub fn deprecated_reason(&self) -> Option<&str> {
        self.deprecated_reason.as_deref()
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
    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }
}

fn validate_form(form: &QuestionForm) -> Result<(), QuestionError> {
    if form.stem.trim().is_empty() {
        return Err(QuestionError::EmptyStem);
    }
    validate_answer_shape(form.kind, &form.answer)?;
    for (index, sub) in form.sub_questions.iter().enumerate() {
        validate_answer_shape(sub.kind, &sub.answer)
            .map_err(|source| QuestionError::SubQuestion {
                index,
                source: Box::new(source),
            })?;
    }
    Ok(())
}

/// Checks that an answer value has the shape its question kind calls for:
/// scalar for single/judgment/essay, label array for multiple/uncertain.
pub fn validate_answer_shape(kind: QuestionKind, answer: &Answer) -> Result<(), QuestionError> {
    match kind {
        QuestionKind::Single | QuestionKind::Essay => match answer {
            Answer::One(_) => Ok(()),
            _ => Err(QuestionError::AnswerShape {
                kind,
                expected: "single scalar",
            }),
        },
        QuestionKind::Judgment => match answer {
            Answer::Bool(_) => Ok(()),
            Answer::One(value) if value == "true" || value == "false" => Ok(()),
            Answer::One(_) => Err(QuestionError::InvalidJudgmentAnswer),
            Answer::Many(_) => Err(QuestionError::AnswerShape {
                kind,
                expected: "scalar",
            }),
        },
        QuestionKind::Multiple | QuestionKind::Uncertain => match answer {
            Answer::Many(_) => Ok(()),
            _ => Err(QuestionError::AnswerShape {
                kind,
                expected: "label array",
            }),
        },
        // Combination answers live on the sub-questions; the main slot is free-form.
        QuestionKind::Combination => Ok(()),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
