use std::collections::HashMap;

use chrono::{DateTime, Utc};
use exam_core::model::{EntityStatus, Exam, ExamForm, ExamId, StageId, SubjectId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;
use crate::pagination::{paginate, Page};

/// Optional filter dimensions for exam queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamFilter {
    pub subject_id: Option<SubjectId>,
    pub status: Option<EntityStatus>,
    /// Substring match on the exam name.
    pub name_keyword: Option<String>,
    pub learning_stage_id: Option<StageId>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl ExamFilter {
    fn matches(&self, exam: &Exam) -> bool {
        if let Some(subject_id) = &self.subject_id {
            if exam.subject_id() != subject_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if exam.status() != status {
                return false;
            }
        }
        if let Some(keyword) = &self.name_keyword {
            if !exam.name().contains(keyword.as_str()) {
                return false;
            }
        }
        if let Some(stage_id) = &self.learning_stage_id {
            if exam.learning_stage_id() != stage_id {
                return false;
            }
        }
        if let Some(from) = self.created_from {
            if exam.created_at() < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if exam.created_at() > to {
                return false;
            }
        }
        true
    }
}

/// In-memory store for assembled exams.
///
/// The total score of every exam is derived from its mandatory entries; the
/// store re-derives it on each write through the domain constructor.
pub struct ExamStore {
    clock: Clock,
    exams: HashMap<ExamId, Exam>,
    order: Vec<ExamId>,
}

impl ExamStore {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            exams: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn exam(&self, id: &ExamId) -> Option<&Exam> {
        self.exams.get(id)
    }

    /// Adds an exam.
    ///
    /// # Errors
    ///
    /// Returns the domain validation error for a malformed form.
    pub fn add_exam(
        &mut self,
        form: ExamForm,
        creator_id: impl Into<String>,
        creator_name: impl Into<String>,
    ) -> Result<Exam, CatalogError> {
        let id = ExamId::new(format!("exam-{}", Uuid::new_v4()));
        let exam = Exam::new(id, form, self.clock.now(), creator_id, creator_name)?;
        self.order.push(exam.id().clone());
        self.exams.insert(exam.id().clone(), exam.clone());
        Ok(exam)
    }

    /// Replaces an exam's editable fields, recomputing the total score.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or the domain validation error.
    pub fn update_exam(&mut self, id: &ExamId, form: ExamForm) -> Result<(), CatalogError> {
        let now = self.clock.now();
        let exam = self
            .exams
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "exam" })?;
        exam.apply_form(form, now)?;
        Ok(())
    }

    /// Deletes an exam.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_exam(&mut self, id: &ExamId) -> Result<(), CatalogError> {
        if self.exams.remove(id).is_none() {
            return Err(CatalogError::NotFound { entity: "exam" });
        }
        self.order.retain(|e| e != id);
        Ok(())
    }

    /// Removes every listed exam; unknown ids are skipped.
    pub fn delete_exams_batch(&mut self, ids: &[ExamId]) {
        for id in ids {
            self.exams.remove(id);
        }
        let exams = &self.exams;
        self.order.retain(|e| exams.contains_key(e));
    }

    /// Flips an exam's status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_exam_status(&mut self, id: &ExamId) -> Result<(), CatalogError> {
        let now = self.clock.now();
        let exam = self
            .exams
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "exam" })?;
        exam.toggle_status(now);
        Ok(())
    }

    /// True when no other exam of the subject carries this name.
    #[must_use]
    pub fn is_name_unique(
        &self,
        name: &str,
        subject_id: &SubjectId,
        exclude: Option<&ExamId>,
    ) -> bool {
        !self.exams.values().any(|exam| {
            exam.name() == name && exam.subject_id() == subject_id && Some(exam.id()) != exclude
        })
    }

    /// Exams matching a filter, in insertion order.
    #[must_use]
    pub fn filtered(&self, filter: &ExamFilter) -> Vec<&Exam> {
        self.order
            .iter()
            .filter_map(|id| self.exams.get(id))
            .filter(|exam| filter.matches(exam))
            .collect()
    }

    /// One page of the filtered set, in insertion order.
    #[must_use]
    pub fn paginated(&self, filter: &ExamFilter, page: usize, page_size: usize) -> Page<Exam> {
        let matches: Vec<Exam> = self.filtered(filter).into_iter().cloned().collect();
        paginate(matches, page, page_size)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
