use std::collections::HashMap;

use exam_core::model::{
    MarkingExamKind, MarkingProgress, MarkingRecord, MarkingStatus, ProjectId, RecordId,
    ScoreStatistics, StudentScore, SubjectId, Teacher, TeacherId,
};
use rand::Rng;

use crate::error::CatalogError;
use crate::pagination::{paginate, Page};

/// Optional filter dimensions for marking queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkingFilter {
    pub project_id: Option<ProjectId>,
    pub subject_id: Option<SubjectId>,
    pub status: Option<MarkingStatus>,
    pub exam_kind: Option<MarkingExamKind>,
    /// Substring match on the exam name.
    pub name_keyword: Option<String>,
}

impl MarkingFilter {
    fn matches(&self, record: &MarkingRecord) -> bool {
        if let Some(project_id) = &self.project_id {
            if &record.project_id != project_id {
                return false;
            }
        }
        if let Some(subject_id) = &self.subject_id {
            if &record.subject_id != subject_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(kind) = self.exam_kind {
            if record.exam_kind != kind {
                return false;
            }
        }
        if let Some(keyword) = &self.name_keyword {
            if !record.exam_name.contains(keyword.as_str()) {
                return false;
            }
        }
        true
    }
}

/// The marking/review store.
///
/// Progress and score statistics are illustrative data derived on the fly —
/// there is no real grading pipeline behind them.
pub struct MarkingService {
    records: HashMap<RecordId, MarkingRecord>,
    order: Vec<RecordId>,
    teachers: Vec<Teacher>,
}

impl MarkingService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            teachers: Vec::new(),
        }
    }

    /// Seeds the store with records and a teacher roster.
    #[must_use]
    pub fn with_data(records: Vec<MarkingRecord>, teachers: Vec<Teacher>) -> Self {
        let mut service = Self::new();
        for record in records {
            service.order.push(record.id.clone());
            service.records.insert(record.id.clone(), record);
        }
        service.teachers = teachers;
        service
    }

    #[must_use]
    pub fn record(&self, id: &RecordId) -> Option<&MarkingRecord> {
        self.records.get(id)
    }

    #[must_use]
    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// Records matching a filter, in insertion order.
    #[must_use]
    pub fn filtered(&self, filter: &MarkingFilter) -> Vec<&MarkingRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|record| filter.matches(record))
            .collect()
    }

    /// One page of the filtered set.
    #[must_use]
    pub fn paginated(
        &self,
        filter: &MarkingFilter,
        page: usize,
        page_size: usize,
    ) -> Page<MarkingRecord> {
        let matches: Vec<MarkingRecord> = self.filtered(filter).into_iter().cloned().collect();
        paginate(matches, page, page_size)
    }

    /// Number of tracked exams, optionally narrowed by project/subject.
    #[must_use]
    pub fn exam_count(
        &self,
        project_id: Option<&ProjectId>,
        subject_id: Option<&SubjectId>,
    ) -> usize {
        self.records
            .values()
            .filter(|record| {
                project_id.is_none_or(|p| &record.project_id == p)
                    && subject_id.is_none_or(|s| &record.subject_id == s)
            })
            .count()
    }

    /// Assigns marking teachers to an exam and moves it into `Marking`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown exam.
    pub fn assign_task(
        &mut self,
        exam_id: &RecordId,
        teacher_ids: Vec<TeacherId>,
        assigned_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), CatalogError> {
        let record = self.records.get_mut(exam_id).ok_or(CatalogError::NotFound {
            entity: "marking record",
        })?;
        record.assigned_teachers = teacher_ids;
        record.status = MarkingStatus::Marking;
        record.updated_at = assigned_at;
        Ok(())
    }

    /// Progress derived from the exam status: pending 0%, marking 60%,
    /// completed 100%.
    #[must_use]
    pub fn progress(&self, exam_id: &RecordId) -> Option<MarkingProgress> {
        let record = self.records.get(exam_id)?;

        let marked_count = match record.status {
            MarkingStatus::Marking => record.participant_count * 6 / 10,
            MarkingStatus::Completed => record.participant_count,
            MarkingStatus::Draft | MarkingStatus::Pending => 0,
        };
        let unmarked_count = record.participant_count - marked_count;
        let progress = if record.participant_count == 0 {
            0
        } else {
            (f64::from(marked_count) / f64::from(record.participant_count) * 100.0).round() as u32
        };

        Some(MarkingProgress {
            exam_id: exam_id.clone(),
            total_count: record.participant_count,
            marked_count,
            unmarked_count,
            progress,
        })
    }

    /// Mock score sheet for a completed exam; any other status yields
    /// `None`. Totals are drawn uniformly from 60..100, split 60/40 into
    /// objective and subjective parts, and ranked by descending total.
    #[must_use]
    pub fn score_statistics(&self, exam_id: &RecordId) -> Option<ScoreStatistics> {
        let record = self.records.get(exam_id)?;
        if record.status != MarkingStatus::Completed {
            return None;
        }

        let mut rng = rand::rng();
        let mut scores: Vec<StudentScore> = (1..=record.participant_count)
            .map(|i| {
                let total_score: u32 = rng.random_range(60..100);
                StudentScore {
                    student_id: format!("student-{i}"),
                    student_name: format!("Student {i}"),
                    total_score,
                    objective_score: total_score * 6 / 10,
                    subjective_score: total_score * 4 / 10,
                    rank: 0,
                    is_passed: total_score >= record.passing_score,
                    submitted_at: record.created_at,
                    marked_at: record.updated_at,
                }
            })
            .collect();

        scores.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        for (index, score) in scores.iter_mut().enumerate() {
            score.rank = index as u32 + 1;
        }

        let count = scores.len();
        if count == 0 {
            return None;
        }
        let sum: u32 = scores.iter().map(|s| s.total_score).sum();
        let average_score = round1(f64::from(sum) / count as f64);
        let highest_score = scores.iter().map(|s| s.total_score).max().unwrap_or(0);
        let lowest_score = scores.iter().map(|s| s.total_score).min().unwrap_or(0);
        let passed = scores.iter().filter(|s| s.is_passed).count();
        let pass_rate = round1(passed as f64 / count as f64 * 100.0);

        Some(ScoreStatistics {
            exam_id: exam_id.clone(),
            average_score,
            highest_score,
            lowest_score,
            pass_rate,
            scores,
        })
    }
}

impl Default for MarkingService {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_precision_loss)]
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
