use std::collections::HashMap;

use exam_core::model::{
    ChapterId, Difficulty, ExamId, KnowledgePointId, ProjectId, Question, QuestionForm,
    QuestionId, QuestionKind, QuestionSource, QuestionStatus, SubjectId,
};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::QuestionBankError;
use crate::pagination::{paginate, Page};

/// Optional filter dimensions for bank queries; all present dimensions must
/// match (conjunctive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionFilter {
    pub project_id: Option<ProjectId>,
    pub subject_id: Option<SubjectId>,
    pub chapter_id: Option<ChapterId>,
    pub kind: Option<QuestionKind>,
    pub source: Option<QuestionSource>,
    pub year: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub frequency: Option<String>,
    /// `None` means "all statuses".
    pub status: Option<QuestionStatus>,
    /// Substring match on the stem.
    pub keyword: Option<String>,
    pub knowledge_point_id: Option<KnowledgePointId>,
}

impl QuestionFilter {
    fn matches(&self, question: &Question) -> bool {
        if let Some(project_id) = &self.project_id {
            if question.project_id() != project_id {
                return false;
            }
        }
        if let Some(subject_id) = &self.subject_id {
            if question.subject_id() != subject_id {
                return false;
            }
        }
        if let Some(chapter_id) = &self.chapter_id {
            if question.chapter_id() != chapter_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if question.kind() != kind {
                return false;
            }
        }
        if let Some(source) = self.source {
            if question.source() != source {
                return false;
            }
        }
        if let Some(year) = &self.year {
            if question.year() != Some(year.as_str()) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if question.difficulty() != Some(difficulty) {
                return false;
            }
        }
        if let Some(frequency) = &self.frequency {
            if question.frequency() != Some(frequency.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if question.status() != status {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            if !question.stem().contains(keyword.as_str()) {
                return false;
            }
        }
        if let Some(point_id) = &self.knowledge_point_id {
            if !question.knowledge_point_ids().contains(point_id) {
                return false;
            }
        }
        true
    }
}

/// The in-memory question repository.
///
/// Questions live in a keyed map; an insertion-ordered id vector backs the
/// listings, and paginated queries re-sort by creation time descending.
pub struct QuestionBank {
    clock: Clock,
    questions: HashMap<QuestionId, Question>,
    order: Vec<QuestionId>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            questions: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    /// Adds a question from a form.
    ///
    /// # Errors
    ///
    /// Returns the underlying validation error for a malformed form.
    pub fn add_question(
        &mut self,
        form: QuestionForm,
        creator_id: impl Into<String>,
    ) -> Result<Question, QuestionBankError> {
        let id = QuestionId::new(format!("q-{}", Uuid::new_v4()));
        let question = Question::new(id, form, self.clock.now(), creator_id)?;
        self.order.push(question.id().clone());
        self.questions.insert(question.id().clone(), question.clone());
        Ok(question)
    }

    /// Replaces a question's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or the validation error for a
    /// malformed form.
    pub fn update_question(
        &mut self,
        id: &QuestionId,
        form: QuestionForm,
    ) -> Result<(), QuestionBankError> {
        let now = self.clock.now();
        let question = self
            .questions
            .get_mut(id)
            .ok_or(QuestionBankError::NotFound)?;
        question.apply_form(form, now)?;
        Ok(())
    }

    /// Removes a question outright.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::NotFound` for an unknown id.
    pub fn delete_question(&mut self, id: &QuestionId) -> Result<(), QuestionBankError> {
        if self.questions.remove(id).is_none() {
            return Err(QuestionBankError::NotFound);
        }
        self.order.retain(|q| q != id);
        Ok(())
    }

    /// Removes every listed question; unknown ids are skipped.
    pub fn delete_questions_batch(&mut self, ids: &[QuestionId]) {
        for id in ids {
            self.questions.remove(id);
        }
        let questions = &self.questions;
        self.order.retain(|q| questions.contains_key(q));
    }

    /// Flips a question between active and disabled.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::NotFound` for an unknown id.
    pub fn toggle_question_status(&mut self, id: &QuestionId) -> Result<(), QuestionBankError> {
        let now = self.clock.now();
        let question = self
            .questions
            .get_mut(id)
            .ok_or(QuestionBankError::NotFound)?;
        question.toggle_status(now);
        Ok(())
    }

    /// Soft-deletes a question, keeping the record for audit.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::NotFound` for an unknown id.
    pub fn soft_delete_question(
        &mut self,
        id: &QuestionId,
        reason: Option<String>,
    ) -> Result<(), QuestionBankError> {
        let now = self.clock.now();
        let question = self
            .questions
            .get_mut(id)
            .ok_or(QuestionBankError::NotFound)?;
        question.soft_delete(reason, now);
        Ok(())
    }

    /// Marks a question deprecated with a reason.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::NotFound` for an unknown id.
    pub fn deprecate_question(
        &mut self,
        id: &QuestionId,
        reason: impl Into<String>,
    ) -> Result<(), QuestionBankError> {
        let now = self.clock.now();
        let question = self
            .questions
            .get_mut(id)
            .ok_or(QuestionBankError::NotFound)?;
        question.deprecate(reason, now);
        Ok(())
    }

    /// True when no other question shares this stem within the same subject
    /// and chapter.
    #[must_use]
    pub fn is_unique(
        &self,
        stem: &str,
        subject_id: &SubjectId,
        chapter_id: &ChapterId,
        exclude: Option<&QuestionId>,
    ) -> bool {
        !self.questions.values().any(|q| {
            q.stem() == stem
                && q.subject_id() == subject_id
                && q.chapter_id() == chapter_id
                && Some(q.id()) != exclude
        })
    }

    /// Questions matching a filter, in insertion order.
    #[must_use]
    pub fn filtered(&self, filter: &QuestionFilter) -> Vec<&Question> {
        self.order
            .iter()
            .filter_map(|id| self.questions.get(id))
            .filter(|q| filter.matches(q))
            .collect()
    }

    /// One page of the filtered set, newest first.
    #[must_use]
    pub fn paginated(
        &self,
        filter: &QuestionFilter,
        page: usize,
        page_size: usize,
    ) -> Page<Question> {
        let mut matches = self.filtered(filter);
        matches.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        paginate(matches.into_iter().cloned().collect(), page, page_size)
    }

    /// Resolves ids to question snapshots, preserving the input order and
    /// silently dropping ids with no match.
    #[must_use]
    pub fn resolve_in_order(&self, ids: &[QuestionId]) -> Vec<Question> {
        ids.iter()
            .filter_map(|id| self.questions.get(id))
            .cloned()
            .collect()
    }

    /// Number of bank questions referencing a chapter; used by the chapter
    /// delete guard.
    #[must_use]
    pub fn count_by_chapter(&self, chapter_id: &ChapterId) -> usize {
        self.questions
            .values()
            .filter(|q| q.chapter_id() == chapter_id)
            .count()
    }

    /// Questions linked to one knowledge point, in insertion order.
    #[must_use]
    pub fn questions_by_knowledge_point(&self, point_id: &KnowledgePointId) -> Vec<&Question> {
        self.order
            .iter()
            .filter_map(|id| self.questions.get(id))
            .filter(|q| q.knowledge_point_ids().contains(point_id))
            .collect()
    }

    /// Links a question to a knowledge point.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::NotFound` for an unknown question.
    pub fn link_knowledge_point(
        &mut self,
        question_id: &QuestionId,
        point_id: KnowledgePointId,
    ) -> Result<(), QuestionBankError> {
        let question = self
            .questions
            .get_mut(question_id)
            .ok_or(QuestionBankError::NotFound)?;
        question.link_knowledge_point(point_id);
        Ok(())
    }

    /// Unlinks a question from a knowledge point.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::NotFound` for an unknown question.
    pub fn unlink_knowledge_point(
        &mut self,
        question_id: &QuestionId,
        point_id: &KnowledgePointId,
    ) -> Result<(), QuestionBankError> {
        let question = self
            .questions
            .get_mut(question_id)
            .ok_or(QuestionBankError::NotFound)?;
        question.unlink_knowledge_point(point_id);
        Ok(())
    }

    /// Strips a deleted knowledge point from every question referencing it.
    pub fn remove_knowledge_point_links(&mut self, point_id: &KnowledgePointId) {
        for question in self.questions.values_mut() {
            question.unlink_knowledge_point(point_id);
        }
    }

    /// Imports embedded exam questions into the bank.
    ///
    /// A candidate is skipped when an existing question already has the
    /// identical stem *and* chapter id. Candidates with an empty chapter id
    /// fall back to `default_chapter`. Returns the number of questions
    /// actually imported; candidates failing validation are logged and
    /// skipped rather than aborting the batch.
    pub fn import_from_exam(
        &mut self,
        exam_id: &ExamId,
        candidates: Vec<QuestionForm>,
        default_chapter: &ChapterId,
    ) -> usize {
        let mut imported = 0;

        for mut form in candidates {
            if form.chapter_id.as_str().is_empty() {
                form.chapter_id = default_chapter.clone();
            }

            let exists = self
                .questions
                .values()
                .any(|q| q.stem() == form.stem && q.chapter_id() == &form.chapter_id);
            if exists {
                continue;
            }

            let id = QuestionId::new(format!("q-exam-{}", Uuid::new_v4()));
            match Question::imported_from_exam(id, form, exam_id.clone(), self.clock.now()) {
                Ok(question) => {
                    self.order.push(question.id().clone());
                    self.questions.insert(question.id().clone(), question);
                    imported += 1;
                }
                Err(err) => {
                    tracing::warn!(exam = %exam_id, error = %err, "skipping invalid embedded question");
                }
            }
        }

        imported
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::Answer;
    use exam_core::time::fixed_clock;

    pub(crate) fn form_in_chapter(chapter: &ChapterId, stem: &str) -> QuestionForm {
        QuestionForm {
            project_id: ProjectId::new("p1"),
            subject_id: SubjectId::new("s1"),
            chapter_id: chapter.clone(),
            kind: QuestionKind::Single,
            source: QuestionSource::Official,
            year: Some("2025".into()),
            difficulty: Some(Difficulty::Medium),
            frequency: None,
            knowledge_point_ids: Vec::new(),
            stem: stem.into(),
            options: Vec::new(),
            answer: Answer::One("A".into()),
            explanation: String::new(),
            main_stem: None,
            sub_questions: Vec::new(),
            payment_rule_id: None,
            inherit_chapter_rule: false,
        }
    }

    /// A bank holding exactly one question in the given chapter, for the
    /// chapter-delete guard tests.
    pub(crate) fn bank_with_question_in_chapter(chapter: &ChapterId) -> QuestionBank {
        let mut bank = QuestionBank::new(fixed_clock());
        bank.add_question(form_in_chapter(chapter, "only question"), "admin")
            .unwrap();
        bank
    }

    fn chapter() -> ChapterId {
        ChapterId::new("ch-001")
    }

    #[test]
    fn filter_dimensions_are_conjunctive() {
        let mut bank = QuestionBank::new(fixed_clock());
        bank.add_question(form_in_chapter(&chapter(), "revenue question"), "admin")
            .unwrap();
        let mut other = form_in_chapter(&chapter(), "tax question");
        other.kind = QuestionKind::Judgment;
        other.answer = Answer::Bool(false);
        bank.add_question(other, "admin").unwrap();

        let by_kind = bank.filtered(&QuestionFilter {
            kind: Some(QuestionKind::Judgment),
            ..QuestionFilter::default()
        });
        assert_eq!(by_kind.len(), 1);
        assert_eq!(by_kind[0].stem(), "tax question");

        let by_kind_and_keyword = bank.filtered(&QuestionFilter {
            kind: Some(QuestionKind::Judgment),
            keyword: Some("revenue".into()),
            ..QuestionFilter::default()
        });
        assert!(by_kind_and_keyword.is_empty());
    }

    #[test]
    fn status_filter_none_means_all() {
        let mut bank = QuestionBank::new(fixed_clock());
        let q = bank
            .add_question(form_in_chapter(&chapter(), "one"), "admin")
            .unwrap();
        bank.toggle_question_status(q.id()).unwrap();

        assert_eq!(bank.filtered(&QuestionFilter::default()).len(), 1);
        assert!(bank
            .filtered(&QuestionFilter {
                status: Some(QuestionStatus::Active),
                ..QuestionFilter::default()
            })
            .is_empty());
    }

    #[test]
    fn pagination_sorts_newest_first() {
        let mut clock = fixed_clock();
        let mut bank = QuestionBank::new(clock);
        bank.add_question(form_in_chapter(&chapter(), "old"), "admin")
            .unwrap();

        clock.advance(Duration::hours(1));
        bank.clock = clock;
        bank.add_question(form_in_chapter(&chapter(), "new"), "admin")
            .unwrap();

        let page = bank.paginated(&QuestionFilter::default(), 1, 1);
        assert_eq!(page.data[0].stem(), "new");
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);

        let second = bank.paginated(&QuestionFilter::default(), 2, 1);
        assert_eq!(second.data[0].stem(), "old");
    }

    #[test]
    fn resolve_in_order_drops_misses_and_keeps_input_order() {
        let mut bank = QuestionBank::new(fixed_clock());
        let q5 = bank
            .add_question(form_in_chapter(&chapter(), "five"), "admin")
            .unwrap();
        let q1 = bank
            .add_question(form_in_chapter(&chapter(), "one"), "admin")
            .unwrap();

        let resolved = bank.resolve_in_order(&[
            q5.id().clone(),
            QuestionId::new("q9-missing"),
            q1.id().clone(),
        ]);
        let stems: Vec<&str> = resolved.iter().map(Question::stem).collect();
        assert_eq!(stems, vec!["five", "one"]);
    }

    #[test]
    fn uniqueness_is_scoped_to_stem_subject_and_chapter() {
        let mut bank = QuestionBank::new(fixed_clock());
        let q = bank
            .add_question(form_in_chapter(&chapter(), "shared stem"), "admin")
            .unwrap();

        assert!(!bank.is_unique("shared stem", &SubjectId::new("s1"), &chapter(), None));
        assert!(bank.is_unique("shared stem", &SubjectId::new("s1"), &chapter(), Some(q.id())));
        assert!(bank.is_unique("shared stem", &SubjectId::new("s2"), &chapter(), None));
        assert!(bank.is_unique("other stem", &SubjectId::new("s1"), &chapter(), None));
    }

    #[test]
    fn import_skips_same_stem_in_same_chapter() {
        let mut bank = QuestionBank::new(fixed_clock());
        bank.add_question(form_in_chapter(&chapter(), "duplicate stem"), "admin")
            .unwrap();

        let exam_id = ExamId::new("exam-1");
        let imported = bank.import_from_exam(
            &exam_id,
            vec![
                form_in_chapter(&chapter(), "duplicate stem"),
                form_in_chapter(&chapter(), "fresh stem"),
                // Same stem, different chapter: not a duplicate.
                form_in_chapter(&ChapterId::new("ch-002"), "duplicate stem"),
            ],
            &chapter(),
        );

        assert_eq!(imported, 2);
        assert_eq!(bank.len(), 3);
        let fresh = bank
            .filtered(&QuestionFilter {
                keyword: Some("fresh".into()),
                ..QuestionFilter::default()
            });
        assert_eq!(fresh[0].from_exam_id(), Some(&exam_id));
    }

    #[test]
    fn import_applies_the_default_chapter() {
        let mut bank = QuestionBank::new(fixed_clock());
        let mut form = form_in_chapter(&ChapterId::new(""), "needs chapter");
        form.chapter_id = ChapterId::new("");
        let imported = bank.import_from_exam(&ExamId::new("exam-1"), vec![form], &chapter());

        assert_eq!(imported, 1);
        assert_eq!(bank.count_by_chapter(&chapter()), 1);
    }

    #[test]
    fn knowledge_point_links_are_maintained() {
        let mut bank = QuestionBank::new(fixed_clock());
        let q = bank
            .add_question(form_in_chapter(&chapter(), "linked"), "admin")
            .unwrap();
        let point = KnowledgePointId::new("kp-001");

        bank.link_knowledge_point(q.id(), point.clone()).unwrap();
        bank.link_knowledge_point(q.id(), point.clone()).unwrap();
        assert_eq!(bank.questions_by_knowledge_point(&point).len(), 1);
        assert_eq!(
            bank.question(q.id()).unwrap().knowledge_point_ids().len(),
            1
        );

        bank.remove_knowledge_point_links(&point);
        assert!(bank.questions_by_knowledge_point(&point).is_empty());
    }

    #[test]
    fn batch_delete_ignores_unknown_ids() {
        let mut bank = QuestionBank::new(fixed_clock());
        let q = bank
            .add_question(form_in_chapter(&chapter(), "gone"), "admin")
            .unwrap();
        bank.delete_questions_batch(&[q.id().clone(), QuestionId::new("nope")]);
        assert!(bank.is_empty());
    }
}
