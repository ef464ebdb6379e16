use std::sync::Arc;

use exam_core::judge::{self, ScoreReport};
use exam_core::model::{
    Answer, AnswerSheet, ExamId, ExamKind, ExamSession, Question, QuestionId, SessionStatistics,
    SettingsUpdate, SubjectId, UserAnswer,
};
use exam_core::Clock;
use storage::repository::{
    CorrectCountRepository, RemovalPolicyRepository, SessionStateRepository, Storage, StorageError,
};

use crate::error::SessionError;
use crate::question_bank::QuestionBank;
use crate::sessions::RemovalNotifier;

/// The exam-taking controller: owns the single active attempt and its
/// answer sheet, and writes both to the durable session slot on every
/// state change so a process restart can resume mid-attempt.
///
/// Exactly one session is live at a time; starting a new exam overwrites
/// the previous one. Operations on a missing session, answers for unknown
/// questions, and out-of-range navigation are silent no-ops — only storage
/// failures surface as errors.
pub struct ExamSessionService {
    clock: Clock,
    state: Arc<dyn SessionStateRepository>,
    counters: Arc<dyn CorrectCountRepository>,
    policy: Arc<dyn RemovalPolicyRepository>,
    notifier: Arc<dyn RemovalNotifier>,
    session: Option<ExamSession>,
    answers: AnswerSheet,
}

impl ExamSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        state: Arc<dyn SessionStateRepository>,
        counters: Arc<dyn CorrectCountRepository>,
        policy: Arc<dyn RemovalPolicyRepository>,
        notifier: Arc<dyn RemovalNotifier>,
    ) -> Self {
        Self {
            clock,
            state,
            counters,
            policy,
            notifier,
            session: None,
            answers: AnswerSheet::new(),
        }
    }

    /// Convenience constructor over a [`Storage`] aggregate.
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage, notifier: Arc<dyn RemovalNotifier>) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.session_state),
            Arc::clone(&storage.correct_counts),
            Arc::clone(&storage.removal_policy),
            notifier,
        )
    }

    //
    // ─── RECOVERY ──────────────────────────────────────────────────────────
    //

    /// Reinstalls the persisted session and answers, if any.
    ///
    /// A malformed slot is downgraded to "no prior session": the engine
    /// logs a warning and keeps running empty, since the slot is rewritten
    /// wholesale on the next start anyway. Returns whether a session was
    /// installed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for backend failures (as opposed to
    /// parse failures).
    pub async fn restore(&mut self) -> Result<bool, SessionError> {
        match self.state.load_session().await {
            Ok(Some((session, answers))) => {
                self.session = Some(session);
                self.answers = answers;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(StorageError::Serialization(message)) => {
                tracing::warn!(%message, "persisted session did not parse; starting fresh");
                self.session = None;
                self.answers = AnswerSheet::new();
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────
    //

    /// Starts a new attempt, discarding any previous session and answers.
    ///
    /// The question list is snapshotted as passed — emptiness is the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting the fresh session fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn start_exam(
        &mut self,
        exam_id: ExamId,
        kind: ExamKind,
        title: impl Into<String>,
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        questions: Vec<Question>,
        start_index: usize,
    ) -> Result<(), SessionError> {
        self.session = Some(ExamSession::new(
            exam_id,
            kind,
            title,
            subject_id,
            subject_name,
            questions,
            start_index,
            self.clock.now(),
        ));
        self.answers.clear();
        self.persist().await
    }

    /// Builds a wrong-question drill from the given ids.
    ///
    /// Ids are resolved against the bank in input order; ids with no match
    /// are dropped. The session starts at `start_index` with kind
    /// `wrongQuestions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` when nothing resolves, or
    /// `SessionError::Storage` when persisting fails.
    pub async fn start_wrong_questions_practice(
        &mut self,
        question_ids: &[QuestionId],
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        title: Option<String>,
        start_index: usize,
        bank: &QuestionBank,
    ) -> Result<(), SessionError> {
        let questions = bank.resolve_in_order(question_ids);
        if questions.is_empty() {
            tracing::warn!("wrong-question practice requested but no questions resolved");
            return Err(SessionError::NoQuestions);
        }

        let millis = self.clock.now().timestamp_millis();
        let exam_id = match question_ids.get(start_index) {
            Some(from) if start_index > 0 => ExamId::new(format!("wrong-from-{from}-{millis}")),
            _ => ExamId::new(format!("wrong-all-{millis}")),
        };
        let title = title
            .unwrap_or_else(|| format!("Wrong-question drill ({} questions)", questions.len()));

        self.start_exam(
            exam_id,
            ExamKind::WrongQuestions,
            title,
            subject_id,
            subject_name,
            questions,
            start_index,
        )
        .await
    }

    /// Marks the attempt submitted and returns the score sheet.
    ///
    /// Submitting again on a completed session is allowed and moves the end
    /// timestamp forward. With no active session this is a no-op returning
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting fails.
    pub async fn submit_exam(&mut self) -> Result<Option<ScoreReport>, SessionError> {
        let now = self.clock.now();
        let Some(session) = &mut self.session else {
            return Ok(None);
        };
        session.complete(now);
        self.persist().await?;
        Ok(self.calculate_score())
    }

    /// Rewinds the current attempt over the same question list: answers are
    /// wiped, the index returns to zero, and the start timestamp resets.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting fails.
    pub async fn reset_exam(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        self.answers.clear();
        session.reset(now);
        self.persist().await
    }

    /// Discards the session and answers from memory and from storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if clearing the slot fails.
    pub async fn clear_session(&mut self) -> Result<(), SessionError> {
        self.session = None;
        self.answers.clear();
        self.state.clear_session().await?;
        Ok(())
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────
    //

    /// Judges and records an answer, overwriting any earlier record for the
    /// question, then runs the wrong-question auto-removal side channel.
    ///
    /// Without an active session, or for a question id outside the session
    /// snapshot, this silently does nothing. The side channel never fails
    /// the save: its errors are logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting the answer fails.
    pub async fn save_answer(
        &mut self,
        question_id: &QuestionId,
        answer: Option<Answer>,
    ) -> Result<(), SessionError> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        let Some(question) = session.question(question_id) else {
            return Ok(());
        };

        let verdict = judge::evaluate(question, answer.as_ref());
        self.answers.record(UserAnswer {
            question_id: question_id.clone(),
            answer,
            is_correct: verdict.is_correct,
            is_partial: verdict.is_partial,
            answered_at: self.clock.now(),
        });
        self.persist().await?;

        if let Err(err) = self.auto_remove(question_id, verdict.is_correct).await {
            tracing::warn!(question = %question_id, error = %err, "wrong-question auto-removal skipped");
        }
        Ok(())
    }

    /// The wrong-question auto-removal sub-algorithm. Independent of the
    /// session state machine; any failure here is the caller's to swallow.
    async fn auto_remove(
        &self,
        question_id: &QuestionId,
        is_correct: bool,
    ) -> Result<(), StorageError> {
        let Some(policy) = self.policy.policy().await? else {
            return Ok(());
        };
        if !policy.enabled {
            return Ok(());
        }
        let required = policy.remove_after.max(1);

        let current = self.counters.correct_count(question_id).await?;
        if is_correct {
            let next = current + 1;
            if next >= required {
                tracing::debug!(question = %question_id, streak = next, "correct streak reached; removing from wrong-question list");
                self.counters.clear_correct_count(question_id).await?;
                self.notifier.wrong_question_removed(question_id);
            } else {
                tracing::debug!(question = %question_id, streak = next, required, "correct streak advanced");
                self.counters.set_correct_count(question_id, next).await?;
            }
        } else if current > 0 {
            tracing::debug!(question = %question_id, "answered wrong; correct streak reset");
            self.counters.clear_correct_count(question_id).await?;
        }
        Ok(())
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────
    //

    /// Jumps to a question by index; out-of-range requests do nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting fails.
    pub async fn go_to_question(&mut self, index: usize) -> Result<(), SessionError> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        if session.go_to(index) {
            self.persist().await?;
        }
        Ok(())
    }

    /// Steps back one question if possible.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting fails.
    pub async fn previous_question(&mut self) -> Result<(), SessionError> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        if session.previous() {
            self.persist().await?;
        }
        Ok(())
    }

    /// Steps forward one question if possible.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting fails.
    pub async fn next_question(&mut self) -> Result<(), SessionError> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        if session.next() {
            self.persist().await?;
        }
        Ok(())
    }

    /// Merges a settings update into the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisting fails.
    pub async fn update_settings(&mut self, update: SettingsUpdate) -> Result<(), SessionError> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        session.update_settings(update);
        self.persist().await
    }

    //
    // ─── VIEWS ─────────────────────────────────────────────────────────────
    //

    /// Live tally over the session's questions and the answer sheet,
    /// recomputed on every call.
    #[must_use]
    pub fn statistics(&self) -> SessionStatistics {
        match &self.session {
            Some(session) => self.answers.statistics(session.questions()),
            None => SessionStatistics::default(),
        }
    }

    /// Score sheet for the current answers; `None` without a session. Uses
    /// the end timestamp when the attempt is submitted, "so far" otherwise.
    #[must_use]
    pub fn calculate_score(&self) -> Option<ScoreReport> {
        let session = self.session.as_ref()?;
        let stats = self.answers.statistics(session.questions());
        Some(judge::score_report(
            &stats,
            session.started_at(),
            session.ended_at(),
            self.clock.now(),
        ))
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref()?.current_question()
    }

    /// True while a session exists that has not been submitted.
    #[must_use]
    pub fn has_unfinished_session(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.is_completed())
    }

    #[must_use]
    pub fn session(&self) -> Option<&ExamSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    async fn persist(&self) -> Result<(), SessionError> {
        if let Some(session) = &self.session {
            self.state.save_session(session, &self.answers).await?;
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_bank::tests::form_in_chapter;
    use crate::sessions::{CollectingNotifier, NoopRemovalNotifier};
    use exam_core::model::{ChapterId, QuestionForm, QuestionKind};
    use exam_core::time::{fixed_clock, fixed_now};
    use storage::repository::{AutoRemovePolicy, InMemoryStateStore, ANSWERS_KEY, SESSION_KEY};

    fn question(id: &str, kind: QuestionKind, answer: Answer) -> Question {
        let mut form: QuestionForm = form_in_chapter(&ChapterId::new("ch-001"), &format!("stem {id}"));
        form.kind = kind;
        form.answer = answer;
        Question::new(QuestionId::new(id), form, fixed_now(), "admin").unwrap()
    }

    fn questions() -> Vec<Question> {
        vec![
            question("q1", QuestionKind::Single, Answer::One("A".into())),
            question(
                "q2",
                QuestionKind::Multiple,
                Answer::Many(vec!["A".into(), "C".into(), "D".into()]),
            ),
            question("q3", QuestionKind::Judgment, Answer::One("false".into())),
            question("q4", QuestionKind::Essay, Answer::One("cash flow".into())),
        ]
    }

    struct Harness {
        engine: ExamSessionService,
        store: InMemoryStateStore,
        notifier: CollectingNotifier,
    }

    fn harness() -> Harness {
        let store = InMemoryStateStore::new();
        let notifier = CollectingNotifier::new();
        let engine = ExamSessionService::new(
            fixed_clock(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
        );
        Harness {
            engine,
            store,
            notifier,
        }
    }

    async fn started(h: &mut Harness) {
        h.engine
            .start_exam(
                ExamId::new("exam-1"),
                ExamKind::Chapter,
                "Chapter drill",
                SubjectId::new("s1"),
                "Strategy",
                questions(),
                0,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn start_exam_persists_both_slots() {
        let mut h = harness();
        started(&mut h).await;

        assert!(h.store.get_raw(SESSION_KEY).is_some());
        assert!(h.store.get_raw(ANSWERS_KEY).is_some());
        assert!(h.engine.has_unfinished_session());
        assert_eq!(h.engine.statistics().total, 4);
    }

    #[tokio::test]
    async fn save_answer_ignores_unknown_questions_and_no_session() {
        let mut h = harness();
        // No session yet: nothing happens.
        h.engine
            .save_answer(&QuestionId::new("q1"), Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert!(h.engine.answers().is_empty());

        started(&mut h).await;
        h.engine
            .save_answer(&QuestionId::new("ghost"), Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert!(h.engine.answers().is_empty());
    }

    #[tokio::test]
    async fn re_answering_overwrites_the_record() {
        let mut h = harness();
        started(&mut h).await;
        let q1 = QuestionId::new("q1");

        h.engine
            .save_answer(&q1, Some(Answer::One("B".into())))
            .await
            .unwrap();
        assert!(!h.engine.answers().get(&q1).unwrap().is_correct);

        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert!(h.engine.answers().get(&q1).unwrap().is_correct);
        assert_eq!(h.engine.answers().len(), 1);
    }

    #[tokio::test]
    async fn navigation_is_bounds_checked_and_persisted() {
        let mut h = harness();
        started(&mut h).await;

        h.engine.go_to_question(99).await.unwrap();
        assert_eq!(h.engine.session().unwrap().current_index(), 0);

        h.engine.next_question().await.unwrap();
        h.engine.next_question().await.unwrap();
        assert_eq!(h.engine.session().unwrap().current_index(), 2);

        h.engine.previous_question().await.unwrap();
        assert_eq!(h.engine.session().unwrap().current_index(), 1);

        let persisted = h.store.get_raw(SESSION_KEY).unwrap();
        assert!(persisted.contains("\"currentIndex\":1"));
    }

    #[tokio::test]
    async fn submit_scores_the_mixed_sheet() {
        let mut h = harness();
        started(&mut h).await;

        // 2 correct, 1 partial, 1 incorrect -> 2*25 + 12.5 = 62.5.
        h.engine
            .save_answer(&QuestionId::new("q1"), Some(Answer::One("A".into())))
            .await
            .unwrap();
        h.engine
            .save_answer(
                &QuestionId::new("q2"),
                Some(Answer::Many(vec!["A".into(), "C".into()])),
            )
            .await
            .unwrap();
        h.engine
            .save_answer(&QuestionId::new("q3"), Some(Answer::Bool(true)))
            .await
            .unwrap();
        h.engine
            .save_answer(&QuestionId::new("q4"), Some(Answer::One("cash flow".into())))
            .await
            .unwrap();

        let report = h.engine.submit_exam().await.unwrap().unwrap();
        assert!((report.score - 62.5).abs() < f64::EPSILON);
        assert_eq!(report.correct_count, 2);
        assert_eq!(report.partial_count, 1);
        assert_eq!(report.incorrect_count, 1);
        assert_eq!(report.unanswered_count, 0);
        assert!(!h.engine.has_unfinished_session());
    }

    #[tokio::test]
    async fn resubmitting_overwrites_the_end_timestamp() {
        let mut h = harness();
        started(&mut h).await;

        h.engine.submit_exam().await.unwrap();
        let first_end = h.engine.session().unwrap().ended_at().unwrap();

        h.engine.clock.advance(chrono::Duration::minutes(3));
        let report = h.engine.submit_exam().await.unwrap().unwrap();
        let second_end = h.engine.session().unwrap().ended_at().unwrap();

        // Not idempotent: the end timestamp moves forward on every submit.
        assert_eq!(second_end - first_end, chrono::Duration::minutes(3));
        assert_eq!(report.time_spent_ms, 180_000);
    }

    #[tokio::test]
    async fn reset_keeps_the_question_list() {
        let mut h = harness();
        started(&mut h).await;
        h.engine
            .save_answer(&QuestionId::new("q1"), Some(Answer::One("A".into())))
            .await
            .unwrap();
        h.engine.next_question().await.unwrap();
        h.engine.submit_exam().await.unwrap();

        h.engine.clock.advance(chrono::Duration::minutes(1));
        h.engine.reset_exam().await.unwrap();

        let session = h.engine.session().unwrap();
        assert_eq!(session.current_index(), 0);
        assert!(!session.is_completed());
        assert_eq!(session.ended_at(), None);
        assert_eq!(session.questions().len(), 4);
        assert!(h.engine.answers().is_empty());
        assert_eq!(session.started_at(), fixed_now() + chrono::Duration::minutes(1));
    }

    #[tokio::test]
    async fn clear_session_empties_memory_and_storage() {
        let mut h = harness();
        started(&mut h).await;
        h.engine.clear_session().await.unwrap();

        assert!(h.engine.session().is_none());
        assert!(h.store.get_raw(SESSION_KEY).is_none());
        assert!(h.store.get_raw(ANSWERS_KEY).is_none());
        assert_eq!(h.engine.submit_exam().await.unwrap(), None);
    }

    #[tokio::test]
    async fn restore_round_trips_the_full_state() {
        let mut h = harness();
        started(&mut h).await;
        h.engine
            .save_answer(
                &QuestionId::new("q2"),
                Some(Answer::Many(vec!["A".into(), "C".into()])),
            )
            .await
            .unwrap();
        h.engine.go_to_question(2).await.unwrap();

        // A second engine over the same store plays the part of the
        // restarted process.
        let mut revived = ExamSessionService::new(
            fixed_clock(),
            Arc::new(h.store.clone()),
            Arc::new(h.store.clone()),
            Arc::new(h.store.clone()),
            Arc::new(NoopRemovalNotifier),
        );
        assert!(revived.restore().await.unwrap());

        assert_eq!(revived.session(), h.engine.session());
        assert_eq!(revived.answers(), h.engine.answers());
        assert_eq!(revived.session().unwrap().current_index(), 2);
        let stats = revived.statistics();
        assert_eq!(stats.answered, 1);
        assert_eq!(stats.partial, 1);
    }

    #[tokio::test]
    async fn malformed_slot_restores_to_a_fresh_engine() {
        let h = harness();
        h.store.set_raw(SESSION_KEY, "{broken json");

        let mut revived = ExamSessionService::from_storage(
            fixed_clock(),
            &Storage::from_store(h.store.clone()),
            Arc::new(NoopRemovalNotifier),
        );
        assert!(!revived.restore().await.unwrap());
        assert!(revived.session().is_none());
        assert!(revived.answers().is_empty());
    }

    #[tokio::test]
    async fn auto_removal_counts_up_and_emits_at_the_threshold() {
        let mut h = harness();
        h.store
            .set_policy(&AutoRemovePolicy { enabled: true, remove_after: 2 })
            .await
            .unwrap();
        started(&mut h).await;
        let q1 = QuestionId::new("q1");

        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert_eq!(h.store.correct_count(&q1).await.unwrap(), 1);
        assert!(h.notifier.removed().is_empty());

        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert_eq!(h.store.correct_count(&q1).await.unwrap(), 0);
        assert_eq!(h.notifier.removed(), vec![q1]);
    }

    #[tokio::test]
    async fn wrong_answer_resets_the_streak() {
        let mut h = harness();
        h.store
            .set_policy(&AutoRemovePolicy { enabled: true, remove_after: 3 })
            .await
            .unwrap();
        started(&mut h).await;
        let q1 = QuestionId::new("q1");

        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert_eq!(h.store.correct_count(&q1).await.unwrap(), 1);

        h.engine
            .save_answer(&q1, Some(Answer::One("B".into())))
            .await
            .unwrap();
        assert_eq!(h.store.correct_count(&q1).await.unwrap(), 0);
        assert!(h.notifier.removed().is_empty());
    }

    #[tokio::test]
    async fn disabled_or_absent_policy_leaves_counters_alone() {
        let mut h = harness();
        started(&mut h).await;
        let q1 = QuestionId::new("q1");

        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert_eq!(h.store.correct_count(&q1).await.unwrap(), 0);

        h.store
            .set_policy(&AutoRemovePolicy { enabled: false, remove_after: 1 })
            .await
            .unwrap();
        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert_eq!(h.store.correct_count(&q1).await.unwrap(), 0);
        assert!(h.notifier.removed().is_empty());
    }

    #[tokio::test]
    async fn malformed_policy_never_blocks_the_save() {
        let mut h = harness();
        h.store.set_raw("wrongQuestionAutoRemove", "][nonsense");
        started(&mut h).await;

        let q1 = QuestionId::new("q1");
        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        // The answer made it in despite the broken policy slot.
        assert!(h.engine.answers().get(&q1).unwrap().is_correct);
    }

    #[tokio::test]
    async fn zero_threshold_behaves_like_one() {
        let mut h = harness();
        h.store
            .set_policy(&AutoRemovePolicy { enabled: true, remove_after: 0 })
            .await
            .unwrap();
        started(&mut h).await;
        let q1 = QuestionId::new("q1");

        h.engine
            .save_answer(&q1, Some(Answer::One("A".into())))
            .await
            .unwrap();
        assert_eq!(h.notifier.removed(), vec![q1]);
    }

    #[tokio::test]
    async fn null_answers_count_as_unanswered() {
        let mut h = harness();
        started(&mut h).await;

        h.engine
            .save_answer(&QuestionId::new("q1"), None)
            .await
            .unwrap();
        let stats = h.engine.statistics();
        assert_eq!(stats.answered, 0);
        assert_eq!(stats.unanswered, 4);
        assert_eq!(h.engine.answers().len(), 1);
    }

    #[tokio::test]
    async fn wrong_question_practice_preserves_input_order_and_drops_misses() {
        let mut h = harness();
        let mut bank = QuestionBank::new(fixed_clock());
        let q5 = bank
            .add_question(form_in_chapter(&ChapterId::new("ch-001"), "five"), "admin")
            .unwrap();
        let q1 = bank
            .add_question(form_in_chapter(&ChapterId::new("ch-001"), "one"), "admin")
            .unwrap();

        h.engine
            .start_wrong_questions_practice(
                &[
                    q5.id().clone(),
                    QuestionId::new("q9-missing"),
                    q1.id().clone(),
                ],
                SubjectId::new("s1"),
                "Strategy",
                None,
                0,
                &bank,
            )
            .await
            .unwrap();

        let session = h.engine.session().unwrap();
        assert_eq!(session.kind(), ExamKind::WrongQuestions);
        let ids: Vec<&QuestionId> = session.questions().iter().map(Question::id).collect();
        assert_eq!(ids, vec![q5.id(), q1.id()]);
        assert!(session.exam_id().as_str().starts_with("wrong-all-"));
        assert_eq!(session.title(), "Wrong-question drill (2 questions)");
    }

    #[tokio::test]
    async fn wrong_question_practice_fails_with_nothing_resolved() {
        let mut h = harness();
        let bank = QuestionBank::new(fixed_clock());

        let err = h
            .engine
            .start_wrong_questions_practice(
                &[QuestionId::new("ghost")],
                SubjectId::new("s1"),
                "Strategy",
                None,
                0,
                &bank,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoQuestions));
        assert!(h.engine.session().is_none());
    }

    #[tokio::test]
    async fn wrong_question_practice_from_an_index_names_the_start_question() {
        let mut h = harness();
        let mut bank = QuestionBank::new(fixed_clock());
        let a = bank
            .add_question(form_in_chapter(&ChapterId::new("ch-001"), "a"), "admin")
            .unwrap();
        let b = bank
            .add_question(form_in_chapter(&ChapterId::new("ch-001"), "b"), "admin")
            .unwrap();

        h.engine
            .start_wrong_questions_practice(
                &[a.id().clone(), b.id().clone()],
                SubjectId::new("s1"),
                "Strategy",
                Some("Retry the misses".into()),
                1,
                &bank,
            )
            .await
            .unwrap();

        let session = h.engine.session().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.title(), "Retry the misses");
        let expected_prefix = format!("wrong-from-{}-", b.id());
        assert!(session.exam_id().as_str().starts_with(&expected_prefix));
    }
}
