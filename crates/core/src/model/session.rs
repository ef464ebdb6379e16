use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ids::{ExamId, QuestionId, SubjectId};
use crate::model::question::{Answer, Question};

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    Large,
    Xlarge,
}

/// Whether wrong answers reveal the explanation immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Practice,
    Exam,
}

/// Per-session presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSettings {
    pub font_size: FontSize,
    pub show_analysis: bool,
    pub mode: SessionMode,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            font_size: FontSize::Medium,
            show_analysis: false,
            mode: SessionMode::Practice,
        }
    }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub font_size: Option<FontSize>,
    pub show_analysis: Option<bool>,
    pub mode: Option<SessionMode>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// What produced the question list of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamKind {
    #[serde(rename = "chapter")]
    Chapter,
    #[serde(rename = "realExam")]
    RealExam,
    #[serde(rename = "sprint")]
    Sprint,
    #[serde(rename = "entrance")]
    Entrance,
    #[serde(rename = "wrongQuestions")]
    WrongQuestions,
}

/// One attempt at a set of questions.
///
/// The question list is a snapshot taken at start time; later edits to the
/// bank do not reach an in-progress session. Navigation keeps
/// `current_index` inside `[0, questions.len())` — out-of-range requests
/// change nothing and report `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    exam_id: ExamId,
    #[serde(rename = "examType")]
    kind: ExamKind,
    #[serde(rename = "examTitle")]
    title: String,
    subject_id: SubjectId,
    subject_name: String,
    questions: Vec<Question>,
    current_index: usize,
    #[serde(rename = "startTime")]
    started_at: DateTime<Utc>,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
    is_completed: bool,
    settings: ExamSettings,
}

impl ExamSession {
    /// Creates a session positioned at `start_index`.
    ///
    /// The question list is taken as given — empty lists and out-of-range
    /// start indexes are the caller's responsibility; the navigation guards
    /// keep later moves in range.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exam_id: ExamId,
        kind: ExamKind,
        title: impl Into<String>,
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        questions: Vec<Question>,
        start_index: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exam_id,
            kind,
            title: title.into(),
            subject_id,
            subject_name: subject_name.into(),
            questions,
            current_index: start_index,
            started_at,
            ended_at: None,
            is_completed: false,
            settings: ExamSettings::default(),
        }
    }

    /// Jumps to `index`. Out-of-range requests are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.questions.len() {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    /// Steps to the next question if one exists.
    pub fn next(&mut self) -> bool {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// Steps to the previous question if one exists.
    pub fn previous(&mut self) -> bool {
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    /// Marks the attempt finished. Calling this again moves the end
    /// timestamp forward; the caller decides whether that is wanted.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.ended_at = Some(at);
        self.is_completed = true;
    }

    /// Rewinds the attempt for a retry over the same question list.
    pub fn reset(&mut self, at: DateTime<Utc>) {
        self.current_index = 0;
        self.started_at = at;
        self.ended_at = None;
        self.is_completed = false;
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) {
        if let Some(font_size) = update.font_size {
            self.settings.font_size = font_size;
        }
        if let Some(show_analysis) = update.show_analysis {
            self.settings.show_analysis = show_analysis;
        }
        if let Some(mode) = update.mode {
            self.settings.mode = mode;
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Finds a question of the snapshot by id.
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    // Accessors
    #[must_use]
    pub fn exam_id(&self) -> &ExamId {
        &self.exam_id
    }

    #[must_use]
    pub fn kind(&self) -> ExamKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// The stored record of one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: QuestionId,
    /// `None` models a cleared/blank submission; such entries do not count
    /// as answered.
    pub answer: Option<Answer>,
    pub is_correct: bool,
    pub is_partial: bool,
    pub answered_at: DateTime<Utc>,
}

/// The per-session answer mapping, keyed by question id.
///
/// Entries are overwritten on re-answer and only removed wholesale by a
/// session reset or clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet {
    entries: HashMap<QuestionId, UserAnswer>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for its question.
    pub fn record(&mut self, answer: UserAnswer) {
        self.entries.insert(answer.question_id.clone(), answer);
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&UserAnswer> {
        self.entries.get(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tallies the sheet against a question list.
    ///
    /// A question counts as answered when an entry exists with a non-null
    /// answer value; answered entries then split into correct, partial, and
    /// incorrect.
    #[must_use]
    pub fn statistics(&self, questions: &[Question]) -> SessionStatistics {
        let mut stats = SessionStatistics {
            total: questions.len(),
            ..SessionStatistics::default()
        };

        for question in questions {
            let Some(entry) = self.entries.get(question.id()) else {
                continue;
            };
            if entry.answer.is_none() {
                continue;
            }
            stats.answered += 1;
            if entry.is_correct {
                stats.correct += 1;
            } else if entry.is_partial {
                stats.partial += 1;
            } else {
                stats.incorrect += 1;
            }
        }

        stats.unanswered = stats.total - stats.answered;
        stats
    }
}

/// Live tally of a session, recomputed on every access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub partial: usize,
    pub unanswered: usize,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{ChapterId, ProjectId};
    use crate::model::question::{QuestionForm, QuestionKind, QuestionSource};
    use crate::time::fixed_now;

    fn question(id: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionForm {
                project_id: ProjectId::new("p1"),
                subject_id: SubjectId::new("s1"),
                chapter_id: ChapterId::new("ch-001"),
                kind: QuestionKind::Single,
                source: QuestionSource::Official,
                year: None,
                difficulty: None,
                frequency: None,
                knowledge_point_ids: Vec::new(),
                stem: format!("stem {id}"),
                options: Vec::new(),
                answer: Answer::One("A".into()),
                explanation: String::new(),
                main_stem: None,
                sub_questions: Vec::new(),
                payment_rule_id: None,
                inherit_chapter_rule: false,
            },
            fixed_now(),
            "admin",
        )
        .unwrap()
    }

    fn session(len: usize) -> ExamSession {
        let questions = (0..len).map(|i| question(&format!("q{i}"))).collect();
        ExamSession::new(
            ExamId::new("exam-1"),
            ExamKind::Chapter,
            "Chapter drill",
            SubjectId::new("s1"),
            "Strategy",
            questions,
            0,
            fixed_now(),
        )
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut s = session(3);
        assert!(!s.previous());
        assert_eq!(s.current_index(), 0);

        assert!(s.next());
        assert!(s.next());
        assert!(!s.next());
        assert_eq!(s.current_index(), 2);

        assert!(!s.go_to(3));
        assert_eq!(s.current_index(), 2);
        assert!(s.go_to(1));
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn reset_rewinds_everything_but_the_questions() {
        let mut s = session(2);
        s.next();
        s.complete(fixed_now());
        assert!(s.is_completed());

        let later = fixed_now() + chrono::Duration::minutes(5);
        s.reset(later);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.started_at(), later);
        assert_eq!(s.ended_at(), None);
        assert!(!s.is_completed());
        assert_eq!(s.questions().len(), 2);
    }

    #[test]
    fn settings_update_is_partial() {
        let mut s = session(1);
        s.update_settings(SettingsUpdate {
            font_size: Some(FontSize::Large),
            ..SettingsUpdate::default()
        });
        assert_eq!(s.settings().font_size, FontSize::Large);
        assert_eq!(s.settings().mode, SessionMode::Practice);
    }

    #[test]
    fn statistics_counts_only_non_null_answers() {
        let questions: Vec<Question> = (0..3).map(|i| question(&format!("q{i}"))).collect();
        let mut sheet = AnswerSheet::new();
        sheet.record(UserAnswer {
            question_id: QuestionId::new("q0"),
            answer: Some(Answer::One("A".into())),
            is_correct: true,
            is_partial: false,
            answered_at: fixed_now(),
        });
        sheet.record(UserAnswer {
            question_id: QuestionId::new("q1"),
            answer: None,
            is_correct: false,
            is_partial: false,
            answered_at: fixed_now(),
        });

        let stats = sheet.statistics(&questions);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.answered, 1);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.unanswered, 2);
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut s = session(2);
        s.next();
        s.update_settings(SettingsUpdate {
            mode: Some(SessionMode::Exam),
            ..SettingsUpdate::default()
        });

        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"examType\":\"chapter\""));
        assert!(json.contains("\"startTime\""));
        let back: ExamSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn answer_sheet_round_trips_through_json() {
        let mut sheet = AnswerSheet::new();
        sheet.record(UserAnswer {
            question_id: QuestionId::new("q0"),
            answer: Some(Answer::Many(vec!["A".into(), "C".into()])),
            is_correct: false,
            is_partial: true,
            answered_at: fixed_now(),
        });

        let json = serde_json::to_string(&sheet).unwrap();
        let back: AnswerSheet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sheet);
    }
}
