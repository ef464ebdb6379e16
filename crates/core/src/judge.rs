use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Answer, Question, QuestionKind, SessionStatistics};

//
// ─── VERDICT ───────────────────────────────────────────────────────────────────
//

/// Outcome of judging one submitted answer.
///
/// `is_partial` only ever holds for multiple/uncertain questions; the two
/// flags are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_correct: bool,
    pub is_partial: bool,
}

impl Verdict {
    const INCORRECT: Self = Self {
        is_correct: false,
        is_partial: false,
    };

    const CORRECT: Self = Self {
        is_correct: true,
        is_partial: false,
    };
}

/// Judges a submitted answer against a question's reference answer.
///
/// Pure and deterministic: the same `(question, answer)` pair always yields
/// the same verdict.
///
/// - A `None` submission is neither correct nor partial.
/// - Judgment questions normalize both sides to a boolean (only the boolean
///   `true` and the literal string `"true"` count as affirmative) and
///   compare the normalized values.
/// - Multiple/uncertain questions coerce both sides to label lists, sort
///   them, and compare. A miss is still *partial* when the submission is a
///   proper non-empty subset of the reference set: at least one reference
///   label chosen, no label outside the reference set, and strictly fewer
///   labels than the reference. Any stray label forces plain incorrect.
/// - Every other kind compares by direct value equality.
#[must_use]
pub fn evaluate(question: &Question, answer: Option<&Answer>) -> Verdict {
    let Some(answer) = answer else {
        return Verdict::INCORRECT;
    };

    match question.kind() {
        QuestionKind::Judgment => Verdict {
            is_correct: answer.as_judgment() == question.answer().as_judgment(),
            is_partial: false,
        },
        QuestionKind::Multiple | QuestionKind::Uncertain => {
            let mut submitted = answer.to_labels();
            let mut reference = question.answer().to_labels();
            submitted.sort();
            reference.sort();

            if submitted == reference {
                return Verdict::CORRECT;
            }

            let any_correct = submitted.iter().any(|label| reference.contains(label));
            let any_stray = submitted.iter().any(|label| !reference.contains(label));
            Verdict {
                is_correct: false,
                is_partial: any_correct && !any_stray && submitted.len() < reference.len(),
            }
        }
        _ => Verdict {
            is_correct: answer == question.answer(),
            is_partial: false,
        },
    }
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// The score sheet returned by submitting a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    /// 0–100, rounded to two decimal places.
    pub score: f64,
    pub total_questions: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub partial_count: usize,
    pub unanswered_count: usize,
    /// Elapsed milliseconds; falls back to "so far" when the session has
    /// not ended yet.
    pub time_spent_ms: i64,
}

/// Computes the score sheet from a session tally.
///
/// Every question carries the same weight (`100 / total`); a fully correct
/// answer earns the full weight, a partial answer half of it. The result is
/// rounded to the nearest hundredth. An empty tally scores zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_report(
    stats: &SessionStatistics,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ScoreReport {
    let score = if stats.total == 0 {
        0.0
    } else {
        let per_question = 100.0 / stats.total as f64;
        let raw = stats.correct as f64 * per_question + stats.partial as f64 * per_question * 0.5;
        (raw * 100.0).round() / 100.0
    };

    let end = ended_at.unwrap_or(now);
    ScoreReport {
        score,
        total_questions: stats.total,
        correct_count: stats.correct,
        incorrect_count: stats.incorrect,
        partial_count: stats.partial,
        unanswered_count: stats.unanswered,
        time_spent_ms: (end - started_at).num_milliseconds(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
