mod engine;
mod wrong_questions;

pub use engine::ExamSessionService;
pub use wrong_questions::{CollectingNotifier, NoopRemovalNotifier, RemovalNotifier};
