#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod chapters;
pub mod error;
pub mod exams;
pub mod knowledge_points;
pub mod marking;
pub mod pagination;
pub mod papers;
pub mod payment_rules;
pub mod question_bank;
pub mod question_types;
pub mod sessions;
pub mod stages;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use catalog::ProjectCatalog;
pub use chapters::ChapterCatalog;
pub use error::{AppServicesError, CatalogError, QuestionBankError, SessionError};
pub use exams::{ExamFilter, ExamStore};
pub use knowledge_points::KnowledgePointCatalog;
pub use marking::MarkingService;
pub use pagination::Page;
pub use papers::PaperStore;
pub use payment_rules::PaymentRuleCatalog;
pub use question_bank::{QuestionBank, QuestionFilter};
pub use question_types::QuestionTypeCatalog;
pub use scheduled_tests::ScheduledTestStore;
pub use sessions::{
    CollectingNotifier, ExamSessionService, NoopRemovalNotifier, RemovalNotifier,
};
pub use stages::LearningStageCatalog;
