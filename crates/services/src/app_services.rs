use std::sync::Arc;

use exam_core::Clock;
use storage::repository::Storage;

use crate::catalog::ProjectCatalog;
use crate::chapters::ChapterCatalog;
use crate::error::AppServicesError;
use crate::exams::ExamStore;
use crate::knowledge_points::KnowledgePointCatalog;
use crate::marking::MarkingService;
use crate::papers::PaperStore;
use crate::payment_rules::PaymentRuleCatalog;
use crate::question_bank::QuestionBank;
use crate::question_types::QuestionTypeCatalog;
use crate::scheduled_tests::ScheduledTestStore;
use crate::sessions::{ExamSessionService, NoopRemovalNotifier, RemovalNotifier};
use crate::stages::LearningStageCatalog;

/// Assembles the application-facing stores and the session engine over one
/// storage backend.
///
/// The catalog stores are in-memory and owned directly (the process is the
/// single writer); only the session engine talks to durable storage, and a
/// prior attempt is restored eagerly at construction time.
pub struct AppServices {
    projects: ProjectCatalog,
    chapters: ChapterCatalog,
    knowledge_points: KnowledgePointCatalog,
    stages: LearningStageCatalog,
    question_types: QuestionTypeCatalog,
    payment_rules: PaymentRuleCatalog,
    question_bank: QuestionBank,
    exams: ExamStore,
    papers: PaperStore,
    scheduled_tests: ScheduledTestStore,
    marking: MarkingService,
    session: ExamSessionService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or session
    /// recovery fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(clock, &storage, Arc::new(NoopRemovalNotifier)).await
    }

    /// Build services over an existing storage aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if restoring the persisted session fails
    /// on the backend level (a merely malformed slot restores to empty).
    pub async fn with_storage(
        clock: Clock,
        storage: &Storage,
        notifier: Arc<dyn RemovalNotifier>,
    ) -> Result<Self, AppServicesError> {
        let mut session = ExamSessionService::from_storage(clock, storage, notifier);
        session.restore().await?;

        Ok(Self {
            projects: ProjectCatalog::new(clock),
            chapters: ChapterCatalog::new(clock),
            knowledge_points: KnowledgePointCatalog::new(clock),
            stages: LearningStageCatalog::new(clock),
            question_types: QuestionTypeCatalog::new(clock),
            payment_rules: PaymentRuleCatalog::new(clock),
            question_bank: QuestionBank::new(clock),
            exams: ExamStore::new(clock),
            papers: PaperStore::new(clock),
            scheduled_tests: ScheduledTestStore::new(clock),
            marking: MarkingService::new(),
            session,
        })
    }

    #[must_use]
    pub fn projects(&mut self) -> &mut ProjectCatalog {
        &mut self.projects
    }

    #[must_use]
    pub fn chapters(&mut self) -> &mut ChapterCatalog {
        &mut self.chapters
    }

    #[must_use]
    pub fn knowledge_points(&mut self) -> &mut KnowledgePointCatalog {
        &mut self.knowledge_points
    }

    #[must_use]
    pub fn stages(&mut self) -> &mut LearningStageCatalog {
        &mut self.stages
    }

    #[must_use]
    pub fn question_types(&mut self) -> &mut QuestionTypeCatalog {
        &mut self.question_types
    }

    #[must_use]
    pub fn payment_rules(&mut self) -> &mut PaymentRuleCatalog {
        &mut self.payment_rules
    }

    #[must_use]
    pub fn question_bank(&mut self) -> &mut QuestionBank {
        &mut self.question_bank
    }

    #[must_use]
    pub fn question_bank_ref(&self) -> &QuestionBank {
        &self.question_bank
    }

    #[must_use]
    pub fn exams(&mut self) -> &mut ExamStore {
        &mut self.exams
    }

    #[must_use]
    pub fn papers(&mut self) -> &mut PaperStore {
        &mut self.papers
    }

    #[must_use]
    pub fn scheduled_tests(&mut self) -> &mut ScheduledTestStore {
        &mut self.scheduled_tests
    }

    #[must_use]
    pub fn marking(&mut self) -> &mut MarkingService {
        &mut self.marking
    }

    #[must_use]
    pub fn session(&mut self) -> &mut ExamSessionService {
        &mut self.session
    }

    #[must_use]
    pub fn session_ref(&self) -> &ExamSessionService {
        &self.session
    }

    //
    // ─── CROSS-STORE OPERATIONS ────────────────────────────────────────────
    //

    /// Deletes a chapter, consulting the question bank for references.
    ///
    /// # Errors
    ///
    /// See [`ChapterCatalog::delete_chapter`].
    pub fn delete_chapter(
        &mut self,
        id: &exam_core::model::ChapterId,
    ) -> Result<(), crate::error::CatalogError> {
        self.chapters.delete_chapter(id, &self.question_bank)
    }

    /// Deletes a knowledge point and unlinks it from every bank question.
    ///
    /// # Errors
    ///
    /// See [`KnowledgePointCatalog::delete_point`].
    pub fn delete_knowledge_point(
        &mut self,
        id: &exam_core::model::KnowledgePointId,
    ) -> Result<(), crate::error::CatalogError> {
        self.knowledge_points
            .delete_point(id, &mut self.question_bank)
    }

    /// Starts a wrong-question drill resolved against the bank.
    ///
    /// # Errors
    ///
    /// See [`ExamSessionService::start_wrong_questions_practice`].
    pub async fn start_wrong_questions_practice(
        &mut self,
        question_ids: &[exam_core::model::QuestionId],
        subject_id: exam_core::model::SubjectId,
        subject_name: impl Into<String>,
        title: Option<String>,
        start_index: usize,
    ) -> Result<(), crate::error::SessionError> {
        self.session
            .start_wrong_questions_practice(
                question_ids,
                subject_id,
                subject_name,
                title,
                start_index,
                &self.question_bank,
            )
            .await
    }
}
