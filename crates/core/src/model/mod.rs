mod catalog;
mod exam;
mod ids;
mod marking;
mod question;
mod session;

pub use ids::{
    ChapterId, ExamId, KnowledgePointId, PaperId, ProjectId, QuestionId, QuestionTypeId, RecordId,
    RuleId, SectionId, StageId, SubjectId, TeacherId, TestId,
};

pub use catalog::{
    ApplicableObject, Chapter, EntityStatus, KnowledgePoint, LearningStage, PaymentRule, Project,
    QuestionTypeDef, Section, Subject,
};
pub use exam::{
    Exam, ExamError, ExamForm, ExamQuestion, Paper, ReviewStatus, ScheduledTest,
    ScheduledTestForm, TestKind,
};
pub use marking::{
    MarkingExamKind, MarkingProgress, MarkingRecord, MarkingStatus, PaperGeneration,
    ScoreStatistics, StudentScore, Teacher,
};
pub use question::{
    validate_answer_shape, Answer, Difficulty, Question, QuestionError, QuestionForm,
    QuestionKind, QuestionOption, QuestionSource, QuestionStatus, SubQuestion,
};
pub use session::{
    AnswerSheet, ExamKind, ExamSession, ExamSettings, FontSize, SessionMode, SessionStatistics,
    SettingsUpdate, UserAnswer,
};
