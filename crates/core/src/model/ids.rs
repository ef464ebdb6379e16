use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier newtype.
///
/// Entity ids in this system are opaque strings minted by the stores
/// (`q-7f3a…`, `ch-002`), so every id type wraps a `String` and serializes
/// as a bare string.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Project.
    ProjectId
);
string_id!(
    /// Unique identifier for a Subject.
    SubjectId
);
string_id!(
    /// Unique identifier for a Chapter.
    ChapterId
);
string_id!(
    /// Unique identifier for a Section.
    SectionId
);
string_id!(
    /// Unique identifier for a Knowledge Point.
    KnowledgePointId
);
string_id!(
    /// Unique identifier for a Learning Stage.
    StageId
);
string_id!(
    /// Unique identifier for a per-subject question type definition.
    QuestionTypeId
);
string_id!(
    /// Unique identifier for a payment rule.
    RuleId
);
string_id!(
    /// Unique identifier for a Question.
    QuestionId
);
string_id!(
    /// Unique identifier for an assembled Exam.
    ExamId
);
string_id!(
    /// Unique identifier for a chapter Paper.
    PaperId
);
string_id!(
    /// Unique identifier for a scheduled Test.
    TestId
);
string_id!(
    /// Unique identifier for a marking record.
    RecordId
);
string_id!(
    /// Unique identifier for a marking teacher.
    TeacherId
);
