use std::collections::HashMap;

use exam_core::model::{ChapterId, EntityStatus, KnowledgePoint, KnowledgePointId, Question, SubjectId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;
use crate::pagination::{paginate, Page};
use crate::question_bank::QuestionBank;

/// In-memory store for knowledge points.
///
/// Unlike the other catalog names, knowledge-point names compare
/// case-insensitively and whitespace-trimmed; stored names are trimmed.
pub struct KnowledgePointCatalog {
    clock: Clock,
    points: HashMap<KnowledgePointId, KnowledgePoint>,
    order: Vec<KnowledgePointId>,
}

fn normalized(name: &str) -> String {
    name.trim().to_lowercase()
}

impl KnowledgePointCatalog {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            points: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn point(&self, id: &KnowledgePointId) -> Option<&KnowledgePoint> {
        self.points.get(id)
    }

    /// Knowledge points of one subject, in insertion order.
    #[must_use]
    pub fn points_by_subject(&self, subject_id: &SubjectId) -> Vec<&KnowledgePoint> {
        self.order
            .iter()
            .filter_map(|id| self.points.get(id))
            .filter(|kp| &kp.subject_id == subject_id)
            .collect()
    }

    /// Adds a knowledge point.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateName` when the subject already has a
    /// point with the same normalized name.
    pub fn add_point(
        &mut self,
        subject_id: SubjectId,
        name: &str,
        chapter_ids: Vec<ChapterId>,
        creator_id: impl Into<String>,
    ) -> Result<KnowledgePoint, CatalogError> {
        let wanted = normalized(name);
        let duplicate = self
            .points
            .values()
            .any(|kp| kp.subject_id == subject_id && normalized(&kp.name) == wanted);
        if duplicate {
            return Err(CatalogError::DuplicateName {
                entity: "knowledge point",
                scope: "subject",
            });
        }

        let point = KnowledgePoint {
            id: KnowledgePointId::new(format!("kp-{}", Uuid::new_v4())),
            subject_id,
            name: name.trim().to_owned(),
            chapter_ids,
            status: EntityStatus::Active,
            created_at: self.clock.now(),
            creator_id: creator_id.into(),
        };
        self.order.push(point.id.clone());
        self.points.insert(point.id.clone(), point.clone());
        Ok(point)
    }

    /// Updates a point's name and/or chapter links.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `DuplicateName`.
    pub fn update_point(
        &mut self,
        id: &KnowledgePointId,
        name: Option<&str>,
        chapter_ids: Option<Vec<ChapterId>>,
    ) -> Result<(), CatalogError> {
        let point = self.points.get(id).ok_or(CatalogError::NotFound {
            entity: "knowledge point",
        })?;

        if let Some(name) = name {
            if name.trim() != point.name {
                let wanted = normalized(name);
                let duplicate = self.points.values().any(|kp| {
                    kp.id != *id
                        && kp.subject_id == point.subject_id
                        && normalized(&kp.name) == wanted
                });
                if duplicate {
                    return Err(CatalogError::DuplicateName {
                        entity: "knowledge point",
                        scope: "subject",
                    });
                }
            }
        }

        let point = self.points.get_mut(id).ok_or(CatalogError::NotFound {
            entity: "knowledge point",
        })?;
        if let Some(name) = name {
            point.name = name.trim().to_owned();
        }
        if let Some(chapter_ids) = chapter_ids {
            point.chapter_ids = chapter_ids;
        }
        Ok(())
    }

    /// Deletes a point and strips it from every bank question.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_point(
        &mut self,
        id: &KnowledgePointId,
        bank: &mut QuestionBank,
    ) -> Result<(), CatalogError> {
        if self.points.remove(id).is_none() {
            return Err(CatalogError::NotFound {
                entity: "knowledge point",
            });
        }
        self.order.retain(|kp| kp != id);
        bank.remove_knowledge_point_links(id);
        Ok(())
    }

    /// Flips a point's status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_point_status(&mut self, id: &KnowledgePointId) -> Result<(), CatalogError> {
        let point = self.points.get_mut(id).ok_or(CatalogError::NotFound {
            entity: "knowledge point",
        })?;
        point.status = point.status.toggled();
        Ok(())
    }

    /// Number of bank questions linked to a point.
    #[must_use]
    pub fn question_count(&self, bank: &QuestionBank, id: &KnowledgePointId) -> usize {
        bank.questions_by_knowledge_point(id).len()
    }

    /// One page of the questions linked to a point, in bank order.
    #[must_use]
    pub fn paginated_questions(
        &self,
        bank: &QuestionBank,
        id: &KnowledgePointId,
        page: usize,
        page_size: usize,
    ) -> Page<Question> {
        let linked: Vec<Question> = bank
            .questions_by_knowledge_point(id)
            .into_iter()
            .cloned()
            .collect();
        paginate(linked, page, page_size)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
