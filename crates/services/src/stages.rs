use std::collections::HashMap;

use exam_core::model::{EntityStatus, LearningStage, StageId, SubjectId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;

/// Write model for a learning stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageForm {
    pub name: String,
    pub description: Option<String>,
    pub is_chapter_practice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// In-memory store for the learning stages of each subject.
///
/// Stage names are unique per subject among *active* stages, so a disabled
/// namesake can linger until someone tries to re-enable it — that is what
/// the toggle guard is for.
pub struct LearningStageCatalog {
    clock: Clock,
    stages: HashMap<StageId, LearningStage>,
    order: Vec<StageId>,
}

impl LearningStageCatalog {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            stages: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn stage(&self, id: &StageId) -> Option<&LearningStage> {
        self.stages.get(id)
    }

    /// Stages of one subject in `sort_order` sequence.
    #[must_use]
    pub fn stages_by_subject(&self, subject_id: &SubjectId) -> Vec<&LearningStage> {
        let mut stages: Vec<&LearningStage> = self
            .order
            .iter()
            .filter_map(|id| self.stages.get(id))
            .filter(|stage| &stage.subject_id == subject_id)
            .collect();
        stages.sort_by_key(|stage| stage.sort_order);
        stages
    }

    /// Adds a stage at the end of its subject's ordering.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateName` when an active stage of the
    /// subject already carries this name.
    pub fn add_stage(
        &mut self,
        subject_id: SubjectId,
        form: StageForm,
        creator: impl Into<String>,
    ) -> Result<LearningStage, CatalogError> {
        let name = form.name.trim().to_owned();
        let duplicate = self.stages.values().any(|stage| {
            stage.subject_id == subject_id && stage.name == name && stage.status.is_active()
        });
        if duplicate {
            return Err(CatalogError::DuplicateName {
                entity: "learning stage",
                scope: "subject",
            });
        }

        let sort_order = self
            .stages
            .values()
            .filter(|stage| stage.subject_id == subject_id)
            .map(|stage| stage.sort_order)
            .max()
            .unwrap_or(0)
            + 1;

        let stage = LearningStage {
            id: StageId::new(format!("ls-{}", Uuid::new_v4())),
            subject_id,
            name,
            description: form
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            sort_order,
            creator: creator.into(),
            status: EntityStatus::Active,
            is_chapter_practice: form.is_chapter_practice,
            created_at: self.clock.now(),
        };
        self.order.push(stage.id.clone());
        self.stages.insert(stage.id.clone(), stage.clone());
        Ok(stage)
    }

    /// Replaces a stage's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `DuplicateName`.
    pub fn update_stage(&mut self, id: &StageId, form: StageForm) -> Result<(), CatalogError> {
        let stage = self.stages.get(id).ok_or(CatalogError::NotFound {
            entity: "learning stage",
        })?;

        let name = form.name.trim().to_owned();
        if name != stage.name {
            let duplicate = self.stages.values().any(|other| {
                other.id != *id
                    && other.subject_id == stage.subject_id
                    && other.name == name
                    && other.status.is_active()
            });
            if duplicate {
                return Err(CatalogError::DuplicateName {
                    entity: "learning stage",
                    scope: "subject",
                });
            }
        }

        let stage = self.stages.get_mut(id).ok_or(CatalogError::NotFound {
            entity: "learning stage",
        })?;
        stage.name = name;
        stage.description = form
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        stage.is_chapter_practice = form.is_chapter_practice;
        Ok(())
    }

    /// Deletes a stage and closes the ordering gap: every later stage of
    /// the same subject shifts up by one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_stage(&mut self, id: &StageId) -> Result<(), CatalogError> {
        let Some(removed) = self.stages.remove(id) else {
            return Err(CatalogError::NotFound {
                entity: "learning stage",
            });
        };
        self.order.retain(|stage| stage != id);

        for stage in self.stages.values_mut() {
            if stage.subject_id == removed.subject_id && stage.sort_order > removed.sort_order {
                stage.sort_order -= 1;
            }
        }
        Ok(())
    }

    /// Swaps a stage's sort order with its neighbor in the given direction.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFirst`/`AlreadyLast` at the boundaries, `NotFound`
    /// for an unknown id.
    pub fn move_stage(&mut self, id: &StageId, direction: MoveDirection) -> Result<(), CatalogError> {
        let stage = self.stages.get(id).ok_or(CatalogError::NotFound {
            entity: "learning stage",
        })?;
        let subject_id = stage.subject_id.clone();

        let mut siblings: Vec<(StageId, u32)> = self
            .stages
            .values()
            .filter(|s| s.subject_id == subject_id)
            .map(|s| (s.id.clone(), s.sort_order))
            .collect();
        siblings.sort_by_key(|(_, order)| *order);

        let position = siblings
            .iter()
            .position(|(sid, _)| sid == id)
            .ok_or(CatalogError::NotFound {
                entity: "learning stage",
            })?;

        let target = match direction {
            MoveDirection::Up => {
                if position == 0 {
                    return Err(CatalogError::AlreadyFirst);
                }
                position - 1
            }
            MoveDirection::Down => {
                if position + 1 == siblings.len() {
                    return Err(CatalogError::AlreadyLast);
                }
                position + 1
            }
        };

        let (self_id, self_order) = siblings[position].clone();
        let (other_id, other_order) = siblings[target].clone();
        if let Some(stage) = self.stages.get_mut(&self_id) {
            stage.sort_order = other_order;
        }
        if let Some(stage) = self.stages.get_mut(&other_id) {
            stage.sort_order = self_order;
        }
        Ok(())
    }

    /// Flips a stage's status; enabling is blocked while an active namesake
    /// exists in the subject.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `ActiveSiblingExists`.
    pub fn toggle_stage_status(&mut self, id: &StageId) -> Result<(), CatalogError> {
        let stage = self.stages.get(id).ok_or(CatalogError::NotFound {
            entity: "learning stage",
        })?;

        if stage.status == EntityStatus::Disabled {
            let clash = self.stages.values().any(|other| {
                other.id != *id
                    && other.subject_id == stage.subject_id
                    && other.name == stage.name
                    && other.status.is_active()
            });
            if clash {
                return Err(CatalogError::ActiveSiblingExists {
                    entity: "learning stage",
                });
            }
        }

        let stage = self.stages.get_mut(id).ok_or(CatalogError::NotFound {
            entity: "learning stage",
        })?;
        stage.status = stage.status.toggled();
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
