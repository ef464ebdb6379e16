use std::collections::HashMap;

use exam_core::model::{EntityStatus, QuestionKind, QuestionTypeDef, QuestionTypeId, SubjectId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;
use crate::stages::MoveDirection;

/// Write model for a per-subject question type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionTypeForm {
    pub subject_id: SubjectId,
    pub internal_kind: QuestionKind,
    pub display_name: String,
    pub sort_order: u32,
    pub status: EntityStatus,
}

/// In-memory store for per-subject question type configuration.
///
/// Within a subject the internal kind, the display name, and the sort order
/// must each be unique.
pub struct QuestionTypeCatalog {
    clock: Clock,
    defs: HashMap<QuestionTypeId, QuestionTypeDef>,
    order: Vec<QuestionTypeId>,
}

impl QuestionTypeCatalog {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            defs: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn definition(&self, id: &QuestionTypeId) -> Option<&QuestionTypeDef> {
        self.defs.get(id)
    }

    /// Definitions of one subject in `sort_order` sequence.
    #[must_use]
    pub fn by_subject(&self, subject_id: &SubjectId) -> Vec<&QuestionTypeDef> {
        let mut defs: Vec<&QuestionTypeDef> = self
            .order
            .iter()
            .filter_map(|id| self.defs.get(id))
            .filter(|def| &def.subject_id == subject_id)
            .collect();
        defs.sort_by_key(|def| def.sort_order);
        defs
    }

    /// Number of definitions a subject carries.
    #[must_use]
    pub fn subject_type_count(&self, subject_id: &SubjectId) -> usize {
        self.defs
            .values()
            .filter(|def| &def.subject_id == subject_id)
            .count()
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateInternalKind`, `DuplicateName`, or
    /// `DuplicateSortOrder` when the subject already uses the respective
    /// value.
    pub fn add_definition(
        &mut self,
        form: QuestionTypeForm,
    ) -> Result<QuestionTypeDef, CatalogError> {
        let siblings: Vec<&QuestionTypeDef> = self
            .defs
            .values()
            .filter(|def| def.subject_id == form.subject_id)
            .collect();

        if siblings.iter().any(|def| def.internal_kind == form.internal_kind) {
            return Err(CatalogError::DuplicateInternalKind);
        }
        if siblings.iter().any(|def| def.display_name == form.display_name) {
            return Err(CatalogError::DuplicateName {
                entity: "question type",
                scope: "subject",
            });
        }
        if siblings.iter().any(|def| def.sort_order == form.sort_order) {
            return Err(CatalogError::DuplicateSortOrder);
        }

        let def = QuestionTypeDef {
            id: QuestionTypeId::new(format!("qt-{}", Uuid::new_v4())),
            subject_id: form.subject_id,
            internal_kind: form.internal_kind,
            display_name: form.display_name,
            sort_order: form.sort_order,
            status: form.status,
            created_at: self.clock.now(),
        };
        self.order.push(def.id.clone());
        self.defs.insert(def.id.clone(), def.clone());
        Ok(def)
    }

    /// Updates the display name and/or sort order of a definition.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `DuplicateName`, or `DuplicateSortOrder`.
    pub fn update_definition(
        &mut self,
        id: &QuestionTypeId,
        display_name: Option<String>,
        sort_order: Option<u32>,
    ) -> Result<(), CatalogError> {
        let def = self.defs.get(id).ok_or(CatalogError::NotFound {
            entity: "question type",
        })?;

        if let Some(name) = &display_name {
            let duplicate = self.defs.values().any(|other| {
                other.id != *id && other.subject_id == def.subject_id && &other.display_name == name
            });
            if duplicate {
                return Err(CatalogError::DuplicateName {
                    entity: "question type",
                    scope: "subject",
                });
            }
        }
        if let Some(order) = sort_order {
            let duplicate = self.defs.values().any(|other| {
                other.id != *id && other.subject_id == def.subject_id && other.sort_order == order
            });
            if duplicate {
                return Err(CatalogError::DuplicateSortOrder);
            }
        }

        let def = self.defs.get_mut(id).ok_or(CatalogError::NotFound {
            entity: "question type",
        })?;
        if let Some(name) = display_name {
            def.display_name = name;
        }
        if let Some(order) = sort_order {
            def.sort_order = order;
        }
        Ok(())
    }

    /// Deletes a definition.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_definition(&mut self, id: &QuestionTypeId) -> Result<(), CatalogError> {
        if self.defs.remove(id).is_none() {
            return Err(CatalogError::NotFound {
                entity: "question type",
            });
        }
        self.order.retain(|def| def != id);
        Ok(())
    }

    /// Flips a definition's status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_definition_status(&mut self, id: &QuestionTypeId) -> Result<(), CatalogError> {
        let def = self.defs.get_mut(id).ok_or(CatalogError::NotFound {
            entity: "question type",
        })?;
        def.status = def.status.toggled();
        Ok(())
    }

    /// Swaps a definition's sort order with its neighbor.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFirst`/`AlreadyLast` at the boundaries, `NotFound`
    /// for an unknown id.
    pub fn move_definition(
        &mut self,
        id: &QuestionTypeId,
        direction: MoveDirection,
    ) -> Result<(), CatalogError> {
        let def = self.defs.get(id).ok_or(CatalogError::NotFound {
            entity: "question type",
        })?;
        let subject_id = def.subject_id.clone();

        let mut siblings: Vec<(QuestionTypeId, u32)> = self
            .defs
            .values()
            .filter(|d| d.subject_id == subject_id)
            .map(|d| (d.id.clone(), d.sort_order))
            .collect();
        siblings.sort_by_key(|(_, order)| *order);

        let position = siblings
            .iter()
            .position(|(did, _)| did == id)
            .ok_or(CatalogError::NotFound {
                entity: "question type",
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
        if let Some(def) = self.defs.get_mut(&self_id) {
            def.sort_order = other_order;
        }
        if let Some(def) = self.defs.get_mut(&other_id) {
            def.sort_order = self_order;
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
    use exam_core::time::fixed_clock;

    fn form(kind: QuestionKind, name: &str, order: u32) -> QuestionTypeForm {
        QuestionTypeForm {
            subject_id: SubjectId::new("s1"),
            internal_kind: kind,
            display_name: name.into(),
            sort_order: order,
            status: EntityStatus::Active,
        }
    }

    #[test]
    fn all_three_uniqueness_rules_fire() {
        let mut c = QuestionTypeCatalog::new(fixed_clock());
        c.add_definition(form(QuestionKind::Single, "Single choice", 1))
            .unwrap();

        assert_eq!(
            c.add_definition(form(QuestionKind::Single, "Another", 2))
                .unwrap_err(),
            CatalogError::DuplicateInternalKind
        );
        assert!(matches!(
            c.add_definition(form(QuestionKind::Multiple, "Single choice", 2))
                .unwrap_err(),
            CatalogError::DuplicateName { .. }
        ));
        assert_eq!(
            c.add_definition(form(QuestionKind::Multiple, "Multi choice", 1))
                .unwrap_err(),
            CatalogError::DuplicateSortOrder
        );
    }

    #[test]
    fn listing_follows_sort_order() {
        let mut c = QuestionTypeCatalog::new(fixed_clock());
        c.add_definition(form(QuestionKind::Essay, "Essay", 3)).unwrap();
        c.add_definition(form(QuestionKind::Single, "Single", 1)).unwrap();
        c.add_definition(form(QuestionKind::Multiple, "Multi", 2)).unwrap();

        let names: Vec<&str> = c
            .by_subject(&SubjectId::new("s1"))
            .iter()
            .map(|d| d.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Single", "Multi", "Essay"]);
    }

    #[test]
    fn move_swaps_sort_orders() {
        let mut c = QuestionTypeCatalog::new(fixed_clock());
        let single = c.add_definition(form(QuestionKind::Single, "Single", 1)).unwrap();
        c.add_definition(form(QuestionKind::Multiple, "Multi", 2)).unwrap();

        assert_eq!(
            c.move_definition(&single.id, MoveDirection::Up).unwrap_err(),
            CatalogError::AlreadyFirst
        );
        c.move_definition(&single.id, MoveDirection::Down).unwrap();
        assert_eq!(c.definition(&single.id).unwrap().sort_order, 2);
    }

    #[test]
    fn subject_scoping_allows_same_values_elsewhere() {
        let mut c = QuestionTypeCatalog::new(fixed_clock());
        c.add_definition(form(QuestionKind::Single, "Single", 1)).unwrap();

        let mut other = form(QuestionKind::Single, "Single", 1);
        other.subject_id = SubjectId::new("s2");
        assert!(c.add_definition(other).is_ok());
        assert_eq!(c.subject_type_count(&SubjectId::new("s1")), 1);
    }
}
