use std::collections::HashMap;

use exam_core::model::{ChapterId, EntityStatus, Paper, PaperId};
use exam_core::Clock;
use uuid::Uuid;

use crate::chapters::CatalogPatch;
use crate::error::CatalogError;

/// Write model for a chapter paper.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperForm {
    pub chapter_id: ChapterId,
    pub chapter_name: String,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
}

/// In-memory store for the practice papers attached to chapters.
///
/// Paper names are unique per chapter. Fresh papers never start as the
/// chapter-practice paper; that flag is owned by the stage configuration.
pub struct PaperStore {
    clock: Clock,
    papers: HashMap<PaperId, Paper>,
    order: Vec<PaperId>,
}

impl PaperStore {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            papers: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn paper(&self, id: &PaperId) -> Option<&Paper> {
        self.papers.get(id)
    }

    /// Papers of one chapter in `order` sequence.
    #[must_use]
    pub fn papers_by_chapter(&self, chapter_id: &ChapterId) -> Vec<&Paper> {
        let mut papers: Vec<&Paper> = self
            .order
            .iter()
            .filter_map(|id| self.papers.get(id))
            .filter(|paper| &paper.chapter_id == chapter_id)
            .collect();
        papers.sort_by_key(|paper| paper.order);
        papers
    }

    /// Adds a paper.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateName` when the chapter already has a
    /// paper with this name.
    pub fn add_paper(&mut self, form: PaperForm) -> Result<Paper, CatalogError> {
        let duplicate = self
            .papers
            .values()
            .any(|paper| paper.chapter_id == form.chapter_id && paper.name == form.name);
        if duplicate {
            return Err(CatalogError::DuplicateName {
                entity: "paper",
                scope: "chapter",
            });
        }

        let paper = Paper {
            id: PaperId::new(format!("paper-{}", Uuid::new_v4())),
            chapter_id: form.chapter_id,
            chapter_name: form.chapter_name,
            name: form.name,
            status: form.status,
            order: form.order,
            created_at: self.clock.now(),
            updated_at: None,
            is_chapter_practice: false,
        };
        self.order.push(paper.id.clone());
        self.papers.insert(paper.id.clone(), paper.clone());
        Ok(paper)
    }

    /// Applies a partial update, re-checking name uniqueness on rename.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `DuplicateName`.
    pub fn update_paper(&mut self, id: &PaperId, patch: CatalogPatch) -> Result<(), CatalogError> {
        let paper = self
            .papers
            .get(id)
            .ok_or(CatalogError::NotFound { entity: "paper" })?;

        if let Some(name) = &patch.name {
            if name != &paper.name {
                let duplicate = self.papers.values().any(|p| {
                    p.id != *id && p.chapter_id == paper.chapter_id && &p.name == name
                });
                if duplicate {
                    return Err(CatalogError::DuplicateName {
                        entity: "paper",
                        scope: "chapter",
                    });
                }
            }
        }

        let now = self.clock.now();
        let paper = self
            .papers
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "paper" })?;
        if let Some(name) = patch.name {
            paper.name = name;
        }
        if let Some(status) = patch.status {
            paper.status = status;
        }
        if let Some(order) = patch.order {
            paper.order = order;
        }
        paper.updated_at = Some(now);
        Ok(())
    }

    /// Deletes a paper.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_paper(&mut self, id: &PaperId) -> Result<(), CatalogError> {
        if self.papers.remove(id).is_none() {
            return Err(CatalogError::NotFound { entity: "paper" });
        }
        self.order.retain(|p| p != id);
        Ok(())
    }

    /// Flips a paper's status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_paper_status(&mut self, id: &PaperId) -> Result<(), CatalogError> {
        let now = self.clock.now();
        let paper = self
            .papers
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "paper" })?;
        paper.status = paper.status.toggled();
        paper.updated_at = Some(now);
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

    fn form(chapter: &str, name: &str, order: u32) -> PaperForm {
        PaperForm {
            chapter_id: ChapterId::new(chapter),
            chapter_name: "Chapter".into(),
            name: name.into(),
            status: EntityStatus::Active,
            order,
        }
    }

    #[test]
    fn names_are_unique_per_chapter() {
        let mut store = PaperStore::new(fixed_clock());
        store.add_paper(form("ch-001", "Mock paper", 1)).unwrap();

        assert!(matches!(
            store.add_paper(form("ch-001", "Mock paper", 2)).unwrap_err(),
            CatalogError::DuplicateName { .. }
        ));
        assert!(store.add_paper(form("ch-002", "Mock paper", 1)).is_ok());
    }

    #[test]
    fn new_papers_are_not_chapter_practice() {
        let mut store = PaperStore::new(fixed_clock());
        let paper = store.add_paper(form("ch-001", "Mock paper", 1)).unwrap();
        assert!(!paper.is_chapter_practice);
    }

    #[test]
    fn chapter_listing_sorts_by_order() {
        let mut store = PaperStore::new(fixed_clock());
        store.add_paper(form("ch-001", "Second", 2)).unwrap();
        store.add_paper(form("ch-001", "First", 1)).unwrap();
        store.add_paper(form("ch-002", "Elsewhere", 1)).unwrap();

        let names: Vec<&str> = store
            .papers_by_chapter(&ChapterId::new("ch-001"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn rename_collision_is_rejected() {
        let mut store = PaperStore::new(fixed_clock());
        store.add_paper(form("ch-001", "One", 1)).unwrap();
        let two = store.add_paper(form("ch-001", "Two", 2)).unwrap();

        let err = store
            .update_paper(
                &two.id,
                CatalogPatch { name: Some("One".into()), ..CatalogPatch::default() },
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { .. }));
    }
}
