use std::collections::HashMap;

use exam_core::model::{Chapter, ChapterId, EntityStatus, Section, SectionId, SubjectId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;
use crate::question_bank::QuestionBank;

/// Write model for a chapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterForm {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
}

/// Write model for a section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionForm {
    pub chapter_id: ChapterId,
    pub chapter_name: String,
    pub name: String,
    pub status: EntityStatus,
    pub order: u32,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPatch {
    pub name: Option<String>,
    pub status: Option<EntityStatus>,
    pub order: Option<u32>,
}

/// In-memory store for chapters and their sections.
///
/// Chapter names are unique per subject, section names per chapter, both
/// case-sensitively. Deleting a chapter is blocked while sections or bank
/// questions still hang off it.
pub struct ChapterCatalog {
    clock: Clock,
    chapters: HashMap<ChapterId, Chapter>,
    chapter_order: Vec<ChapterId>,
    sections: HashMap<SectionId, Section>,
    section_order: Vec<SectionId>,
}

impl ChapterCatalog {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            chapters: HashMap::new(),
            chapter_order: Vec::new(),
            sections: HashMap::new(),
            section_order: Vec::new(),
        }
    }

    //
    // ─── CHAPTERS ──────────────────────────────────────────────────────────
    //

    /// Chapters of one subject in `order` sequence.
    #[must_use]
    pub fn chapters_by_subject(&self, subject_id: &SubjectId) -> Vec<&Chapter> {
        let mut chapters: Vec<&Chapter> = self
            .chapter_order
            .iter()
            .filter_map(|id| self.chapters.get(id))
            .filter(|ch| &ch.subject_id == subject_id)
            .collect();
        chapters.sort_by_key(|ch| ch.order);
        chapters
    }

    #[must_use]
    pub fn chapter(&self, id: &ChapterId) -> Option<&Chapter> {
        self.chapters.get(id)
    }

    /// Adds a chapter.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateName` when the subject already has a
    /// chapter with this name.
    pub fn add_chapter(&mut self, form: ChapterForm) -> Result<Chapter, CatalogError> {
        let duplicate = self
            .chapters
            .values()
            .any(|ch| ch.subject_id == form.subject_id && ch.name == form.name);
        if duplicate {
            return Err(CatalogError::DuplicateName {
                entity: "chapter",
                scope: "subject",
            });
        }

        let chapter = Chapter {
            id: ChapterId::new(format!("ch-{}", Uuid::new_v4())),
            subject_id: form.subject_id,
            subject_name: form.subject_name,
            name: form.name,
            status: form.status,
            order: form.order,
            created_at: self.clock.now(),
            updated_at: None,
        };
        self.chapter_order.push(chapter.id.clone());
        self.chapters.insert(chapter.id.clone(), chapter.clone());
        Ok(chapter)
    }

    /// Applies a partial update to a chapter, re-checking name uniqueness
    /// on rename.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `DuplicateName`.
    pub fn update_chapter(
        &mut self,
        id: &ChapterId,
        patch: CatalogPatch,
    ) -> Result<(), CatalogError> {
        let chapter = self
            .chapters
            .get(id)
            .ok_or(CatalogError::NotFound { entity: "chapter" })?;

        if let Some(name) = &patch.name {
            if name != &chapter.name {
                let duplicate = self.chapters.values().any(|ch| {
                    ch.id != *id && ch.subject_id == chapter.subject_id && &ch.name == name
                });
                if duplicate {
                    return Err(CatalogError::DuplicateName {
                        entity: "chapter",
                        scope: "subject",
                    });
                }
            }
        }

        let now = self.clock.now();
        let chapter = self
            .chapters
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "chapter" })?;
        if let Some(name) = patch.name {
            chapter.name = name;
        }
        if let Some(status) = patch.status {
            chapter.status = status;
        }
        if let Some(order) = patch.order {
            chapter.order = order;
        }
        chapter.updated_at = Some(now);
        Ok(())
    }

    /// Deletes a chapter once nothing references it anymore.
    ///
    /// # Errors
    ///
    /// Returns `ChapterHasSections` while sections remain, `ChapterInUse`
    /// while bank questions reference the chapter, `NotFound` otherwise.
    pub fn delete_chapter(
        &mut self,
        id: &ChapterId,
        bank: &QuestionBank,
    ) -> Result<(), CatalogError> {
        if !self.chapters.contains_key(id) {
            return Err(CatalogError::NotFound { entity: "chapter" });
        }

        let section_count = self
            .sections
            .values()
            .filter(|sec| &sec.chapter_id == id)
            .count();
        if section_count > 0 {
            return Err(CatalogError::ChapterHasSections {
                count: section_count,
            });
        }

        let question_count = bank.count_by_chapter(id);
        if question_count > 0 {
            return Err(CatalogError::ChapterInUse {
                count: question_count,
            });
        }

        self.chapters.remove(id);
        self.chapter_order.retain(|ch| ch != id);
        Ok(())
    }

    /// Flips a chapter's status.
    ///
    /// Name uniqueness is status-blind here, so no two same-named chapters
    /// can exist in a subject in the first place and enabling needs no
    /// extra sibling check.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_chapter_status(&mut self, id: &ChapterId) -> Result<(), CatalogError> {
        let now = self.clock.now();
        let chapter = self
            .chapters
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "chapter" })?;
        chapter.status = chapter.status.toggled();
        chapter.updated_at = Some(now);
        Ok(())
    }

    //
    // ─── SECTIONS ──────────────────────────────────────────────────────────
    //

    /// Sections of one chapter in `order` sequence.
    #[must_use]
    pub fn sections_by_chapter(&self, chapter_id: &ChapterId) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self
            .section_order
            .iter()
            .filter_map(|id| self.sections.get(id))
            .filter(|sec| &sec.chapter_id == chapter_id)
            .collect();
        sections.sort_by_key(|sec| sec.order);
        sections
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    /// Adds a section.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateName` when the chapter already has a
    /// section with this name.
    pub fn add_section(&mut self, form: SectionForm) -> Result<Section, CatalogError> {
        let duplicate = self
            .sections
            .values()
            .any(|sec| sec.chapter_id == form.chapter_id && sec.name == form.name);
        if duplicate {
            return Err(CatalogError::DuplicateName {
                entity: "section",
                scope: "chapter",
            });
        }

        let section = Section {
            id: SectionId::new(format!("sec-{}", Uuid::new_v4())),
            chapter_id: form.chapter_id,
            chapter_name: form.chapter_name,
            name: form.name,
            status: form.status,
            order: form.order,
            created_at: self.clock.now(),
            updated_at: None,
        };
        self.section_order.push(section.id.clone());
        self.sections.insert(section.id.clone(), section.clone());
        Ok(section)
    }

    /// Applies a partial update to a section, re-checking name uniqueness
    /// on rename.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `DuplicateName`.
    pub fn update_section(
        &mut self,
        id: &SectionId,
        patch: CatalogPatch,
    ) -> Result<(), CatalogError> {
        let section = self
            .sections
            .get(id)
            .ok_or(CatalogError::NotFound { entity: "section" })?;

        if let Some(name) = &patch.name {
            if name != &section.name {
                let duplicate = self.sections.values().any(|sec| {
                    sec.id != *id && sec.chapter_id == section.chapter_id && &sec.name == name
                });
                if duplicate {
                    return Err(CatalogError::DuplicateName {
                        entity: "section",
                        scope: "chapter",
                    });
                }
            }
        }

        let now = self.clock.now();
        let section = self
            .sections
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "section" })?;
        if let Some(name) = patch.name {
            section.name = name;
        }
        if let Some(status) = patch.status {
            section.status = status;
        }
        if let Some(order) = patch.order {
            section.order = order;
        }
        section.updated_at = Some(now);
        Ok(())
    }

    /// Deletes a section.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_section(&mut self, id: &SectionId) -> Result<(), CatalogError> {
        if self.sections.remove(id).is_none() {
            return Err(CatalogError::NotFound { entity: "section" });
        }
        self.section_order.retain(|sec| sec != id);
        Ok(())
    }

    /// Flips a section's status. Same reasoning as
    /// [`ChapterCatalog::toggle_chapter_status`].
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_section_status(&mut self, id: &SectionId) -> Result<(), CatalogError> {
        let now = self.clock.now();
        let section = self
            .sections
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "section" })?;
        section.status = section.status.toggled();
        section.updated_at = Some(now);
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_bank::tests::bank_with_question_in_chapter;
    use exam_core::time::fixed_clock;

    fn chapter_form(name: &str) -> ChapterForm {
        ChapterForm {
            subject_id: SubjectId::new("s1"),
            subject_name: "Strategy".into(),
            name: name.into(),
            status: EntityStatus::Active,
            order: 1,
        }
    }

    fn section_form(chapter_id: &ChapterId, name: &str) -> SectionForm {
        SectionForm {
            chapter_id: chapter_id.clone(),
            chapter_name: "Chapter 1".into(),
            name: name.into(),
            status: EntityStatus::Active,
            order: 1,
        }
    }

    #[test]
    fn duplicate_chapter_name_in_subject_is_rejected() {
        let mut c = ChapterCatalog::new(fixed_clock());
        c.add_chapter(chapter_form("Chapter 1")).unwrap();
        let err = c.add_chapter(chapter_form("Chapter 1")).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateName { entity: "chapter", scope: "subject" }
        );

        // Same name under a different subject is fine.
        let mut other = chapter_form("Chapter 1");
        other.subject_id = SubjectId::new("s2");
        assert!(c.add_chapter(other).is_ok());
    }

    #[test]
    fn rename_collision_is_rejected_case_sensitively() {
        let mut c = ChapterCatalog::new(fixed_clock());
        c.add_chapter(chapter_form("Chapter 1")).unwrap();
        let second = c.add_chapter(chapter_form("chapter 1")).unwrap();

        let err = c
            .update_chapter(
                &second.id,
                CatalogPatch { name: Some("Chapter 1".into()), ..CatalogPatch::default() },
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { .. }));
    }

    #[test]
    fn chapter_delete_is_blocked_by_sections_then_questions() {
        let mut c = ChapterCatalog::new(fixed_clock());
        let chapter = c.add_chapter(chapter_form("Chapter 1")).unwrap();
        let section = c.add_section(section_form(&chapter.id, "Section 1")).unwrap();

        let bank = bank_with_question_in_chapter(&chapter.id);
        assert_eq!(
            c.delete_chapter(&chapter.id, &bank).unwrap_err(),
            CatalogError::ChapterHasSections { count: 1 }
        );

        c.delete_section(&section.id).unwrap();
        assert_eq!(
            c.delete_chapter(&chapter.id, &bank).unwrap_err(),
            CatalogError::ChapterInUse { count: 1 }
        );

        let empty_bank = QuestionBank::new(fixed_clock());
        c.delete_chapter(&chapter.id, &empty_bank).unwrap();
        assert!(c.chapter(&chapter.id).is_none());
    }

    #[test]
    fn sections_list_in_order_sequence() {
        let mut c = ChapterCatalog::new(fixed_clock());
        let chapter = c.add_chapter(chapter_form("Chapter 1")).unwrap();

        let mut late = section_form(&chapter.id, "Late");
        late.order = 2;
        let mut early = section_form(&chapter.id, "Early");
        early.order = 1;
        c.add_section(late).unwrap();
        c.add_section(early).unwrap();

        let names: Vec<&str> = c
            .sections_by_chapter(&chapter.id)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }

    #[test]
    fn toggling_flips_status_and_stamps_update_time() {
        let mut c = ChapterCatalog::new(fixed_clock());
        let chapter = c.add_chapter(chapter_form("Chapter 1")).unwrap();
        let section = c.add_section(section_form(&chapter.id, "Section 1")).unwrap();

        c.toggle_chapter_status(&chapter.id).unwrap();
        assert_eq!(c.chapter(&chapter.id).unwrap().status, EntityStatus::Disabled);
        assert!(c.chapter(&chapter.id).unwrap().updated_at.is_some());

        c.toggle_section_status(&section.id).unwrap();
        c.toggle_section_status(&section.id).unwrap();
        assert_eq!(c.section(&section.id).unwrap().status, EntityStatus::Active);
    }
}
