use std::collections::HashMap;

use exam_core::model::{EntityStatus, Project, ProjectId, Subject, SubjectId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;

/// In-memory store for the project → subject level of the catalog.
///
/// Entities live in keyed maps; explicit id vectors keep a stable listing
/// order that reordering re-sorts by the entities' `order` fields.
pub struct ProjectCatalog {
    clock: Clock,
    projects: HashMap<ProjectId, Project>,
    project_order: Vec<ProjectId>,
    subjects: HashMap<SubjectId, Subject>,
    subject_order: Vec<SubjectId>,
}

impl ProjectCatalog {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            projects: HashMap::new(),
            project_order: Vec::new(),
            subjects: HashMap::new(),
            subject_order: Vec::new(),
        }
    }

    //
    // ─── PROJECTS ──────────────────────────────────────────────────────────
    //

    /// All projects in listing order.
    #[must_use]
    pub fn projects(&self) -> Vec<&Project> {
        self.project_order
            .iter()
            .filter_map(|id| self.projects.get(id))
            .collect()
    }

    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    /// Adds a project at the end of the ordering (`max order + 1`).
    pub fn add_project(&mut self, name: impl Into<String>, status: EntityStatus) -> Project {
        let order = self
            .projects
            .values()
            .map(|p| p.order)
            .max()
            .unwrap_or(0)
            + 1;
        let project = Project {
            id: ProjectId::new(format!("p-{}", Uuid::new_v4())),
            name: name.into(),
            status,
            order,
            created_at: self.clock.now(),
        };
        self.project_order.push(project.id.clone());
        self.projects.insert(project.id.clone(), project.clone());
        project
    }

    /// Renames a project.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn rename_project(
        &mut self,
        id: &ProjectId,
        name: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let project = self
            .projects
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "project" })?;
        project.name = name.into();
        Ok(())
    }

    /// Deletes a project and cascades to its subjects.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_project(&mut self, id: &ProjectId) -> Result<(), CatalogError> {
        if self.projects.remove(id).is_none() {
            return Err(CatalogError::NotFound { entity: "project" });
        }
        self.project_order.retain(|p| p != id);

        self.subjects.retain(|_, s| &s.project_id != id);
        let subjects = &self.subjects;
        self.subject_order.retain(|s| subjects.contains_key(s));
        Ok(())
    }

    /// Flips a project's status.
    ///
    /// Enabling is blocked while another *active* project carries the same
    /// name, so two same-named projects are never live at once.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `ActiveSiblingExists`.
    pub fn toggle_project_status(&mut self, id: &ProjectId) -> Result<(), CatalogError> {
        let project = self
            .projects
            .get(id)
            .ok_or(CatalogError::NotFound { entity: "project" })?;

        if project.status == EntityStatus::Disabled {
            let clash = self.projects.values().any(|p| {
                p.id != *id && p.name == project.name && p.status.is_active()
            });
            if clash {
                return Err(CatalogError::ActiveSiblingExists { entity: "project" });
            }
        }

        let project = self
            .projects
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "project" })?;
        project.status = project.status.toggled();
        Ok(())
    }

    /// Swaps the `order` of two projects after a drag-drop and re-sorts the
    /// listing. Unknown ids are ignored; no other entity is renumbered.
    pub fn reorder_projects(&mut self, dragged: &ProjectId, target: &ProjectId) {
        let (Some(a), Some(b)) = (
            self.projects.get(dragged).map(|p| p.order),
            self.projects.get(target).map(|p| p.order),
        ) else {
            return;
        };

        if let Some(p) = self.projects.get_mut(dragged) {
            p.order = b;
        }
        if let Some(p) = self.projects.get_mut(target) {
            p.order = a;
        }
        let projects = &self.projects;
        self.project_order.sort_by_key(|id| projects[id].order);
    }

    //
    // ─── SUBJECTS ──────────────────────────────────────────────────────────
    //

    /// Subjects of one project in `order` sequence.
    #[must_use]
    pub fn subjects_by_project(&self, project_id: &ProjectId) -> Vec<&Subject> {
        let mut subjects: Vec<&Subject> = self
            .subject_order
            .iter()
            .filter_map(|id| self.subjects.get(id))
            .filter(|s| &s.project_id == project_id)
            .collect();
        subjects.sort_by_key(|s| s.order);
        subjects
    }

    #[must_use]
    pub fn subject(&self, id: &SubjectId) -> Option<&Subject> {
        self.subjects.get(id)
    }

    /// Adds a subject at the end of its project's ordering.
    pub fn add_subject(
        &mut self,
        project_id: ProjectId,
        name: impl Into<String>,
        status: EntityStatus,
    ) -> Subject {
        let order = self
            .subjects
            .values()
            .filter(|s| s.project_id == project_id)
            .map(|s| s.order)
            .max()
            .unwrap_or(0)
            + 1;
        let subject = Subject {
            id: SubjectId::new(format!("s-{}", Uuid::new_v4())),
            project_id,
            name: name.into(),
            status,
            order,
            created_at: self.clock.now(),
        };
        self.subject_order.push(subject.id.clone());
        self.subjects.insert(subject.id.clone(), subject.clone());
        subject
    }

    /// Renames a subject.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn rename_subject(
        &mut self,
        id: &SubjectId,
        name: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let subject = self
            .subjects
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "subject" })?;
        subject.name = name.into();
        Ok(())
    }

    /// Deletes a subject.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn delete_subject(&mut self, id: &SubjectId) -> Result<(), CatalogError> {
        if self.subjects.remove(id).is_none() {
            return Err(CatalogError::NotFound { entity: "subject" });
        }
        self.subject_order.retain(|s| s != id);
        Ok(())
    }

    /// Flips a subject's status with the same-name-active guard scoped to
    /// its project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `ActiveSiblingExists`.
    pub fn toggle_subject_status(&mut self, id: &SubjectId) -> Result<(), CatalogError> {
        let subject = self
            .subjects
            .get(id)
            .ok_or(CatalogError::NotFound { entity: "subject" })?;

        if subject.status == EntityStatus::Disabled {
            let clash = self.subjects.values().any(|s| {
                s.id != *id
                    && s.project_id == subject.project_id
                    && s.name == subject.name
                    && s.status.is_active()
            });
            if clash {
                return Err(CatalogError::ActiveSiblingExists { entity: "subject" });
            }
        }

        let subject = self
            .subjects
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "subject" })?;
        subject.status = subject.status.toggled();
        Ok(())
    }

    /// Swap-reorder for subjects; mirrors [`ProjectCatalog::reorder_projects`].
    pub fn reorder_subjects(&mut self, dragged: &SubjectId, target: &SubjectId) {
        let (Some(a), Some(b)) = (
            self.subjects.get(dragged).map(|s| s.order),
            self.subjects.get(target).map(|s| s.order),
        ) else {
            return;
        };

        if let Some(s) = self.subjects.get_mut(dragged) {
            s.order = b;
        }
        if let Some(s) = self.subjects.get_mut(target) {
            s.order = a;
        }
        let subjects = &self.subjects;
        self.subject_order.sort_by_key(|id| subjects[id].order);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;

    fn catalog() -> ProjectCatalog {
        ProjectCatalog::new(fixed_clock())
    }

    #[test]
    fn add_project_appends_to_the_ordering() {
        let mut c = catalog();
        let first = c.add_project("Senior Accountant", EntityStatus::Active);
        let second = c.add_project("Senior Economist", EntityStatus::Active);

        assert_eq!(first.order, 1);
        assert_eq!(second.order, 2);
        let names: Vec<&str> = c.projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Senior Accountant", "Senior Economist"]);
    }

    #[test]
    fn delete_project_cascades_subjects() {
        let mut c = catalog();
        let project = c.add_project("Senior Accountant", EntityStatus::Active);
        let kept = c.add_project("Senior Economist", EntityStatus::Active);
        c.add_subject(project.id.clone(), "Strategy", EntityStatus::Active);
        let survivor = c.add_subject(kept.id.clone(), "Macro", EntityStatus::Active);

        c.delete_project(&project.id).unwrap();
        assert!(c.subjects_by_project(&project.id).is_empty());
        assert_eq!(c.subject(&survivor.id).map(|s| s.name.as_str()), Some("Macro"));
    }

    #[test]
    fn enabling_a_project_with_an_active_twin_is_blocked() {
        let mut c = catalog();
        let disabled = c.add_project("Senior Accountant", EntityStatus::Disabled);
        c.add_project("Senior Accountant", EntityStatus::Active);

        let err = c.toggle_project_status(&disabled.id).unwrap_err();
        assert_eq!(err, CatalogError::ActiveSiblingExists { entity: "project" });

        // Disabling the active twin always works.
        let active_id = c
            .projects()
            .iter()
            .find(|p| p.status.is_active())
            .unwrap()
            .id
            .clone();
        c.toggle_project_status(&active_id).unwrap();
        c.toggle_project_status(&disabled.id).unwrap();
        assert!(c.project(&disabled.id).unwrap().status.is_active());
    }

    #[test]
    fn reorder_swaps_exactly_two_orders() {
        let mut c = catalog();
        let a = c.add_project("A", EntityStatus::Active);
        let b = c.add_project("B", EntityStatus::Active);
        let d = c.add_project("C", EntityStatus::Active);

        c.reorder_projects(&a.id, &d.id);

        assert_eq!(c.project(&a.id).unwrap().order, 3);
        assert_eq!(c.project(&d.id).unwrap().order, 1);
        // The middle entity keeps its order; no renumbering happens.
        assert_eq!(c.project(&b.id).unwrap().order, 2);
        let names: Vec<&str> = c.projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn subject_orders_are_scoped_per_project() {
        let mut c = catalog();
        let p1 = c.add_project("One", EntityStatus::Active);
        let p2 = c.add_project("Two", EntityStatus::Active);

        let s1 = c.add_subject(p1.id.clone(), "First", EntityStatus::Active);
        let s2 = c.add_subject(p2.id.clone(), "Other first", EntityStatus::Active);
        let s3 = c.add_subject(p1.id.clone(), "Second", EntityStatus::Active);

        assert_eq!(s1.order, 1);
        assert_eq!(s2.order, 1);
        assert_eq!(s3.order, 2);
    }
}
