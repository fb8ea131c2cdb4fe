//! Catalog read service for departments and courses.
//!
//! # Invariants
//! - Read-only toward assignment state; course seeding never sets
//!   `faculty_name`.

use crate::model::course::{Course, CourseId, Department};
use crate::repo::catalog_repo::{CatalogRepository, NewCourse};
use crate::repo::faculty_repo::{EntityKind, RepoError, RepoResult};

/// Use-case wrapper over a catalog repository.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_departments(&self) -> RepoResult<Vec<Department>> {
        self.repo.list_departments()
    }

    pub fn list_courses(&self) -> RepoResult<Vec<Course>> {
        self.repo.list_courses()
    }

    /// Gets one course, mapping absence to `RepoError::NotFound`.
    pub fn get_course(&self, id: CourseId) -> RepoResult<Course> {
        self.repo.get_course(id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::Course,
            id,
        })
    }

    /// Seeds one department (administrative tooling).
    pub fn create_department(&self, name: &str, capacity: i64) -> RepoResult<Department> {
        self.repo.create_department(name, capacity)
    }

    /// Seeds one unassigned course (administrative tooling).
    pub fn create_course(&self, course: &NewCourse) -> RepoResult<Course> {
        self.repo.create_course(course)
    }
}
