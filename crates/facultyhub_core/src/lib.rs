//! Core domain logic for faculty records.
//! This crate is the single source of truth for the faculty/course
//! assignment invariants.

pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod photo;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use identity::{resolve_by_email, IdentityError, IdentityResolver, SessionIdentity};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::course::{Assignment, Course, CourseId, Department, DepartmentId};
pub use model::faculty::{Faculty, FacultyId, FacultyValidationError};
pub use photo::{photo_file_name, FsPhotoStore, PhotoResult, PhotoStore, PhotoStoreError};
pub use repo::assignment_repo::{AssignmentStore, FacultyNameDrift, SqliteAssignmentStore};
pub use repo::catalog_repo::{CatalogRepository, NewCourse, SqliteCatalogRepository};
pub use repo::faculty_repo::{
    EntityKind, FacultyRepository, NewFaculty, RepoError, RepoResult, SqliteFacultyRepository,
};
pub use service::catalog_service::CatalogService;
pub use service::profile_service::{
    CourseSummary, ErrorPayload, FacultyRegistration, FacultyView, ProfileError, ProfileService,
    ProfileUpdate,
};
pub use service::reconcile::{
    normalize_course_ids, reconcile_assignments, refresh_faculty_name, AssignmentService,
    ReconcileError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
