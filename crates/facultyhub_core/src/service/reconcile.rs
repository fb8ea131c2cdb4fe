//! Faculty-course assignment reconciliation.
//!
//! # Responsibility
//! - Move one faculty's assignments from the current set to a desired set.
//! - Keep `courses.faculty_name` in lockstep with `faculty_courses`.
//!
//! # Invariants
//! - Each course has at most one assignment after every commit.
//! - Release (clear names, delete rows) completes before any validation read,
//!   so a course the caller already holds never looks taken.
//! - Release, validation and claim share one transaction; any failure rolls
//!   the release back too.
//! - Conflicts are checked in the order ids were supplied, so the reported
//!   course is reproducible for a given input.

use crate::model::course::{Assignment, CourseId};
use crate::model::faculty::{Faculty, FacultyId};
use crate::repo::assignment_repo::{AssignmentStore, SqliteAssignmentStore};
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use crate::repo::faculty_repo::{FacultyRepository, RepoError, SqliteFacultyRepository};
use log::{error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from one reconciliation.
#[derive(Debug)]
pub enum ReconcileError {
    FacultyNotFound(FacultyId),
    /// Some requested course ids do not exist.
    CoursesNotFound { expected: usize, found: usize },
    /// A requested course is held by a different faculty.
    CourseAlreadyAssigned {
        course_id: CourseId,
        course_name: String,
        course_code: String,
    },
    Storage(RepoError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FacultyNotFound(id) => write!(f, "faculty not found: {id}"),
            Self::CoursesNotFound { expected, found } => write!(
                f,
                "one or more courses not found: expected {expected} but found {found}"
            ),
            Self::CourseAlreadyAssigned {
                course_id,
                course_name,
                course_code,
            } => write!(
                f,
                "course '{course_name}' ({course_code}, id {course_id}) is already assigned to another faculty member"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ReconcileError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for ReconcileError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.into())
    }
}

/// Collapses duplicate course ids, keeping first-seen order.
pub fn normalize_course_ids(ids: &[CourseId]) -> Vec<CourseId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Replaces the assignments of `faculty` with `desired`.
///
/// Runs release, validate and claim against the given stores. The caller owns
/// the transaction: nothing here commits, and an `Err` must be followed by a
/// rollback (dropping the `rusqlite::Transaction` does that).
pub fn reconcile_assignments<A, C>(
    assignments: &A,
    catalog: &C,
    faculty: &Faculty,
    desired: &[CourseId],
) -> Result<Vec<Assignment>, ReconcileError>
where
    A: AssignmentStore + ?Sized,
    C: CatalogRepository + ?Sized,
{
    let desired = normalize_course_ids(desired);

    // Release.
    let current = assignments.assignments_for_faculty(faculty.id)?;
    for assignment in &current {
        assignments.set_course_faculty_name(assignment.course_id, None)?;
    }
    assignments.delete_assignments_for_faculty(faculty.id)?;

    if desired.is_empty() {
        return Ok(Vec::new());
    }

    // Validate.
    let courses = catalog.find_courses(&desired)?;
    if courses.len() < desired.len() {
        return Err(ReconcileError::CoursesNotFound {
            expected: desired.len(),
            found: courses.len(),
        });
    }
    for course in &courses {
        if assignments
            .holder_other_than(course.id, faculty.id)?
            .is_some()
        {
            return Err(ReconcileError::CourseAlreadyAssigned {
                course_id: course.id,
                course_name: course.name.clone(),
                course_code: course.code.clone(),
            });
        }
    }

    // Claim.
    let display_name = faculty.display_name();
    let mut claimed = Vec::with_capacity(courses.len());
    for course in &courses {
        let assignment = Assignment {
            faculty_id: faculty.id,
            course_id: course.id,
        };
        assignments.insert_assignment(assignment)?;
        assignments.set_course_faculty_name(course.id, Some(display_name.as_str()))?;
        claimed.push(assignment);
    }

    Ok(claimed)
}

/// Rewrites `faculty_name` on every course `faculty` holds.
///
/// Used when a profile update renames the faculty without touching the
/// course set. Returns the number of courses rewritten.
pub fn refresh_faculty_name<A>(assignments: &A, faculty: &Faculty) -> Result<usize, RepoError>
where
    A: AssignmentStore + ?Sized,
{
    let display_name = faculty.display_name();
    let held = assignments.assignments_for_faculty(faculty.id)?;
    for assignment in &held {
        assignments.set_course_faculty_name(assignment.course_id, Some(display_name.as_str()))?;
    }
    Ok(held.len())
}

/// Standalone entry point that wraps one reconciliation in its own
/// transaction.
pub struct AssignmentService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> AssignmentService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Reconciles `faculty_id` to `desired` atomically.
    ///
    /// An empty `desired` unassigns every course held by the faculty.
    pub fn reconcile(
        &mut self,
        faculty_id: FacultyId,
        desired: &[CourseId],
    ) -> Result<Vec<Assignment>, ReconcileError> {
        let started_at = Instant::now();
        let result = self.reconcile_in_tx(faculty_id, desired);
        log_reconcile_outcome(faculty_id, desired.len(), &result, started_at);
        result
    }

    /// Courses currently held by `faculty_id`, ordered by id.
    pub fn current_course_ids(&self, faculty_id: FacultyId) -> Result<Vec<CourseId>, RepoError> {
        let store = SqliteAssignmentStore::new(self.conn);
        Ok(store
            .assignments_for_faculty(faculty_id)?
            .into_iter()
            .map(|assignment| assignment.course_id)
            .collect())
    }

    fn reconcile_in_tx(
        &mut self,
        faculty_id: FacultyId,
        desired: &[CourseId],
    ) -> Result<Vec<Assignment>, ReconcileError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let faculty = SqliteFacultyRepository::new(&tx)
            .get_faculty(faculty_id)?
            .ok_or(ReconcileError::FacultyNotFound(faculty_id))?;

        let claimed = reconcile_assignments(
            &SqliteAssignmentStore::new(&tx),
            &SqliteCatalogRepository::new(&tx),
            &faculty,
            desired,
        )?;
        tx.commit()?;
        Ok(claimed)
    }
}

pub(crate) fn log_reconcile_outcome(
    faculty_id: FacultyId,
    requested: usize,
    result: &Result<Vec<Assignment>, ReconcileError>,
    started_at: Instant,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(claimed) => info!(
            "event=reconcile module=assignment status=ok faculty_id={} requested={} claimed={} duration_ms={}",
            faculty_id,
            requested,
            claimed.len(),
            duration_ms
        ),
        Err(ReconcileError::Storage(err)) => error!(
            "event=reconcile module=assignment status=error faculty_id={} duration_ms={} error_code=storage_failure error={}",
            faculty_id, duration_ms, err
        ),
        Err(err) => warn!(
            "event=reconcile module=assignment status=rejected faculty_id={} duration_ms={} error={}",
            faculty_id, duration_ms, err
        ),
    }
}
