//! Assignment store: the faculty -> course mapping plus its denormalized
//! course-side copy.
//!
//! # Responsibility
//! - Expose the explicit store operations the reconciliation engine is built
//!   from (`delete_assignments_for_faculty`, `insert_assignment`, ...).
//! - Offer an audit query for the denormalization invariant.
//!
//! # Invariants
//! - `faculty_courses.course_id` is the primary key: one assignment per course.
//! - `courses.faculty_name` is mutated only through this store.

use crate::model::course::{Assignment, Course, CourseId};
use crate::model::faculty::FacultyId;
use crate::repo::catalog_repo::parse_course_row;
use crate::repo::faculty_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Course whose `faculty_name` disagrees with its assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacultyNameDrift {
    pub course_id: CourseId,
    /// Value currently stored on the course row.
    pub stored: Option<String>,
    /// Value implied by the assignment (display name or `None`).
    pub expected: Option<String>,
}

/// Store operations over assignments and the denormalized course field.
pub trait AssignmentStore {
    fn assignments_for_faculty(&self, faculty_id: FacultyId) -> RepoResult<Vec<Assignment>>;
    /// Deletes every assignment of `faculty_id`; returns the number removed.
    fn delete_assignments_for_faculty(&self, faculty_id: FacultyId) -> RepoResult<usize>;
    fn insert_assignment(&self, assignment: Assignment) -> RepoResult<()>;
    /// Faculty other than `faculty_id` currently holding `course_id`, if any.
    fn holder_other_than(
        &self,
        course_id: CourseId,
        faculty_id: FacultyId,
    ) -> RepoResult<Option<FacultyId>>;
    fn set_course_faculty_name(&self, course_id: CourseId, name: Option<&str>) -> RepoResult<()>;
    /// Courses held by `faculty_id`, ordered by course id.
    fn courses_for_faculty(&self, faculty_id: FacultyId) -> RepoResult<Vec<Course>>;
    fn list_assignments(&self) -> RepoResult<Vec<Assignment>>;
    fn find_faculty_name_drift(&self) -> RepoResult<Vec<FacultyNameDrift>>;
}

/// SQLite-backed assignment store.
pub struct SqliteAssignmentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssignmentStore for SqliteAssignmentStore<'_> {
    fn assignments_for_faculty(&self, faculty_id: FacultyId) -> RepoResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT faculty_id, course_id
             FROM faculty_courses
             WHERE faculty_id = ?1
             ORDER BY course_id ASC;",
        )?;
        let assignments = stmt
            .query_map([faculty_id], |row| {
                Ok(Assignment {
                    faculty_id: row.get(0)?,
                    course_id: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assignments)
    }

    fn delete_assignments_for_faculty(&self, faculty_id: FacultyId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM faculty_courses WHERE faculty_id = ?1;",
            [faculty_id],
        )?;
        Ok(removed)
    }

    fn insert_assignment(&self, assignment: Assignment) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO faculty_courses (course_id, faculty_id) VALUES (?1, ?2);",
            params![assignment.course_id, assignment.faculty_id],
        )?;
        Ok(())
    }

    fn holder_other_than(
        &self,
        course_id: CourseId,
        faculty_id: FacultyId,
    ) -> RepoResult<Option<FacultyId>> {
        let holder = self
            .conn
            .query_row(
                "SELECT faculty_id
                 FROM faculty_courses
                 WHERE course_id = ?1
                   AND faculty_id <> ?2;",
                params![course_id, faculty_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(holder)
    }

    fn set_course_faculty_name(&self, course_id: CourseId, name: Option<&str>) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE courses SET faculty_name = ?2 WHERE course_id = ?1;",
            params![course_id, name],
        )?;
        Ok(())
    }

    fn courses_for_faculty(&self, faculty_id: FacultyId) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.course_id AS course_id,
                c.course_code AS course_code,
                c.name AS name,
                c.description AS description,
                c.year AS year,
                c.term AS term,
                c.credits AS credits,
                c.capacity AS capacity,
                c.faculty_name AS faculty_name
             FROM faculty_courses fc
             INNER JOIN courses c ON c.course_id = fc.course_id
             WHERE fc.faculty_id = ?1
             ORDER BY c.course_id ASC;",
        )?;
        let courses = stmt
            .query_map([faculty_id], parse_course_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    fn list_assignments(&self) -> RepoResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT faculty_id, course_id
             FROM faculty_courses
             ORDER BY course_id ASC;",
        )?;
        let assignments = stmt
            .query_map([], |row| {
                Ok(Assignment {
                    faculty_id: row.get(0)?,
                    course_id: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assignments)
    }

    fn find_faculty_name_drift(&self) -> RepoResult<Vec<FacultyNameDrift>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.course_id,
                c.faculty_name,
                CASE
                    WHEN e.id IS NULL THEN NULL
                    ELSE TRIM(TRIM(e.first_name) || ' ' || TRIM(e.last_name))
                END AS expected_name
             FROM courses c
             LEFT JOIN faculty_courses fc ON fc.course_id = c.course_id
             LEFT JOIN employees e ON e.id = fc.faculty_id
             ORDER BY c.course_id ASC;",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FacultyNameDrift {
                    course_id: row.get(0)?,
                    stored: row.get(1)?,
                    expected: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter(|row| row.stored != row.expected)
            .collect())
    }
}
