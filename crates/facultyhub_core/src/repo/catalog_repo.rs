//! Department and course catalog repository.
//!
//! # Responsibility
//! - Read departments and courses for orchestration and read views.
//! - Seed catalog rows for administrative tooling and tests.
//!
//! # Invariants
//! - No catalog write touches `courses.faculty_name`; that column belongs to
//!   the assignment store.
//! - List results are ordered by id ascending.

use crate::model::course::{Course, CourseId, Department, DepartmentId};
use crate::repo::faculty_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COURSE_SELECT_SQL: &str = "SELECT
    course_id,
    course_code,
    name,
    description,
    year,
    term,
    credits,
    capacity,
    faculty_name
FROM courses";

/// Insert model for a catalog course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCourse {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub year: Option<i64>,
    pub term: Option<String>,
    pub credits: i64,
    pub capacity: i64,
}

/// Repository interface for departments and courses.
pub trait CatalogRepository {
    fn create_department(&self, name: &str, capacity: i64) -> RepoResult<Department>;
    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    fn list_departments(&self) -> RepoResult<Vec<Department>>;
    fn create_course(&self, course: &NewCourse) -> RepoResult<Course>;
    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>>;
    fn list_courses(&self) -> RepoResult<Vec<Course>>;
    /// Resolves `ids` to courses, in the order given. Unknown ids are skipped.
    fn find_courses(&self, ids: &[CourseId]) -> RepoResult<Vec<Course>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_department(&self, name: &str, capacity: i64) -> RepoResult<Department> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "department name must not be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO departments (name, capacity) VALUES (?1, ?2);",
            params![name, capacity],
        )?;

        Ok(Department {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            capacity,
        })
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT department_id, name, capacity
                 FROM departments
                 WHERE department_id = ?1;",
                [id],
                parse_department_row,
            )
            .optional()?;
        Ok(department)
    }

    fn list_departments(&self) -> RepoResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT department_id, name, capacity
             FROM departments
             ORDER BY department_id ASC;",
        )?;
        let departments = stmt
            .query_map([], parse_department_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(departments)
    }

    fn create_course(&self, course: &NewCourse) -> RepoResult<Course> {
        let code = course.code.trim();
        if code.is_empty() || course.name.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "course code and name must not be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO courses (
                course_code,
                name,
                description,
                year,
                term,
                credits,
                capacity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                code,
                course.name.trim(),
                course.description.as_deref(),
                course.year,
                course.term.as_deref(),
                course.credits,
                course.capacity,
            ],
        )?;

        Ok(Course {
            id: self.conn.last_insert_rowid(),
            code: code.to_string(),
            name: course.name.trim().to_string(),
            description: course.description.clone(),
            year: course.year,
            term: course.term.clone(),
            credits: course.credits,
            capacity: course.capacity,
            faculty_name: None,
        })
    }

    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>> {
        let course = self
            .conn
            .query_row(
                &format!("{COURSE_SELECT_SQL} WHERE course_id = ?1;"),
                [id],
                parse_course_row,
            )
            .optional()?;
        Ok(course)
    }

    fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COURSE_SELECT_SQL} ORDER BY course_id ASC;"))?;
        let courses = stmt
            .query_map([], parse_course_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    fn find_courses(&self, ids: &[CourseId]) -> RepoResult<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{COURSE_SELECT_SQL} WHERE course_id = ?1;"))?;
        let mut courses = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(course) = stmt.query_row([id], parse_course_row).optional()? {
                courses.push(course);
            }
        }
        Ok(courses)
    }
}

fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("department_id")?,
        name: row.get("name")?,
        capacity: row.get("capacity")?,
    })
}

pub(crate) fn parse_course_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get("course_id")?,
        code: row.get("course_code")?,
        name: row.get("name")?,
        description: row.get("description")?,
        year: row.get("year")?,
        term: row.get("term")?,
        credits: row.get("credits")?,
        capacity: row.get("capacity")?,
        faculty_name: row.get("faculty_name")?,
    })
}
