//! Faculty repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist faculty scalar fields and answer email-uniqueness questions.
//! - Define the shared repository error type.
//!
//! # Invariants
//! - Write paths call `Faculty::validate()` before SQL mutations.
//! - Email lookups are case-insensitive, matching the storage index.

use crate::db::DbError;
use crate::model::course::DepartmentId;
use crate::model::faculty::{Faculty, FacultyId, FacultyValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FACULTY_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    first_name,
    last_name,
    email,
    title,
    photograph_path,
    department_id
FROM employees";

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kinds named by `NotFound` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Faculty,
    Department,
    Course,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Faculty => "faculty",
            Self::Department => "department",
            Self::Course => "course",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository error shared by faculty, catalog and assignment storage.
#[derive(Debug)]
pub enum RepoError {
    Validation(FacultyValidationError),
    Db(DbError),
    NotFound { entity: EntityKind, id: i64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<FacultyValidationError> for RepoError {
    fn from(value: FacultyValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Insert model for a faculty record; the id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFaculty {
    pub employee_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: String,
    pub photograph_path: Option<String>,
    pub department_id: DepartmentId,
}

/// Repository interface for faculty records.
pub trait FacultyRepository {
    fn create_faculty(&self, faculty: &NewFaculty) -> RepoResult<Faculty>;
    fn get_faculty(&self, id: FacultyId) -> RepoResult<Option<Faculty>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Faculty>>;
    /// Whether any faculty other than `exclude` already uses `email`.
    fn email_in_use(&self, email: &str, exclude: Option<FacultyId>) -> RepoResult<bool>;
    fn update_faculty(&self, faculty: &Faculty) -> RepoResult<()>;
}

/// SQLite-backed faculty repository.
pub struct SqliteFacultyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFacultyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FacultyRepository for SqliteFacultyRepository<'_> {
    fn create_faculty(&self, faculty: &NewFaculty) -> RepoResult<Faculty> {
        let mut record = Faculty {
            id: 0,
            employee_id: faculty.employee_id.clone(),
            first_name: faculty.first_name.trim().to_string(),
            last_name: faculty.last_name.trim().to_string(),
            email: faculty.email.trim().to_string(),
            title: faculty.title.trim().to_string(),
            photograph_path: faculty.photograph_path.clone(),
            department_id: faculty.department_id,
        };
        record.validate()?;

        self.conn.execute(
            "INSERT INTO employees (
                employee_id,
                first_name,
                last_name,
                email,
                title,
                photograph_path,
                department_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.employee_id.as_deref(),
                record.first_name.as_str(),
                record.last_name.as_str(),
                record.email.as_str(),
                record.title.as_str(),
                record.photograph_path.as_deref(),
                record.department_id,
            ],
        )?;

        record.id = self.conn.last_insert_rowid();
        Ok(record)
    }

    fn get_faculty(&self, id: FacultyId) -> RepoResult<Option<Faculty>> {
        let faculty = self
            .conn
            .query_row(
                &format!("{FACULTY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_faculty_row,
            )
            .optional()?;
        Ok(faculty)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Faculty>> {
        let faculty = self
            .conn
            .query_row(
                &format!("{FACULTY_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"),
                [email.trim()],
                parse_faculty_row,
            )
            .optional()?;
        Ok(faculty)
    }

    fn email_in_use(&self, email: &str, exclude: Option<FacultyId>) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM employees
                WHERE email = ?1 COLLATE NOCASE
                  AND (?2 IS NULL OR id <> ?2)
            );",
            params![email.trim(), exclude],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn update_faculty(&self, faculty: &Faculty) -> RepoResult<()> {
        faculty.validate()?;

        let changed = self.conn.execute(
            "UPDATE employees
             SET
                employee_id = ?1,
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                title = ?5,
                photograph_path = ?6,
                department_id = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8;",
            params![
                faculty.employee_id.as_deref(),
                faculty.first_name.as_str(),
                faculty.last_name.as_str(),
                faculty.email.as_str(),
                faculty.title.as_str(),
                faculty.photograph_path.as_deref(),
                faculty.department_id,
                faculty.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Faculty,
                id: faculty.id,
            });
        }

        Ok(())
    }
}

fn parse_faculty_row(row: &Row<'_>) -> rusqlite::Result<Faculty> {
    Ok(Faculty {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        title: row.get("title")?,
        photograph_path: row.get("photograph_path")?,
        department_id: row.get("department_id")?,
    })
}
