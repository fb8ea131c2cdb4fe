//! Department, course and assignment records.
//!
//! # Invariants
//! - `Course::faculty_name` is written only as a side effect of assignment
//!   changes; catalog paths create courses with it unset.
//! - An `Assignment` links exactly one faculty to exactly one course.

use crate::model::faculty::FacultyId;
use serde::{Deserialize, Serialize};

pub type DepartmentId = i64;
pub type CourseId = i64;

/// Academic department referenced by faculty records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub capacity: i64,
}

/// Course offered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    /// Unique catalog code, e.g. `CS101`.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub year: Option<i64>,
    pub term: Option<String>,
    pub credits: i64,
    pub capacity: i64,
    /// Display name of the assigned faculty; `None` when unassigned.
    pub faculty_name: Option<String>,
}

/// The relation "this faculty currently teaches this course".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub faculty_id: FacultyId,
    pub course_id: CourseId,
}
