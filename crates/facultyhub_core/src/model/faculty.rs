//! Faculty domain model.
//!
//! # Responsibility
//! - Define the faculty record owned by self-service profile updates.
//! - Validate the scalar fields before they reach storage.
//!
//! # Invariants
//! - `id` is system-assigned and immutable; `employee_id` is user-facing and
//!   may change.
//! - `email` is unique across all faculty, compared case-insensitively.

use crate::model::course::DepartmentId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Storage-assigned surrogate id of a faculty record.
pub type FacultyId = i64;

/// Faculty member eligible to teach courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: FacultyId,
    /// Optional institution-issued identifier shown to users.
    pub employee_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: String,
    pub photograph_path: Option<String>,
    pub department_id: DepartmentId,
}

/// Field-level validation failures for faculty records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacultyValidationError {
    BlankFirstName,
    BlankEmail,
    InvalidEmail(String),
    BlankTitle,
}

impl Display for FacultyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstName => write!(f, "first name is required"),
            Self::BlankEmail => write!(f, "email is required"),
            Self::InvalidEmail(email) => write!(f, "email is not valid: `{email}`"),
            Self::BlankTitle => write!(f, "title is required"),
        }
    }
}

impl Error for FacultyValidationError {}

impl Faculty {
    /// Name written into the denormalized `faculty_name` of assigned courses.
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }

    /// Validates fields every persisted faculty record must satisfy.
    pub fn validate(&self) -> Result<(), FacultyValidationError> {
        validate_first_name(&self.first_name)?;
        validate_email(&self.email)
    }
}

/// Joins first and last name with one space, trimming the result.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}

pub(crate) fn validate_first_name(first_name: &str) -> Result<(), FacultyValidationError> {
    if first_name.trim().is_empty() {
        return Err(FacultyValidationError::BlankFirstName);
    }
    Ok(())
}

/// Checks that `email` looks like `local@domain.tld` without whitespace.
pub fn validate_email(email: &str) -> Result<(), FacultyValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(FacultyValidationError::BlankEmail);
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(FacultyValidationError::InvalidEmail(trimmed.to_string()));
    }
    Ok(())
}

/// Case-insensitive email comparison used for change detection.
pub fn same_email(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

#[cfg(test)]
mod tests {
    use super::{display_name, same_email, validate_email, Faculty, FacultyValidationError};

    fn faculty() -> Faculty {
        Faculty {
            id: 1,
            employee_id: Some("EMP-1".to_string()),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.edu".to_string(),
            title: "Professor".to_string(),
            photograph_path: None,
            department_id: 1,
        }
    }

    #[test]
    fn display_name_joins_first_and_last_name() {
        assert_eq!(faculty().display_name(), "Ada Lovelace");
        assert_eq!(display_name(" Ada ", ""), "Ada");
    }

    #[test]
    fn validate_rejects_blank_first_name() {
        let mut record = faculty();
        record.first_name = "   ".to_string();
        assert_eq!(
            record.validate(),
            Err(FacultyValidationError::BlankFirstName)
        );
    }

    #[test]
    fn validate_email_rejects_malformed_values() {
        assert!(validate_email("ada@example.edu").is_ok());
        assert_eq!(validate_email(" "), Err(FacultyValidationError::BlankEmail));
        assert!(matches!(
            validate_email("ada at example"),
            Err(FacultyValidationError::InvalidEmail(_))
        ));
        assert!(validate_email("ada@localhost").is_err());
    }

    #[test]
    fn same_email_ignores_case_and_padding() {
        assert!(same_email("Ada@Example.edu ", "ada@example.edu"));
        assert!(!same_email("ada@example.edu", "ada@example.org"));
    }
}
