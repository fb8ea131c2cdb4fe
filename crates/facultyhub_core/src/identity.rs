//! Caller identity resolution.
//!
//! # Responsibility
//! - Map the authenticated caller to exactly one faculty record.
//! - Replace ambient "current user" lookups with an explicit collaborator
//!   handed to the profile orchestrator.
//!
//! # Invariants
//! - Self-service writes only ever target the id returned here.

use crate::model::faculty::FacultyId;
use crate::repo::faculty_repo::{FacultyRepository, RepoError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from resolving the current caller.
#[derive(Debug)]
pub enum IdentityError {
    /// No authenticated principal is attached to the request.
    NotAuthenticated,
    /// Authenticated email has no faculty record.
    NotRegistered(String),
    Repo(RepoError),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "caller is not authenticated"),
            Self::NotRegistered(email) => {
                write!(f, "no faculty record is registered for `{email}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for IdentityError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Resolves "who is calling" to a faculty id.
pub trait IdentityResolver {
    fn current_faculty_id(&self) -> Result<FacultyId, IdentityError>;
}

/// Identity captured for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    faculty_id: Option<FacultyId>,
}

impl SessionIdentity {
    pub fn authenticated(faculty_id: FacultyId) -> Self {
        Self {
            faculty_id: Some(faculty_id),
        }
    }

    pub fn anonymous() -> Self {
        Self { faculty_id: None }
    }
}

impl IdentityResolver for SessionIdentity {
    fn current_faculty_id(&self) -> Result<FacultyId, IdentityError> {
        self.faculty_id.ok_or(IdentityError::NotAuthenticated)
    }
}

/// Builds a session identity from the email asserted by the identity provider.
///
/// `None` or a blank email means the provider did not authenticate the caller.
pub fn resolve_by_email<R: FacultyRepository>(
    repo: &R,
    email: Option<&str>,
) -> Result<SessionIdentity, IdentityError> {
    let email = match email.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(IdentityError::NotAuthenticated),
    };

    match repo.find_by_email(email)? {
        Some(faculty) => Ok(SessionIdentity::authenticated(faculty.id)),
        None => {
            warn!("event=identity_resolve module=identity status=error error_code=not_registered");
            Err(IdentityError::NotRegistered(email.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityError, IdentityResolver, SessionIdentity};

    #[test]
    fn anonymous_session_is_not_authenticated() {
        let err = SessionIdentity::anonymous()
            .current_faculty_id()
            .expect_err("anonymous caller must be rejected");
        assert!(matches!(err, IdentityError::NotAuthenticated));
    }

    #[test]
    fn authenticated_session_returns_its_faculty() {
        let identity = SessionIdentity::authenticated(42);
        assert_eq!(identity.current_faculty_id().unwrap(), 42);
    }
}
