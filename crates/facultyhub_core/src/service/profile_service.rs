//! Faculty profile use-case service.
//!
//! # Responsibility
//! - Register faculty and serve the caller's own profile.
//! - Apply self-service profile updates, photo replacement and course-set
//!   changes as one transaction.
//!
//! # Invariants
//! - The write target is always the faculty the identity resolver returns;
//!   a request-carried id can only narrow (mismatch is `Forbidden`), never
//!   redirect, the write.
//! - Email stays unique across faculty (case-insensitive).
//! - Old photos are deleted only after the new path is committed, and
//!   deletion failures never fail the update.

use crate::identity::{IdentityError, IdentityResolver};
use crate::model::course::{Course, CourseId, Department, DepartmentId};
use crate::model::faculty::{
    same_email, validate_email, validate_first_name, Faculty, FacultyId, FacultyValidationError,
};
use crate::photo::{photo_file_name, PhotoStore, PhotoStoreError};
use crate::repo::assignment_repo::{AssignmentStore, SqliteAssignmentStore};
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use crate::repo::faculty_repo::{
    EntityKind, FacultyRepository, NewFaculty, RepoError, SqliteFacultyRepository,
};
use crate::service::reconcile::{refresh_faculty_name, reconcile_assignments, ReconcileError};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum ProfileError {
    NotFound { entity: EntityKind, id: String },
    EmailConflict(String),
    CourseAlreadyAssigned {
        course_id: CourseId,
        course_name: String,
        course_code: String,
    },
    CoursesNotFound { expected: usize, found: usize },
    NotAuthenticated,
    /// Caller tried to mutate a faculty record other than their own.
    Forbidden { caller: FacultyId, target: FacultyId },
    InvalidInput(FacultyValidationError),
    PhotoStore(PhotoStoreError),
    StorageFailure(RepoError),
}

impl ProfileError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EmailConflict(_) => "email_conflict",
            Self::CourseAlreadyAssigned { .. } => "course_already_assigned",
            Self::CoursesNotFound { .. } => "courses_not_found",
            Self::NotAuthenticated => "not_authenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidInput(_) => "invalid_input",
            Self::PhotoStore(_) => "photo_store_failure",
            Self::StorageFailure(_) => "storage_failure",
        }
    }

    /// User-facing error envelope.
    ///
    /// Infrastructure failures are reported without their internal detail.
    pub fn to_payload(&self) -> ErrorPayload {
        let message = match self {
            Self::StorageFailure(_) => "storage is temporarily unavailable".to_string(),
            Self::PhotoStore(_) => "photo could not be stored".to_string(),
            other => other.to_string(),
        };
        ErrorPayload {
            kind: self.kind(),
            message,
        }
    }
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::EmailConflict(email) => write!(f, "email already exists: {email}"),
            Self::CourseAlreadyAssigned {
                course_id,
                course_name,
                course_code,
            } => write!(
                f,
                "course '{course_name}' ({course_code}, id {course_id}) is already assigned to another faculty member"
            ),
            Self::CoursesNotFound { expected, found } => write!(
                f,
                "one or more courses not found: expected {expected} but found {found}"
            ),
            Self::NotAuthenticated => write!(f, "caller is not authenticated"),
            Self::Forbidden { caller, target } => write!(
                f,
                "faculty {caller} may not modify faculty {target}; only the caller's own profile can be updated"
            ),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::PhotoStore(err) => write!(f, "{err}"),
            Self::StorageFailure(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::PhotoStore(err) => Some(err),
            Self::StorageFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound {
                entity,
                id: id.to_string(),
            },
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::StorageFailure(other),
        }
    }
}

impl From<rusqlite::Error> for ProfileError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageFailure(value.into())
    }
}

impl From<FacultyValidationError> for ProfileError {
    fn from(value: FacultyValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<ReconcileError> for ProfileError {
    fn from(value: ReconcileError) -> Self {
        match value {
            ReconcileError::FacultyNotFound(id) => Self::NotFound {
                entity: EntityKind::Faculty,
                id: id.to_string(),
            },
            ReconcileError::CoursesNotFound { expected, found } => {
                Self::CoursesNotFound { expected, found }
            }
            ReconcileError::CourseAlreadyAssigned {
                course_id,
                course_name,
                course_code,
            } => Self::CourseAlreadyAssigned {
                course_id,
                course_name,
                course_code,
            },
            ReconcileError::Storage(err) => Self::from(err),
        }
    }
}

impl From<IdentityError> for ProfileError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::NotAuthenticated => Self::NotAuthenticated,
            IdentityError::NotRegistered(email) => Self::NotFound {
                entity: EntityKind::Faculty,
                id: email,
            },
            IdentityError::Repo(err) => Self::from(err),
        }
    }
}

/// Structured error returned to request-handling code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: &'static str,
    pub message: String,
}

/// Registration request for a new faculty member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FacultyRegistration {
    pub employee_id: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub title: String,
    pub photograph_path: Option<String>,
    pub department_id: DepartmentId,
    pub course_ids: Option<Vec<CourseId>>,
}

/// Self-service profile update request.
///
/// `course_ids: None` leaves assignments untouched; `Some(vec![])` releases
/// every course the caller holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    /// Id the client believes it is editing; must match the caller if set.
    pub id: Option<FacultyId>,
    /// Replaces the stored employee id only when present.
    pub employee_id: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub title: String,
    /// Replaces the stored photo path only when present and non-blank.
    pub photograph_path: Option<String>,
    pub department_id: DepartmentId,
    pub course_ids: Option<Vec<CourseId>>,
}

/// Course entry of a faculty read view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub credits: i64,
}

impl From<Course> for CourseSummary {
    fn from(value: Course) -> Self {
        Self {
            id: value.id,
            code: value.code,
            name: value.name,
            description: value.description,
            credits: value.credits,
        }
    }
}

/// Faculty read view: record + department + taught courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacultyView {
    pub id: FacultyId,
    pub employee_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: String,
    pub photograph_path: Option<String>,
    pub department: Department,
    /// Ordered by course id.
    pub courses: Vec<CourseSummary>,
}

/// Profile orchestrator over one connection and a photo store.
pub struct ProfileService<'conn, P: PhotoStore> {
    conn: &'conn mut Connection,
    photos: P,
}

impl<'conn, P: PhotoStore> ProfileService<'conn, P> {
    pub fn new(conn: &'conn mut Connection, photos: P) -> Self {
        Self { conn, photos }
    }

    /// Registers a faculty member, optionally with an initial course set.
    ///
    /// Initial courses go through the same reconciliation as updates, so a
    /// course held by someone else is rejected and the whole registration
    /// rolls back.
    pub fn register_faculty(
        &mut self,
        registration: &FacultyRegistration,
    ) -> Result<FacultyView, ProfileError> {
        let started_at = Instant::now();
        validate_first_name(&registration.first_name)?;
        validate_email(&registration.email)?;

        let result = self.register_in_tx(registration);
        match &result {
            Ok(view) => info!(
                "event=faculty_register module=profile status=ok faculty_id={} courses={} duration_ms={}",
                view.id,
                view.courses.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_profile_failure("faculty_register", None, err, started_at),
        }
        result
    }

    /// Returns the caller's own profile.
    pub fn current_profile<I>(&self, identity: &I) -> Result<FacultyView, ProfileError>
    where
        I: IdentityResolver + ?Sized,
    {
        let caller = identity.current_faculty_id()?;
        let faculty = SqliteFacultyRepository::new(self.conn)
            .get_faculty(caller)?
            .ok_or_else(|| faculty_not_found(caller))?;
        load_view(self.conn, faculty)
    }

    /// Updates the caller's own profile and, when requested, course set.
    ///
    /// # Errors
    /// - `NotAuthenticated` / `Forbidden` before anything is read.
    /// - `InvalidInput`, `EmailConflict`, `NotFound` for bad fields.
    /// - Reconciliation errors verbatim; the whole update is rolled back.
    pub fn update_current_profile<I>(
        &mut self,
        identity: &I,
        update: &ProfileUpdate,
    ) -> Result<FacultyView, ProfileError>
    where
        I: IdentityResolver + ?Sized,
    {
        let started_at = Instant::now();
        let caller = identity.current_faculty_id()?;
        if let Some(target) = update.id {
            if target != caller {
                warn!(
                    "event=profile_update module=profile status=rejected faculty_id={} target_id={} error_code=forbidden",
                    caller, target
                );
                return Err(ProfileError::Forbidden { caller, target });
            }
        }
        validate_update(update)?;

        let result = self.update_in_tx(caller, update);
        let (view, replaced_photo) = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log_profile_failure("profile_update", Some(caller), &err, started_at);
                return Err(err);
            }
        };
        info!(
            "event=profile_update module=profile status=ok faculty_id={} courses_requested={} courses={} photo_replaced={} duration_ms={}",
            caller,
            update.course_ids.is_some(),
            view.courses.len(),
            replaced_photo.is_some(),
            started_at.elapsed().as_millis()
        );

        if let Some(old_path) = replaced_photo {
            self.discard_photo(&old_path);
        }
        Ok(view)
    }

    /// Stores a new photo for the caller and points the profile at it.
    ///
    /// The file name starts with the caller's employee id when one is set and
    /// is unique per upload. The previous file is deleted only after the new
    /// path is committed; if the record update fails, the new file is removed
    /// and the old one is left untouched.
    pub fn upload_current_photo<I>(
        &mut self,
        identity: &I,
        bytes: &[u8],
        original_filename: Option<&str>,
    ) -> Result<FacultyView, ProfileError>
    where
        I: IdentityResolver + ?Sized,
    {
        let started_at = Instant::now();
        let caller = identity.current_faculty_id()?;
        let faculty = SqliteFacultyRepository::new(self.conn)
            .get_faculty(caller)?
            .ok_or_else(|| faculty_not_found(caller))?;

        let file_name = photo_file_name(faculty.employee_id.as_deref(), original_filename);
        let stored_path = self
            .photos
            .store(bytes, &file_name)
            .map_err(ProfileError::PhotoStore)?;

        let (view, previous_path) = match self.set_photo_in_tx(caller, &stored_path) {
            Ok(outcome) => outcome,
            Err(err) => {
                log_profile_failure("photo_upload", Some(caller), &err, started_at);
                if faculty.photograph_path.as_deref() != Some(stored_path.as_str()) {
                    self.discard_photo(&stored_path);
                }
                return Err(err);
            }
        };
        info!(
            "event=photo_upload module=profile status=ok faculty_id={} bytes={} duration_ms={}",
            caller,
            bytes.len(),
            started_at.elapsed().as_millis()
        );

        if let Some(old_path) = previous_path.filter(|old| old != &stored_path) {
            self.discard_photo(&old_path);
        }
        Ok(view)
    }

    fn register_in_tx(
        &mut self,
        registration: &FacultyRegistration,
    ) -> Result<FacultyView, ProfileError> {
        let tx = self.begin()?;
        let faculty_repo = SqliteFacultyRepository::new(&tx);
        let catalog = SqliteCatalogRepository::new(&tx);

        let email = registration.email.trim();
        if faculty_repo.email_in_use(email, None)? {
            return Err(ProfileError::EmailConflict(email.to_string()));
        }
        let department = catalog
            .get_department(registration.department_id)?
            .ok_or_else(|| department_not_found(registration.department_id))?;

        let faculty = faculty_repo.create_faculty(&NewFaculty {
            employee_id: normalize_optional(registration.employee_id.as_deref()),
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
            email: email.to_string(),
            title: registration.title.clone(),
            photograph_path: normalize_optional(registration.photograph_path.as_deref()),
            department_id: department.id,
        })?;

        let store = SqliteAssignmentStore::new(&tx);
        if let Some(course_ids) = registration.course_ids.as_deref() {
            reconcile_assignments(&store, &catalog, &faculty, course_ids)?;
        }

        let view = assemble_view(&store, faculty, department)?;
        tx.commit()?;
        Ok(view)
    }

    fn update_in_tx(
        &mut self,
        caller: FacultyId,
        update: &ProfileUpdate,
    ) -> Result<(FacultyView, Option<String>), ProfileError> {
        let tx = self.begin()?;
        let faculty_repo = SqliteFacultyRepository::new(&tx);
        let catalog = SqliteCatalogRepository::new(&tx);
        let store = SqliteAssignmentStore::new(&tx);

        let mut faculty = faculty_repo
            .get_faculty(caller)?
            .ok_or_else(|| faculty_not_found(caller))?;

        let email = update.email.trim();
        if !same_email(&faculty.email, email) {
            if faculty_repo.email_in_use(email, Some(faculty.id))? {
                return Err(ProfileError::EmailConflict(email.to_string()));
            }
            faculty.email = email.to_string();
        }

        let department = catalog
            .get_department(update.department_id)?
            .ok_or_else(|| department_not_found(update.department_id))?;

        let previous_name = faculty.display_name();
        if let Some(employee_id) = update.employee_id.as_deref() {
            faculty.employee_id = normalize_optional(Some(employee_id));
        }
        faculty.first_name = update.first_name.trim().to_string();
        faculty.last_name = update.last_name.trim().to_string();
        faculty.title = update.title.trim().to_string();
        faculty.department_id = department.id;

        let mut replaced_photo = None;
        if let Some(new_path) = normalize_optional(update.photograph_path.as_deref()) {
            if faculty.photograph_path.as_deref() != Some(new_path.as_str()) {
                replaced_photo = faculty.photograph_path.replace(new_path);
            }
        }

        faculty_repo.update_faculty(&faculty)?;

        match update.course_ids.as_deref() {
            Some(course_ids) => {
                reconcile_assignments(&store, &catalog, &faculty, course_ids)?;
            }
            None if faculty.display_name() != previous_name => {
                let refreshed = refresh_faculty_name(&store, &faculty)?;
                debug!(
                    "event=faculty_name_refresh module=profile status=ok faculty_id={} courses={}",
                    faculty.id, refreshed
                );
            }
            None => {}
        }

        let view = assemble_view(&store, faculty, department)?;
        tx.commit()?;
        Ok((view, replaced_photo))
    }

    fn set_photo_in_tx(
        &mut self,
        caller: FacultyId,
        stored_path: &str,
    ) -> Result<(FacultyView, Option<String>), ProfileError> {
        let tx = self.begin()?;
        let faculty_repo = SqliteFacultyRepository::new(&tx);

        let mut faculty = faculty_repo
            .get_faculty(caller)?
            .ok_or_else(|| faculty_not_found(caller))?;
        let previous_path = faculty.photograph_path.replace(stored_path.to_string());
        faculty_repo.update_faculty(&faculty)?;

        let department = SqliteCatalogRepository::new(&tx)
            .get_department(faculty.department_id)?
            .ok_or_else(|| department_not_found(faculty.department_id))?;
        let view = assemble_view(&SqliteAssignmentStore::new(&tx), faculty, department)?;
        tx.commit()?;
        Ok((view, previous_path))
    }

    fn begin(&mut self) -> Result<Transaction<'_>, ProfileError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    fn discard_photo(&self, path: &str) {
        match self.photos.delete(path) {
            Ok(()) => debug!("event=photo_cleanup module=profile status=ok"),
            Err(err) => warn!(
                "event=photo_cleanup module=profile status=error error_code=photo_delete_failed error={}",
                err
            ),
        }
    }
}

fn validate_update(update: &ProfileUpdate) -> Result<(), FacultyValidationError> {
    validate_first_name(&update.first_name)?;
    validate_email(&update.email)?;
    if update.title.trim().is_empty() {
        return Err(FacultyValidationError::BlankTitle);
    }
    Ok(())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn faculty_not_found(id: FacultyId) -> ProfileError {
    ProfileError::NotFound {
        entity: EntityKind::Faculty,
        id: id.to_string(),
    }
}

fn department_not_found(id: DepartmentId) -> ProfileError {
    ProfileError::NotFound {
        entity: EntityKind::Department,
        id: id.to_string(),
    }
}

fn load_view(conn: &Connection, faculty: Faculty) -> Result<FacultyView, ProfileError> {
    let department = SqliteCatalogRepository::new(conn)
        .get_department(faculty.department_id)?
        .ok_or_else(|| department_not_found(faculty.department_id))?;
    assemble_view(&SqliteAssignmentStore::new(conn), faculty, department)
}

fn assemble_view<A>(
    store: &A,
    faculty: Faculty,
    department: Department,
) -> Result<FacultyView, ProfileError>
where
    A: AssignmentStore + ?Sized,
{
    let courses = store
        .courses_for_faculty(faculty.id)?
        .into_iter()
        .map(CourseSummary::from)
        .collect();

    Ok(FacultyView {
        id: faculty.id,
        employee_id: faculty.employee_id,
        first_name: faculty.first_name,
        last_name: faculty.last_name,
        email: faculty.email,
        title: faculty.title,
        photograph_path: faculty.photograph_path,
        department,
        courses,
    })
}

fn log_profile_failure(
    event: &str,
    faculty_id: Option<FacultyId>,
    err: &ProfileError,
    started_at: Instant,
) {
    let faculty_id = faculty_id.map_or_else(|| "none".to_string(), |id| id.to_string());
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        ProfileError::StorageFailure(_) | ProfileError::PhotoStore(_) => error!(
            "event={} module=profile status=error faculty_id={} duration_ms={} error_code={} error={}",
            event,
            faculty_id,
            duration_ms,
            err.kind(),
            err
        ),
        _ => warn!(
            "event={} module=profile status=rejected faculty_id={} duration_ms={} error_code={}",
            event,
            faculty_id,
            duration_ms,
            err.kind()
        ),
    }
}
