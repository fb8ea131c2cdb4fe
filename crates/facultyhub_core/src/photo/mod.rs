//! Profile photograph storage.
//!
//! # Responsibility
//! - Define the store/delete contract the profile orchestrator depends on.
//! - Provide a filesystem implementation rooted in one upload directory.
//!
//! # Invariants
//! - `delete` is idempotent: deleting a missing path succeeds.
//! - Stored paths never escape the store root.

mod fs_store;

pub use fs_store::{photo_file_name, FsPhotoStore};

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PhotoResult<T> = Result<T, PhotoStoreError>;

#[derive(Debug)]
pub enum PhotoStoreError {
    Io(std::io::Error),
    /// Upload body was empty.
    EmptyPayload,
    /// Path does not belong to this store.
    OutsideRoot(String),
}

impl Display for PhotoStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::EmptyPayload => write!(f, "photo payload is empty"),
            Self::OutsideRoot(path) => write!(f, "photo path is outside the store: `{path}`"),
        }
    }
}

impl Error for PhotoStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PhotoStoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Persistence for profile photographs.
pub trait PhotoStore {
    /// Writes `bytes` under `desired_base_name` and returns the stored path.
    ///
    /// Existing files with the same name are replaced.
    fn store(&self, bytes: &[u8], desired_base_name: &str) -> PhotoResult<String>;
    /// Removes a previously stored photo. Missing files are not an error.
    fn delete(&self, path: &str) -> PhotoResult<()>;
}

impl<T: PhotoStore + ?Sized> PhotoStore for &T {
    fn store(&self, bytes: &[u8], desired_base_name: &str) -> PhotoResult<String> {
        (**self).store(bytes, desired_base_name)
    }

    fn delete(&self, path: &str) -> PhotoResult<()> {
        (**self).delete(path)
    }
}
