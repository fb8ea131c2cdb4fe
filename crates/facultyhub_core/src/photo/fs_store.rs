//! Filesystem-backed photo store.

use super::{PhotoResult, PhotoStore, PhotoStoreError};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

static UNSAFE_NAME_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid file name regex"));

const MAX_BASE_NAME_CHARS: usize = 100;

/// Stores photos as flat files inside one upload directory.
#[derive(Debug, Clone)]
pub struct FsPhotoStore {
    root: PathBuf,
}

impl FsPhotoStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owns(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.starts_with('.'))
    }
}

impl PhotoStore for FsPhotoStore {
    fn store(&self, bytes: &[u8], desired_base_name: &str) -> PhotoResult<String> {
        if bytes.is_empty() {
            return Err(PhotoStoreError::EmptyPayload);
        }

        let mut name = sanitize_name(desired_base_name);
        if name.is_empty() {
            name = Uuid::new_v4().to_string();
        }

        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(&name);
        std::fs::write(&path, bytes)?;

        info!(
            "event=photo_store module=photo status=ok bytes={}",
            bytes.len()
        );
        Ok(path.to_string_lossy().into_owned())
    }

    fn delete(&self, path: &str) -> PhotoResult<()> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let target = Path::new(trimmed);
        if !self.owns(target) {
            return Err(PhotoStoreError::OutsideRoot(trimmed.to_string()));
        }

        match std::fs::remove_file(target) {
            Ok(()) => {
                info!("event=photo_delete module=photo status=ok");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("event=photo_delete module=photo status=ok missing=true");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Builds the file name for an upload: `<base>.<uuid><.ext>`.
///
/// `base` is the preferred prefix (typically the employee id) and is dropped
/// when absent or when it sanitizes to nothing. Every call yields a fresh
/// name, so a new upload never overwrites the photo the record points at.
/// The extension comes from `original_filename`.
pub fn photo_file_name(base: Option<&str>, original_filename: Option<&str>) -> String {
    let unique = Uuid::new_v4().to_string();
    let stem = match base.map(sanitize_name).filter(|value| !value.is_empty()) {
        Some(base) => format!("{base}.{unique}"),
        None => unique,
    };
    let extension = original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(sanitize_name)
        .filter(|ext| !ext.is_empty());

    match extension {
        Some(ext) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => stem,
    }
}

fn sanitize_name(value: &str) -> String {
    let replaced = UNSAFE_NAME_CHARS_RE.replace_all(value.trim(), "_");
    replaced
        .trim_start_matches('.')
        .chars()
        .take(MAX_BASE_NAME_CHARS)
        .collect()
}
