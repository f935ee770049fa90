//! Directory-per-record certificate store.
//!
//! # Responsibility
//! - Represent each certificate as `<root>/<email>/credentials.yaml`.
//! - Read the credentials document back into a `Certificate`.
//!
//! # Invariants
//! - A record directory is published by renaming a fully written staging
//!   directory, so `<root>/<email>` never holds a half-written document.
//! - Existence is decided by the directory alone, not the document.
//! - `save` never overwrites; callers check `exists` first.

use crate::model::certificate::Certificate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// File name of the credentials document inside a record directory.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.yaml";

pub type FileStoreResult<T> = Result<T, FileStoreError>;

/// File store error for directory and document operations.
#[derive(Debug)]
pub enum FileStoreError {
    /// A record directory already exists at this path.
    AlreadyExists(PathBuf),
    /// No record directory exists at this path.
    NotFound(PathBuf),
    /// Email cannot be used as a single directory name.
    UnsafeName(String),
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// The credentials document could not be written or parsed.
    Document {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl Display for FileStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists(path) => {
                write!(f, "certificate directory already exists: {}", path.display())
            }
            Self::NotFound(path) => {
                write!(f, "certificate directory not found: {}", path.display())
            }
            Self::UnsafeName(email) => {
                write!(f, "`{email}` cannot be used as a certificate directory name")
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Document { path, source } => {
                write!(f, "invalid credentials document {}: {source}", path.display())
            }
        }
    }
}

impl Error for FileStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Document { source, .. } => Some(source),
            Self::AlreadyExists(_) | Self::NotFound(_) | Self::UnsafeName(_) => None,
        }
    }
}

/// On-disk shape: the five attributes under one `certificate` key.
#[derive(Debug, Serialize, Deserialize)]
struct CredentialsDocument {
    certificate: Certificate,
}

/// Filesystem-backed certificate store rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. Trailing separators are dropped.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize_root(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory (and parents) when missing.
    pub fn ensure_root(&self) -> FileStoreResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| io_error(&self.root, source))
    }

    /// Directory holding the record for `email`.
    pub fn record_dir(&self, email: &str) -> PathBuf {
        self.root.join(email)
    }

    /// Path of the credentials document for `email`.
    pub fn document_path(&self, email: &str) -> PathBuf {
        self.record_dir(email).join(CREDENTIALS_FILE_NAME)
    }

    /// Directory-existence check by the record email.
    pub fn exists(&self, certificate: &Certificate) -> bool {
        self.checked_record_dir(&certificate.email)
            .map(|dir| dir.exists())
            .unwrap_or(false)
    }

    fn checked_record_dir(&self, email: &str) -> FileStoreResult<PathBuf> {
        let single_component = matches!(
            Path::new(email).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(name)] if *name == OsStr::new(email)
        );
        if !single_component {
            return Err(FileStoreError::UnsafeName(email.to_string()));
        }
        Ok(self.record_dir(email))
    }

    /// Writes the record directory and its credentials document.
    ///
    /// # Errors
    /// - `AlreadyExists` when the record directory is present.
    /// - `Io`/`Document` when staging, writing or publishing fails; the
    ///   staging directory is removed and the real path stays untouched.
    pub fn save(&self, certificate: &Certificate) -> FileStoreResult<PathBuf> {
        let target = self.checked_record_dir(&certificate.email)?;
        if target.exists() {
            return Err(FileStoreError::AlreadyExists(target));
        }

        // Fixed-length name: an email near the file-name limit must still stage.
        let staging = self.root.join(format!(".staging-{}", Uuid::new_v4()));
        fs::create_dir(&staging).map_err(|source| io_error(&staging, source))?;

        let published = write_document(&staging, certificate).and_then(|()| {
            if target.exists() {
                return Err(FileStoreError::AlreadyExists(target.clone()));
            }
            fs::rename(&staging, &target).map_err(|source| io_error(&target, source))
        });

        if let Err(err) = published {
            if let Err(cleanup_err) = fs::remove_dir_all(&staging) {
                warn!(
                    "event=file_store_cleanup module=file_store status=error path={} error={}",
                    staging.display(),
                    cleanup_err
                );
            }
            return Err(err);
        }

        debug!(
            "event=file_store_save module=file_store status=ok path={}",
            target.display()
        );
        Ok(target)
    }

    /// Reads the credentials document for `email`.
    ///
    /// Returns `Ok(None)` when no record directory exists.
    pub fn load(&self, email: &str) -> FileStoreResult<Option<Certificate>> {
        let dir = self.checked_record_dir(email)?;
        if !dir.exists() {
            return Ok(None);
        }

        let path = dir.join(CREDENTIALS_FILE_NAME);
        let text = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        let document: CredentialsDocument =
            serde_yaml::from_str(&text).map_err(|source| FileStoreError::Document {
                path: path.clone(),
                source,
            })?;
        Ok(Some(document.certificate))
    }

    /// Removes the record directory for `email` recursively.
    ///
    /// # Errors
    /// - `NotFound` when no record directory exists.
    pub fn delete(&self, email: &str) -> FileStoreResult<()> {
        let target = self.checked_record_dir(email)?;
        if !target.exists() {
            return Err(FileStoreError::NotFound(target));
        }

        fs::remove_dir_all(&target).map_err(|source| io_error(&target, source))?;
        debug!(
            "event=file_store_delete module=file_store status=ok path={}",
            target.display()
        );
        Ok(())
    }
}

fn write_document(dir: &Path, certificate: &Certificate) -> FileStoreResult<()> {
    let path = dir.join(CREDENTIALS_FILE_NAME);
    let document = CredentialsDocument {
        certificate: certificate.clone(),
    };
    let text = serde_yaml::to_string(&document).map_err(|source| FileStoreError::Document {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, text).map_err(|source| io_error(&path, source))
}

fn io_error(path: &Path, source: io::Error) -> FileStoreError {
    FileStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn normalize_root(root: &Path) -> PathBuf {
    // `components()` drops trailing separators and redundant `.` segments.
    let normalized: PathBuf = root.components().collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}
