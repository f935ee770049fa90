//! Certificate command service.
//!
//! # Responsibility
//! - Run the add/delete commands against both stores.
//! - Keep the file store and the relational store agreeing on which
//!   emails exist, and report loudly when they stop agreeing.
//!
//! # Invariants
//! - Add: validate, reject duplicates found in either store, then write the
//!   file store first; the relational insert only runs after it succeeds.
//! - Delete: resolve through the relational store, delete the row first,
//!   then the record directory.
//! - A failure after the first store mutated is `InconsistentState`, never
//!   a plain storage error.

use crate::clock::Clock;
use crate::config::CertmanConfig;
use crate::model::certificate::{Certificate, CertificateDraft, CertificateValidationError};
use crate::repo::certificate_repo::{CertificateRepository, RepoError, Resolution};
use crate::repo::file_store::{FileStore, FileStoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Command that was running when the stores diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Delete,
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors from certificate commands.
#[derive(Debug)]
pub enum ServiceError {
    /// Input is not a bound record.
    Validation(CertificateValidationError),
    /// Email already present; no store was written.
    Duplicate {
        email: String,
        in_files: bool,
        in_db: bool,
    },
    /// Identifier resolves to nothing; no store was touched.
    NotFound(String),
    Files(FileStoreError),
    Repo(RepoError),
    /// One store was mutated and the other failed; needs manual repair.
    ///
    /// Both the add and delete orderings leave a record directory with no
    /// matching database row.
    InconsistentState {
        email: String,
        command: Command,
        detail: String,
    },
}

impl ServiceError {
    /// Whether the session should simply prompt again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Duplicate { .. } | Self::NotFound(_)
        )
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::Duplicate {
                email,
                in_files,
                in_db,
            } => {
                let location = match (in_files, in_db) {
                    (true, true) => "file system and database",
                    (true, false) => "file system",
                    _ => "database",
                };
                write!(f, "certificate `{email}` already exists in {location}")
            }
            Self::NotFound(identifier) => {
                write!(f, "no certificate found for `{identifier}`")
            }
            Self::Files(err) => write!(f, "file store failure: {err}"),
            Self::Repo(err) => write!(f, "database failure: {err}"),
            Self::InconsistentState {
                email,
                command,
                detail,
            } => write!(
                f,
                "stores disagree after {command} of `{email}`: record directory exists \
                 without a database row: {detail}"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Files(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CertificateValidationError> for ServiceError {
    fn from(value: CertificateValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FileStoreError> for ServiceError {
    fn from(value: FileStoreError) -> Self {
        Self::Files(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Add/delete orchestration over the file store and a relational repository.
pub struct CertificateService<R: CertificateRepository, C: Clock> {
    files: FileStore,
    repo: R,
    clock: C,
    default_password: String,
}

impl<R: CertificateRepository, C: Clock> CertificateService<R, C> {
    pub fn new(files: FileStore, repo: R, clock: C, config: &CertmanConfig) -> Self {
        Self {
            files,
            repo,
            clock,
            default_password: config.default_password.clone(),
        }
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Applies the configured defaults to `draft`.
    pub fn prepare(&self, draft: CertificateDraft) -> Certificate {
        draft.build(&self.default_password, self.clock.today())
    }

    /// Adds one certificate to both stores.
    ///
    /// # Errors
    /// - `Validation` when the record is not bound.
    /// - `Duplicate` when either store already holds the email.
    /// - `Files` when the file store write fails (nothing was written).
    /// - `InconsistentState` when the file store write succeeded but the
    ///   relational insert failed.
    pub fn add_certificate(&self, draft: CertificateDraft) -> ServiceResult<Certificate> {
        let certificate = self.prepare(draft);
        certificate.validate()?;

        let in_files = self.files.exists(&certificate);
        let in_db = self.repo.exists(&certificate)?;
        if in_files || in_db {
            warn!(
                "event=certificate_add module=service status=duplicate in_files={in_files} in_db={in_db}"
            );
            return Err(ServiceError::Duplicate {
                email: certificate.email,
                in_files,
                in_db,
            });
        }

        self.files.save(&certificate)?;

        if let Err(err) = self.repo.save(&certificate) {
            return Err(divergence(&certificate.email, Command::Add, &err));
        }

        info!("event=certificate_add module=service status=ok");
        Ok(certificate)
    }

    /// Resolves `identifier` (row id first, then email) without mutating.
    pub fn find(&self, identifier: &str) -> ServiceResult<Resolution> {
        Ok(self.repo.resolve_identifier(identifier)?)
    }

    /// Deletes the certificate `identifier` resolves to from both stores.
    ///
    /// # Errors
    /// - `NotFound` when nothing resolves, or the row vanished before the
    ///   delete ran; neither store is mutated.
    /// - `InconsistentState` when the row was deleted but the record
    ///   directory could not be removed.
    pub fn delete_certificate(&self, identifier: &str) -> ServiceResult<Certificate> {
        let Some(certificate) = self.find(identifier)?.into_certificate() else {
            return Err(ServiceError::NotFound(identifier.to_string()));
        };

        if self.repo.delete_by_email(&certificate.email)? == 0 {
            return Err(ServiceError::NotFound(identifier.to_string()));
        }

        match self.files.delete(&certificate.email) {
            Ok(()) => {}
            // Directory was already gone: both stores now agree on absence.
            Err(FileStoreError::NotFound(path)) => warn!(
                "event=certificate_delete module=service status=missing_directory path={}",
                path.display()
            ),
            Err(err) => return Err(divergence(&certificate.email, Command::Delete, &err)),
        }

        info!("event=certificate_delete module=service status=ok");
        Ok(certificate)
    }

    /// Starts an interactive add session that counts successful adds.
    pub fn session(&self) -> AddSession<'_, R, C> {
        AddSession {
            service: self,
            added: 0,
        }
    }
}

/// Counts certificates added over one `addcert` session.
pub struct AddSession<'svc, R: CertificateRepository, C: Clock> {
    service: &'svc CertificateService<R, C>,
    added: usize,
}

impl<R: CertificateRepository, C: Clock> AddSession<'_, R, C> {
    /// Adds one candidate; only successes are counted.
    pub fn submit(&mut self, draft: CertificateDraft) -> ServiceResult<Certificate> {
        let certificate = self.service.add_certificate(draft)?;
        self.added += 1;
        Ok(certificate)
    }

    pub fn added(&self) -> usize {
        self.added
    }
}

fn divergence(email: &str, command: Command, cause: &dyn Error) -> ServiceError {
    error!("event=store_divergence module=service status=error command={command} error={cause}");
    ServiceError::InconsistentState {
        email: email.to_string(),
        command,
        detail: cause.to_string(),
    }
}
