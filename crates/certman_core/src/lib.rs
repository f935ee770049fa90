//! Core of the certificate manager.
//!
//! Certificates are kept twice: as a directory with a credentials document
//! in the file store, and as a row in the SQLite `certificates` table used
//! for lookups and weekly reports. This crate keeps the two in lockstep and
//! exposes the command API the shell renders.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CertmanConfig, ConfigError};
pub use logging::{init_logging, logging_status, LoggingError};
pub use model::certificate::{Certificate, CertificateDraft, CertificateValidationError};
pub use model::questions::{decode_questions, encode_questions};
pub use report::weekly::{
    current_week, ReportEngine, ReportRow, WeekWindow, WeeklyReport, REPORT_HEADER,
};
pub use repo::certificate_repo::{
    CertificateId, CertificateRepository, CertificateRows, DateRangeQuery, RepoError, RepoResult,
    Resolution, SqliteCertificateRepository,
};
pub use repo::file_store::{FileStore, FileStoreError, FileStoreResult, CREDENTIALS_FILE_NAME};
pub use service::certificate_service::{
    AddSession, CertificateService, Command, ServiceError, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
