//! Certificate repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist, look up and delete rows of the `certificates` table.
//! - Translate between `Certificate` and its row shape, including the
//!   numbered-answers text encoding.
//! - Provide a forward-only cursor over a date range for reporting.
//!
//! # Invariants
//! - Every statement binds record fields as parameters; no field text is
//!   ever spliced into SQL.
//! - `when_added` is stored as ISO `YYYY-MM-DD` text so range comparisons
//!   are plain text comparisons.
//! - Lookups report absence as `Ok(None)`, never as an error.

use crate::db::DbError;
use crate::model::certificate::Certificate;
use crate::model::questions::{decode_questions, encode_questions};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Rows, Statement, ToSql};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter::FusedIterator;

const CERTIFICATE_SELECT_SQL: &str = "SELECT
    email,
    password,
    enrollment_id,
    questions,
    when_added
FROM certificates";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Synthetic auto-increment row identifier.
pub type CertificateId = i64;

/// Relational store error for persistence and row decoding.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted certificate data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
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

/// Outcome of resolving a user-supplied delete/lookup identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Identifier parsed as an integer and matched a row id.
    ById(CertificateId, Certificate),
    /// Identifier matched a row by email.
    ByEmail(Certificate),
    NotFound,
}

impl Resolution {
    pub fn certificate(&self) -> Option<&Certificate> {
        match self {
            Self::ById(_, certificate) | Self::ByEmail(certificate) => Some(certificate),
            Self::NotFound => None,
        }
    }

    pub fn into_certificate(self) -> Option<Certificate> {
        match self {
            Self::ById(_, certificate) | Self::ByEmail(certificate) => Some(certificate),
            Self::NotFound => None,
        }
    }
}

/// Repository interface for the relational certificate store.
pub trait CertificateRepository {
    /// Inserts one row and returns its row id.
    fn save(&self, certificate: &Certificate) -> RepoResult<CertificateId>;
    fn get_by_email(&self, email: &str) -> RepoResult<Option<Certificate>>;
    fn get_by_id(&self, id: CertificateId) -> RepoResult<Option<Certificate>>;
    /// Removes every row carrying `email`; returns the number of rows removed.
    fn delete_by_email(&self, email: &str) -> RepoResult<usize>;
    /// Existence check keyed by the record email.
    fn exists(&self, certificate: &Certificate) -> RepoResult<bool>;
    /// Records with `start <= date_obtained <= end`, ordered by date then
    /// insertion order.
    fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Certificate>>;

    /// Resolves `identifier` as a row id first, then as an email.
    ///
    /// Identifiers that do not parse as integers skip the id lookup. An
    /// integer that matches no row falls back to the email lookup.
    fn resolve_identifier(&self, identifier: &str) -> RepoResult<Resolution> {
        if identifier.is_empty() {
            return Ok(Resolution::NotFound);
        }

        if let Ok(id) = identifier.parse::<CertificateId>() {
            if let Some(certificate) = self.get_by_id(id)? {
                return Ok(Resolution::ById(id, certificate));
            }
        }

        Ok(match self.get_by_email(identifier)? {
            Some(certificate) => Resolution::ByEmail(certificate),
            None => Resolution::NotFound,
        })
    }

    /// Deletes the record `identifier` resolves to, by its email.
    ///
    /// Returns `Ok(None)` when nothing resolves; that is "nothing deleted",
    /// not a failure.
    fn delete(&self, identifier: &str) -> RepoResult<Option<Certificate>> {
        let Some(certificate) = self.resolve_identifier(identifier)?.into_certificate() else {
            return Ok(None);
        };

        if self.delete_by_email(&certificate.email)? == 0 {
            return Ok(None);
        }
        Ok(Some(certificate))
    }
}

/// SQLite-backed certificate repository.
pub struct SqliteCertificateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCertificateRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - Returns `DbError::SchemaMissing` when `certificates` does not exist,
    ///   i.e. the connection was not opened through [`crate::db::open_db`].
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'certificates'
            );",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::SchemaMissing("certificates").into());
        }
        Ok(Self { conn })
    }

    /// Prepares the reporting cursor over `when_added`.
    pub fn date_range(&self) -> RepoResult<DateRangeQuery<'conn>> {
        let stmt = self.conn.prepare(&format!(
            "{CERTIFICATE_SELECT_SQL}
             WHERE when_added >= ?1 AND when_added <= ?2
             ORDER BY when_added ASC, id ASC;"
        ))?;
        Ok(DateRangeQuery { stmt })
    }

    fn query_one(&self, filter: &str, value: &dyn ToSql) -> RepoResult<Option<Certificate>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CERTIFICATE_SELECT_SQL} WHERE {filter} ORDER BY id ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_certificate_row(row)?)),
            None => Ok(None),
        }
    }
}

impl CertificateRepository for SqliteCertificateRepository<'_> {
    fn save(&self, certificate: &Certificate) -> RepoResult<CertificateId> {
        self.conn.execute(
            "INSERT INTO certificates (
                when_added,
                email,
                password,
                enrollment_id,
                questions
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                date_to_db(certificate.date_obtained),
                certificate.email.as_str(),
                certificate.password.as_str(),
                certificate.enrollment_id.as_str(),
                encode_questions(&certificate.questions),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("event=certificate_insert module=repo status=ok id={id}");
        Ok(id)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<Certificate>> {
        if email.is_empty() {
            return Ok(None);
        }
        self.query_one("email = ?1", &email)
    }

    fn get_by_id(&self, id: CertificateId) -> RepoResult<Option<Certificate>> {
        self.query_one("id = ?1", &id)
    }

    fn delete_by_email(&self, email: &str) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM certificates WHERE email = ?1;", [email])?;
        debug!("event=certificate_delete module=repo status=ok rows={changed}");
        Ok(changed)
    }

    fn exists(&self, certificate: &Certificate) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM certificates WHERE email = ?1 LIMIT 1;",
                [certificate.email.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Drains one [`DateRangeQuery`] scan into memory.
    fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Certificate>> {
        let mut query = self.date_range()?;
        let rows = query.rows(start, end)?;
        rows.collect()
    }
}

/// Prepared date-range scan. Each [`DateRangeQuery::rows`] call re-executes.
pub struct DateRangeQuery<'conn> {
    stmt: Statement<'conn>,
}

impl DateRangeQuery<'_> {
    /// Executes the scan for `start..=end` (dates compared by calendar day).
    pub fn rows(&mut self, start: NaiveDate, end: NaiveDate) -> RepoResult<CertificateRows<'_>> {
        let rows = self.stmt.query(params![date_to_db(start), date_to_db(end)])?;
        Ok(CertificateRows {
            rows,
            finished: false,
        })
    }
}

/// Forward-only, single-pass cursor over decoded certificate rows.
///
/// Ordered ascending by `when_added`. Once exhausted, or after the first
/// error, it yields nothing further.
pub struct CertificateRows<'stmt> {
    rows: Rows<'stmt>,
    finished: bool,
}

impl Iterator for CertificateRows<'_> {
    type Item = RepoResult<Certificate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.rows.next() {
            Ok(Some(row)) => {
                let decoded = parse_certificate_row(row);
                if decoded.is_err() {
                    self.finished = true;
                }
                Some(decoded)
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err.into()))
            }
        }
    }
}

impl FusedIterator for CertificateRows<'_> {}

fn parse_certificate_row(row: &Row<'_>) -> RepoResult<Certificate> {
    let when_added: String = row.get("when_added")?;
    let date_obtained = NaiveDate::parse_from_str(&when_added, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{when_added}` in certificates.when_added"
        ))
    })?;
    let questions: String = row.get("questions")?;

    Ok(Certificate {
        email: row.get("email")?,
        password: row.get("password")?,
        questions: decode_questions(&questions),
        enrollment_id: row.get("enrollment_id")?,
        date_obtained,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
