//! Certificate record and its "bound" validation rules.
//!
//! # Responsibility
//! - Define the in-memory credential set persisted by both stores.
//! - Apply creation-time defaults (password fallback, obtained date).
//! - Decide whether a record is complete enough to persist.
//!
//! # Invariants
//! - A bound record has non-empty email, password, answers and enrollment id.
//! - Email shape is checked by substring search, so trailing text after a
//!   valid-looking address is accepted.
//! - A bound email names exactly one directory: it carries no path
//!   separator or NUL byte.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("valid email shape regex"));

const UNSAFE_EMAIL_CHARS: [char; 3] = ['/', '\\', '\0'];

/// Validation failure returned by [`Certificate::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateValidationError {
    MissingEmail,
    InvalidEmail(String),
    /// Email cannot be used as a single record directory name.
    UnsafeEmail(String),
    MissingPassword,
    MissingQuestions,
    MissingEnrollmentId,
}

impl Display for CertificateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEmail => write!(f, "email is required"),
            Self::InvalidEmail(email) => write!(f, "`{email}` does not look like an email"),
            Self::UnsafeEmail(email) => {
                write!(f, "`{email}` must not contain path separators")
            }
            Self::MissingPassword => write!(f, "password is required"),
            Self::MissingQuestions => write!(f, "at least one secret-question answer is required"),
            Self::MissingEnrollmentId => write!(f, "enrollment id is required"),
        }
    }
}

impl Error for CertificateValidationError {}

/// One certificate credential set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Unique across both stores; also the record directory name.
    pub email: String,
    pub password: String,
    /// Answers to the secret questions, positionally numbered from 1.
    pub questions: Vec<String>,
    /// Free-form external reference.
    pub enrollment_id: String,
    pub date_obtained: NaiveDate,
}

impl Certificate {
    /// Creates a record with every attribute supplied explicitly.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        questions: Vec<String>,
        enrollment_id: impl Into<String>,
        date_obtained: NaiveDate,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            questions,
            enrollment_id: enrollment_id.into(),
            date_obtained,
        }
    }

    /// Checks the bound rules and reports the first failing one.
    ///
    /// # Errors
    /// - Returns a missing-field variant for any empty attribute.
    /// - Returns `InvalidEmail` when no email-shaped substring is found.
    /// - Returns `UnsafeEmail` when the email contains `/`, `\` or NUL.
    pub fn validate(&self) -> Result<(), CertificateValidationError> {
        if self.email.is_empty() {
            return Err(CertificateValidationError::MissingEmail);
        }
        if self.password.is_empty() {
            return Err(CertificateValidationError::MissingPassword);
        }
        if self.questions.is_empty() {
            return Err(CertificateValidationError::MissingQuestions);
        }
        if self.enrollment_id.is_empty() {
            return Err(CertificateValidationError::MissingEnrollmentId);
        }
        if !EMAIL_SHAPE_RE.is_match(&self.email) {
            return Err(CertificateValidationError::InvalidEmail(self.email.clone()));
        }
        if self.email.contains(UNSAFE_EMAIL_CHARS) {
            return Err(CertificateValidationError::UnsafeEmail(self.email.clone()));
        }
        Ok(())
    }

    /// Returns whether this record may be persisted.
    pub fn is_bound(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Caller input for a new record, before defaults are applied.
///
/// Defaults applied by [`CertificateDraft::build`]:
/// - `password`: absent or empty becomes the configured default password.
/// - `date_obtained`: absent becomes the supplied `today`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateDraft {
    pub email: String,
    pub password: Option<String>,
    pub questions: Vec<String>,
    pub enrollment_id: String,
    pub date_obtained: Option<NaiveDate>,
}

impl CertificateDraft {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn questions<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.questions = answers.into_iter().map(Into::into).collect();
        self
    }

    pub fn enrollment_id(mut self, enrollment_id: impl Into<String>) -> Self {
        self.enrollment_id = enrollment_id.into();
        self
    }

    pub fn date_obtained(mut self, date: NaiveDate) -> Self {
        self.date_obtained = Some(date);
        self
    }

    /// Materializes the record. Does not validate; see [`Certificate::validate`].
    pub fn build(self, default_password: &str, today: NaiveDate) -> Certificate {
        let password = match self.password {
            Some(password) if !password.is_empty() => password,
            _ => default_password.to_string(),
        };

        Certificate {
            email: self.email,
            password,
            questions: self.questions,
            enrollment_id: self.enrollment_id,
            date_obtained: self.date_obtained.unwrap_or(today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Certificate, CertificateDraft, CertificateValidationError};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn valid() -> Certificate {
        Certificate::new(
            "someemail@mail.ru",
            "somepassword",
            vec!["...lot of text...".to_string()],
            "123ENROLLE",
            day(2016, 1, 7),
        )
    }

    #[test]
    fn complete_record_is_bound() {
        assert!(valid().is_bound());
    }

    #[test]
    fn each_missing_field_unbinds() {
        let mut cert = valid();
        cert.email.clear();
        assert_eq!(cert.validate(), Err(CertificateValidationError::MissingEmail));

        let mut cert = valid();
        cert.password.clear();
        assert_eq!(cert.validate(), Err(CertificateValidationError::MissingPassword));

        let mut cert = valid();
        cert.questions.clear();
        assert_eq!(cert.validate(), Err(CertificateValidationError::MissingQuestions));

        let mut cert = valid();
        cert.enrollment_id.clear();
        assert_eq!(
            cert.validate(),
            Err(CertificateValidationError::MissingEnrollmentId)
        );
    }

    #[test]
    fn malformed_email_unbinds() {
        for email in ["not an email @ all", "user@host", "@mail.ru", "plain"] {
            let mut cert = valid();
            cert.email = email.to_string();
            assert!(
                matches!(cert.validate(), Err(CertificateValidationError::InvalidEmail(_))),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn path_like_email_unbinds() {
        for email in ["x/a@b.com", "a@b.com/..", "x\\a@b.com", "\0a@b.com"] {
            let mut cert = valid();
            cert.email = email.to_string();
            assert_eq!(
                cert.validate(),
                Err(CertificateValidationError::UnsafeEmail(email.to_string())),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn email_check_is_substring_search() {
        // Known-permissive: trailing text after the address is accepted.
        let mut cert = valid();
        cert.email = "a@b.com extra text".to_string();
        assert!(cert.is_bound());
    }

    #[test]
    fn draft_applies_password_and_date_defaults() {
        let built = CertificateDraft::new("a@b.com")
            .questions(["x"])
            .enrollment_id("E1")
            .build("fallback", day(2024, 1, 4));
        assert_eq!(built.password, "fallback");
        assert_eq!(built.date_obtained, day(2024, 1, 4));

        let blank_password = CertificateDraft::new("a@b.com")
            .password("")
            .build("fallback", day(2024, 1, 4));
        assert_eq!(blank_password.password, "fallback");
    }

    #[test]
    fn draft_keeps_explicit_values() {
        let built = CertificateDraft::new("a@b.com")
            .password("p")
            .questions(["x", "y"])
            .enrollment_id("E1")
            .date_obtained(day(2023, 12, 31))
            .build("fallback", day(2024, 1, 4));
        assert_eq!(
            built,
            Certificate::new(
                "a@b.com",
                "p",
                vec!["x".to_string(), "y".to_string()],
                "E1",
                day(2023, 12, 31)
            )
        );
    }
}
