//! Current-week certificate report.

use crate::clock::Clock;
use crate::model::certificate::Certificate;
use crate::model::questions::encode_questions;
use crate::repo::certificate_repo::{CertificateRepository, RepoResult};
use chrono::{Datelike, Duration, NaiveDate};
use log::info;
use std::fmt::{Display, Formatter};

/// Column titles matching [`ReportRow::cells`].
pub const REPORT_HEADER: [&str; 5] = [
    "Date obtained",
    "E-mail",
    "Password",
    "Enrollment ID",
    "Answers to secret questions",
];

const REPORT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Inclusive Monday..Sunday date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for WeekWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(REPORT_DATE_FORMAT),
            self.end.format(REPORT_DATE_FORMAT)
        )
    }
}

/// Returns the calendar week (Monday first) containing `today`.
pub fn current_week(today: NaiveDate) -> WeekWindow {
    let offset = i64::from(today.weekday().num_days_from_monday());
    let start = today - Duration::days(offset);
    WeekWindow {
        start,
        end: start + Duration::days(6),
    }
}

/// One report line derived from a stored certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date_obtained: NaiveDate,
    pub email: String,
    pub password: String,
    pub enrollment_id: String,
    /// Answers in the same numbered encoding the relational store uses.
    pub questions: String,
}

impl ReportRow {
    pub fn from_certificate(certificate: &Certificate) -> Self {
        Self {
            date_obtained: certificate.date_obtained,
            email: certificate.email.clone(),
            password: certificate.password.clone(),
            enrollment_id: certificate.enrollment_id.clone(),
            questions: encode_questions(&certificate.questions),
        }
    }

    /// Display cells in [`REPORT_HEADER`] order; the date is `DD.MM.YYYY`.
    pub fn cells(&self) -> [String; 5] {
        [
            self.date_obtained.format(REPORT_DATE_FORMAT).to_string(),
            self.email.clone(),
            self.password.clone(),
            self.enrollment_id.clone(),
            self.questions.clone(),
        ]
    }
}

/// Rows for one week plus the window and count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReport {
    pub rows: Vec<ReportRow>,
    pub window: WeekWindow,
    pub total: usize,
}

impl WeeklyReport {
    pub fn start(&self) -> NaiveDate {
        self.window.start
    }

    pub fn end(&self) -> NaiveDate {
        self.window.end
    }
}

/// Builds weekly reports from the relational store.
pub struct ReportEngine<'repo, R: CertificateRepository, C: Clock> {
    repo: &'repo R,
    clock: C,
}

impl<'repo, R: CertificateRepository, C: Clock> ReportEngine<'repo, R, C> {
    pub fn new(repo: &'repo R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Window for the clock's current date.
    pub fn current_week(&self) -> WeekWindow {
        current_week(self.clock.today())
    }

    /// Reports every certificate obtained in the current week.
    pub fn generate_report(&self) -> RepoResult<WeeklyReport> {
        let window = self.current_week();
        let rows: Vec<ReportRow> = self
            .repo
            .get_by_date_range(window.start, window.end)?
            .iter()
            .map(ReportRow::from_certificate)
            .collect();

        let total = rows.len();
        info!(
            "event=report_generate module=report status=ok start={} end={} total={}",
            window.start, window.end, total
        );
        Ok(WeeklyReport {
            rows,
            window,
            total,
        })
    }
}
