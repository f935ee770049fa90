use certman_core::db::open_db_in_memory;
use certman_core::{
    encode_questions, Certificate, CertificateDraft, CertificateId, CertificateRepository,
    CertificateService, CertmanConfig, FileStore, FixedClock, RepoResult, ReportEngine,
    SqliteCertificateRepository, WeekWindow, REPORT_HEADER,
};
use std::cell::Cell;
use chrono::NaiveDate;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn thursday_draft(email: &str) -> CertificateDraft {
    CertificateDraft::new(email)
        .password("p")
        .questions(["x", "y", "z", "w"])
        .enrollment_id("E1")
        .date_obtained(day(2024, 1, 4))
}

#[test]
fn added_certificate_appears_in_its_week_only() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let service = CertificateService::new(
        FileStore::new(dir.path()),
        SqliteCertificateRepository::try_new(&conn).unwrap(),
        FixedClock(day(2024, 1, 4)),
        &CertmanConfig::default(),
    );
    service.add_certificate(thursday_draft("a@b.com")).unwrap();

    let repo = SqliteCertificateRepository::try_new(&conn).unwrap();

    let report = ReportEngine::new(&repo, FixedClock(day(2024, 1, 5)))
        .generate_report()
        .unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.start(), day(2024, 1, 1));
    assert_eq!(report.end(), day(2024, 1, 7));
    assert_eq!(
        report.rows[0].cells(),
        [
            "04.01.2024".to_string(),
            "a@b.com".to_string(),
            "p".to_string(),
            "E1".to_string(),
            encode_questions(&["x", "y", "z", "w"]),
        ]
    );

    let later = ReportEngine::new(&repo, FixedClock(day(2024, 1, 20)))
        .generate_report()
        .unwrap();
    assert_eq!(later.total, 0);
    assert!(later.rows.is_empty());
    assert_eq!(
        later.window,
        WeekWindow {
            start: day(2024, 1, 15),
            end: day(2024, 1, 21)
        }
    );
}

#[test]
fn report_rows_follow_date_order_and_respect_week_bounds() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let service = CertificateService::new(
        FileStore::new(dir.path()),
        SqliteCertificateRepository::try_new(&conn).unwrap(),
        FixedClock(day(2024, 1, 4)),
        &CertmanConfig::default(),
    );
    for (email, date) in [
        ("sunday@b.com", day(2024, 1, 7)),
        ("prev-sunday@b.com", day(2023, 12, 31)),
        ("monday@b.com", day(2024, 1, 1)),
        ("next-monday@b.com", day(2024, 1, 8)),
    ] {
        service
            .add_certificate(thursday_draft(email).date_obtained(date))
            .unwrap();
    }

    let repo = SqliteCertificateRepository::try_new(&conn).unwrap();
    let engine = ReportEngine::new(&repo, FixedClock(day(2024, 1, 1)));
    let report = engine.generate_report().unwrap();

    let emails: Vec<&str> = report.rows.iter().map(|row| row.email.as_str()).collect();
    assert_eq!(emails, vec!["monday@b.com", "sunday@b.com"]);
    assert_eq!(report.total, 2);
    assert_eq!(engine.current_week().to_string(), "01.01.2024-07.01.2024");
}

#[test]
fn header_matches_row_width() {
    assert_eq!(REPORT_HEADER.len(), 5);
    assert_eq!(REPORT_HEADER[0], "Date obtained");
}

/// Fixed in-memory rows; records the last requested window.
struct StaticRepository {
    certificates: Vec<Certificate>,
    requested: Cell<Option<(NaiveDate, NaiveDate)>>,
}

impl CertificateRepository for StaticRepository {
    fn save(&self, _certificate: &Certificate) -> RepoResult<CertificateId> {
        Ok(0)
    }

    fn get_by_email(&self, _email: &str) -> RepoResult<Option<Certificate>> {
        Ok(None)
    }

    fn get_by_id(&self, _id: CertificateId) -> RepoResult<Option<Certificate>> {
        Ok(None)
    }

    fn delete_by_email(&self, _email: &str) -> RepoResult<usize> {
        Ok(0)
    }

    fn exists(&self, _certificate: &Certificate) -> RepoResult<bool> {
        Ok(false)
    }

    fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Certificate>> {
        self.requested.set(Some((start, end)));
        Ok(self
            .certificates
            .iter()
            .filter(|cert| start <= cert.date_obtained && cert.date_obtained <= end)
            .cloned()
            .collect())
    }
}

#[test]
fn report_queries_any_repository_for_the_clock_week() {
    let repo = StaticRepository {
        certificates: vec![
            thursday_draft("a@b.com").build("p", day(2024, 1, 4)),
            thursday_draft("old@b.com")
                .date_obtained(day(2023, 12, 1))
                .build("p", day(2024, 1, 4)),
        ],
        requested: Cell::new(None),
    };

    let report = ReportEngine::new(&repo, FixedClock(day(2024, 1, 3)))
        .generate_report()
        .unwrap();

    assert_eq!(repo.requested.get(), Some((day(2024, 1, 1), day(2024, 1, 7))));
    assert_eq!(report.total, 1);
    assert_eq!(report.rows[0].email, "a@b.com");
}
