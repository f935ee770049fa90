use certman_core::{Certificate, FileStore, FileStoreError, CREDENTIALS_FILE_NAME};
use chrono::NaiveDate;
use std::fs;

fn valid_certificate() -> Certificate {
    Certificate::new(
        "testemail@mail.ru",
        "default_password",
        vec![
            "answer1".to_string(),
            "answer2".to_string(),
            "answer3".to_string(),
        ],
        "123abc",
        NaiveDate::from_ymd_opt(2016, 1, 7).unwrap(),
    )
}

#[test]
fn save_writes_directory_and_yaml_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let certificate = valid_certificate();

    let saved_at = store.save(&certificate).unwrap();

    let record_dir = dir.path().join("testemail@mail.ru");
    assert_eq!(saved_at, record_dir);
    assert!(record_dir.is_dir());
    let document_path = record_dir.join(CREDENTIALS_FILE_NAME);
    assert!(document_path.is_file());

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(document_path).unwrap()).unwrap();
    let body = &yaml["certificate"];
    assert_eq!(body["email"].as_str(), Some("testemail@mail.ru"));
    assert_eq!(body["password"].as_str(), Some("default_password"));
    assert_eq!(body["enrollment_id"].as_str(), Some("123abc"));
    assert_eq!(body["date_obtained"].as_str(), Some("2016-01-07"));
    assert_eq!(body["questions"].as_sequence().map(Vec::len), Some(3));
}

#[test]
fn saved_document_reads_back_equal() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut certificate = valid_certificate();
    certificate.questions.push("answer: with \"quotes\" and colon".to_string());

    store.save(&certificate).unwrap();

    assert_eq!(store.load(&certificate.email).unwrap(), Some(certificate));
    assert_eq!(store.load("missing@mail.ru").unwrap(), None);
}

#[test]
fn save_leaves_no_staging_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    store.save(&valid_certificate()).unwrap();

    let entries: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["testemail@mail.ru".to_string()]);
}

#[test]
fn save_accepts_email_near_file_name_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let certificate = Certificate {
        email: format!("{}@b.com", "a".repeat(230)),
        ..valid_certificate()
    };
    assert_eq!(certificate.email.len(), 236);

    let saved_at = store.save(&certificate).unwrap();

    assert_eq!(saved_at, dir.path().join(&certificate.email));
    assert_eq!(store.load(&certificate.email).unwrap(), Some(certificate));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn save_refuses_existing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let certificate = valid_certificate();
    fs::create_dir(dir.path().join(&certificate.email)).unwrap();

    let err = store.save(&certificate).unwrap_err();
    assert!(matches!(err, FileStoreError::AlreadyExists(_)));
    assert!(!dir
        .path()
        .join(&certificate.email)
        .join(CREDENTIALS_FILE_NAME)
        .exists());
}

#[test]
fn exists_tracks_directory_presence() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let certificate = valid_certificate();

    assert!(!store.exists(&certificate));
    store.save(&certificate).unwrap();
    assert!(store.exists(&certificate));
}

#[test]
fn exists_ignores_document_contents() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let certificate = valid_certificate();
    fs::create_dir(dir.path().join(&certificate.email)).unwrap();

    assert!(store.exists(&certificate));
}

#[test]
fn delete_removes_directory_recursively() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let certificate = valid_certificate();
    store.save(&certificate).unwrap();
    fs::write(dir.path().join(&certificate.email).join("notes.txt"), "extra").unwrap();

    store.delete(&certificate.email).unwrap();

    assert!(!dir.path().join(&certificate.email).exists());
    assert!(!store.exists(&certificate));
}

#[test]
fn delete_missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());

    let err = store.delete("nobody@mail.ru").unwrap_err();
    assert!(matches!(err, FileStoreError::NotFound(_)));
}

#[test]
fn store_root_with_trailing_separator_works() {
    let dir = tempfile::tempdir().unwrap();
    let root_with_separator = format!("{}{}", dir.path().display(), std::path::MAIN_SEPARATOR);
    let store = FileStore::new(&root_with_separator);
    let certificate = valid_certificate();

    assert_eq!(store.root(), dir.path());
    assert!(!store.exists(&certificate));
    store.save(&certificate).unwrap();
    assert!(store.exists(&certificate));
    assert!(dir.path().join(&certificate.email).is_dir());
    store.delete(&certificate.email).unwrap();
    assert!(!store.exists(&certificate));
}

#[test]
fn ensure_root_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested").join("store"));

    store.ensure_root().unwrap();
    store.save(&valid_certificate()).unwrap();

    assert!(dir.path().join("nested/store/testemail@mail.ru").is_dir());
}

#[test]
fn malformed_document_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let record_dir = dir.path().join("broken@mail.ru");
    fs::create_dir(&record_dir).unwrap();
    fs::write(record_dir.join(CREDENTIALS_FILE_NAME), "certificate: [unclosed").unwrap();

    let err = store.load("broken@mail.ru").unwrap_err();
    assert!(matches!(err, FileStoreError::Document { .. }));
}
