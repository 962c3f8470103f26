//! CLI-level tests: event files, exit status mapping.

mod common;

use common::fake_db::FakeDatabase;
use common::{engine, postgres_payload, seeded_store, NEXT_TOKEN, OLD_PASSWORD, SECRET_ID};
use secret_rotator::cli::{execute, read_event, EXIT_TEMPFAIL};
use secret_rotator::database::EngineKind;
use secret_rotator::secrets::{SecretStore, StageLabel};
use secret_rotator::RotationStep;
use std::io::Write;
use tempfile::NamedTempFile;

fn event_file(step: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"SecretId": "{}", "ClientRequestToken": "{}", "Step": "{}"}}"#,
        SECRET_ID, NEXT_TOKEN, step
    )
    .unwrap();
    file
}

#[test]
fn test_read_event_file() {
    let file = event_file("testSecret");
    let event = read_event(Some(file.path())).unwrap();
    assert_eq!(event.secret_id, SECRET_ID);
    assert_eq!(event.client_request_token, NEXT_TOKEN);
    assert_eq!(event.step, RotationStep::TestSecret);
}

#[test]
fn test_read_event_rejects_bad_input() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"SecretId": "{}"}}"#, SECRET_ID).unwrap();
    assert!(read_event(Some(file.path())).is_err());

    assert!(read_event(Some(std::path::Path::new("/nonexistent/event.json"))).is_err());
}

#[tokio::test]
async fn test_event_files_drive_a_rotation() {
    let (store, _) = seeded_store(postgres_payload()).await;
    let database = FakeDatabase::new(EngineKind::Postgres, "app", OLD_PASSWORD);
    let engine = engine(store.clone(), &[database]);

    for step in RotationStep::ALL {
        let file = event_file(step.as_str());
        let event = read_event(Some(file.path())).unwrap();
        assert_eq!(execute(&engine, &event, 1, 3).await, 0);
    }

    let description = store.describe(SECRET_ID).await.unwrap();
    assert_eq!(description.version_with_stage(&StageLabel::Current), Some(NEXT_TOKEN));
}

#[tokio::test]
async fn test_exit_status_reflects_retry_budget() {
    let (store, _) = seeded_store(postgres_payload()).await;
    let database = FakeDatabase::new(EngineKind::Postgres, "app", OLD_PASSWORD);
    let engine = engine(store, &[database.clone()]);

    let create = read_event(Some(event_file("createSecret").path())).unwrap();
    assert_eq!(execute(&engine, &create, 1, 3).await, 0);

    database.set_unreachable(true);
    let set = read_event(Some(event_file("setSecret").path())).unwrap();
    assert_eq!(execute(&engine, &set, 1, 3).await, EXIT_TEMPFAIL);
    assert_eq!(execute(&engine, &set, 3, 3).await, 1);
}

#[tokio::test]
async fn test_permanent_failure_exit_status() {
    let (store, _) = seeded_store(postgres_payload()).await;
    store.set_rotation_enabled(SECRET_ID, false).await.unwrap();
    let engine = engine(store, &[]);

    let event = read_event(Some(event_file("createSecret").path())).unwrap();
    assert_eq!(execute(&engine, &event, 1, 3).await, 1);
}
