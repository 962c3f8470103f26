//! Full rotation against a real PostgreSQL server.
// To run these tests: cargo test --features postgres_tests
#![cfg(feature = "postgres_tests")]

use secret_rotator::config::AppConfig;
use secret_rotator::database::{DatabaseDriver, EngineKind, PostgresDriver};
use secret_rotator::secrets::{
    InMemorySecretStore, SecretPayload, SecretStore, SecretString, StageLabel,
};
use secret_rotator::{RotationEngine, RotationStep};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

const SECRET_ID: &str = "it/postgres";
const TOKEN: &str = "3f6a9a52-2b1e-4d4b-9c1a-8a0e5f3d7c21";

#[tokio::test]
async fn test_rotation_against_postgres() {
    let container = Postgres::default().start().await.expect("start postgres");
    let port = container.get_host_port_ipv4(5432).await.expect("mapped port");

    let admin = secret_rotator::database::ConnectionParams {
        engine: EngineKind::Postgres,
        host: "127.0.0.1".into(),
        port,
        username: "postgres".into(),
        password: SecretString::new("postgres"),
        database: Some("postgres".into()),
    };
    let driver = PostgresDriver::new(Duration::from_secs(10));
    driver.check_connection(&admin).await.expect("admin login");
    // The rotated account is a plain login role, not the superuser
    let options = sqlx::postgres::PgConnectOptions::new()
        .host("127.0.0.1")
        .port(port)
        .username("postgres")
        .password("postgres")
        .database("postgres");
    let mut conn = <sqlx::PgConnection as sqlx::Connection>::connect_with(&options)
        .await
        .expect("admin connection");
    sqlx::raw_sql("CREATE ROLE app LOGIN PASSWORD 'initial-pw'")
        .execute(&mut conn)
        .await
        .expect("create role");
    sqlx::Connection::close(conn).await.expect("close");

    let store = Arc::new(InMemorySecretStore::new());
    let payload = SecretPayload {
        engine: "postgres".into(),
        host: "127.0.0.1".into(),
        port: Some(port),
        username: "app".into(),
        password: SecretString::new("initial-pw"),
        dbname: Some("postgres".into()),
        extra: serde_json::Map::new(),
    };
    store.create_secret(SECRET_ID, payload).await.unwrap();
    store.set_rotation_enabled(SECRET_ID, true).await.unwrap();
    store.stage_pending(SECRET_ID, TOKEN).await.unwrap();

    let engine = RotationEngine::from_config(store.clone(), &AppConfig::default());
    for step in RotationStep::ALL {
        engine.handle_rotation_step(SECRET_ID, TOKEN, step).await.expect("rotation step");
    }

    let description = store.describe(SECRET_ID).await.unwrap();
    assert_eq!(description.version_with_stage(&StageLabel::Current), Some(TOKEN));

    // The old password no longer works; the new one does
    let rotated = store.payload(SECRET_ID, TOKEN).await.unwrap();
    let new_params = rotated.connection_params().unwrap();
    driver.check_connection(&new_params).await.expect("login with rotated password");

    let old_params = secret_rotator::database::ConnectionParams {
        password: SecretString::new("initial-pw"),
        ..new_params
    };
    assert!(driver.check_connection(&old_params).await.is_err());
}
