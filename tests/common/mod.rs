//! Common test utilities for all integration tests.
//!
//! Provides a seeded in-memory secret store and a fake database that records
//! every driver call.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod fake_db;
pub mod faulty_store;

use fake_db::FakeDatabase;
use secret_rotator::database::DriverRegistry;
use secret_rotator::password::PasswordPolicy;
use secret_rotator::secrets::{InMemorySecretStore, SecretPayload, SecretStore, SecretString};
use secret_rotator::RotationEngine;
use std::sync::Arc;

pub const SECRET_ID: &str = "prod/orders/db";
pub const OLD_PASSWORD: &str = "old-password-1";
pub const NEXT_TOKEN: &str = "7b0f1c6e-2d7c-4c1e-9a43-3f2e8e51a0d2";

pub fn postgres_payload() -> SecretPayload {
    payload("postgres", "app")
}

pub fn payload(engine: &str, username: &str) -> SecretPayload {
    SecretPayload {
        engine: engine.to_string(),
        host: "db1.internal".to_string(),
        port: Some(5432),
        username: username.to_string(),
        password: SecretString::new(OLD_PASSWORD),
        dbname: Some("orders".to_string()),
        extra: serde_json::Map::new(),
    }
}

/// Store holding `payload` as CURRENT with rotation enabled and
/// [`NEXT_TOKEN`] staged AWSPENDING. Returns the store and the CURRENT token.
pub async fn seeded_store(payload: SecretPayload) -> (Arc<InMemorySecretStore>, String) {
    let store = Arc::new(InMemorySecretStore::new());
    let current = store.create_secret(SECRET_ID, payload).await.unwrap();
    store.set_rotation_enabled(SECRET_ID, true).await.unwrap();
    store.stage_pending(SECRET_ID, NEXT_TOKEN).await.unwrap();
    (store, current)
}

pub fn engine(store: Arc<dyn SecretStore>, databases: &[Arc<FakeDatabase>]) -> RotationEngine {
    let mut registry = DriverRegistry::new();
    for database in databases {
        registry.register(database.clone());
    }
    RotationEngine::new(store, Arc::new(registry), PasswordPolicy::default())
}
