//! In-process stand-in for a database server.

use async_trait::async_trait;
use secret_rotator::database::{ConnectionParams, DatabaseDriver, EngineKind};
use secret_rotator::secrets::SecretString;
use secret_rotator::{Result, RotationError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    CheckConnection { username: String },
    ChangePassword { login: String, target: String },
}

/// Accounts with passwords; logins and password changes behave like a real
/// server would.
#[derive(Debug)]
pub struct FakeDatabase {
    engine: EngineKind,
    accounts: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<DriverCall>>,
    unreachable: AtomicBool,
}

impl FakeDatabase {
    pub fn new(engine: EngineKind, username: &str, password: &str) -> Arc<Self> {
        Arc::new(Self {
            engine,
            accounts: Mutex::new(HashMap::from([(username.to_string(), password.to_string())])),
            calls: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
        })
    }

    pub fn password_of(&self, username: &str) -> Option<String> {
        self.accounts.lock().unwrap().get(username).cloned()
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn password_changes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DriverCall::ChangePassword { .. }))
            .count()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn login(&self, params: &ConnectionParams) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RotationError::connection_failed(
                self.engine.as_str(),
                params.endpoint(),
                "connect timed out after 30s",
            ));
        }
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(&params.username) {
            Some(password) if password == params.password.expose_secret() => Ok(()),
            _ => Err(RotationError::connection_failed(
                self.engine.as_str(),
                params.endpoint(),
                format!("login as '{}' failed", params.username),
            )),
        }
    }
}

#[async_trait]
impl DatabaseDriver for FakeDatabase {
    fn engine(&self) -> EngineKind {
        self.engine
    }

    async fn check_connection(&self, params: &ConnectionParams) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(DriverCall::CheckConnection { username: params.username.clone() });
        self.login(params)
    }

    async fn change_password(
        &self,
        params: &ConnectionParams,
        target_username: &str,
        new_password: &SecretString,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(DriverCall::ChangePassword {
            login: params.username.clone(),
            target: target_username.to_string(),
        });
        self.login(params)?;
        self.accounts
            .lock()
            .unwrap()
            .insert(target_username.to_string(), new_password.expose_secret().to_string());
        Ok(())
    }
}
