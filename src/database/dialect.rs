//! Per-engine "change password" statements.
//!
//! DDL cannot take bind parameters on any of the supported engines, so the
//! username and password are embedded as quoted literals. Each builder quotes
//! for its own dialect and rejects input it cannot represent safely.

use super::engine::EngineKind;
use crate::errors::{Result, RotationError};

/// Health probe statement used after connecting
pub fn probe_statement(engine: EngineKind) -> &'static str {
    match engine {
        EngineKind::Postgres | EngineKind::MySql => "SELECT 1",
        EngineKind::Oracle => "SELECT 1 FROM DUAL",
    }
}

fn reject_nul(engine: EngineKind, value: &str, what: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(RotationError::statement_failed(
            engine.as_str(),
            format!("{} contains a NUL character", what),
        ));
    }
    Ok(())
}

/// `"name"` with embedded double quotes doubled
pub fn quote_pg_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `'value'` with embedded single quotes doubled (standard_conforming_strings)
pub fn quote_pg_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `'value'` with backslashes and single quotes escaped
pub fn quote_mysql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// `ALTER USER "name" WITH PASSWORD '...'`
pub fn postgres_alter_user(username: &str, password: &str) -> Result<String> {
    reject_nul(EngineKind::Postgres, username, "username")?;
    reject_nul(EngineKind::Postgres, password, "password")?;
    Ok(format!(
        "ALTER USER {} WITH PASSWORD {}",
        quote_pg_identifier(username),
        quote_pg_literal(password)
    ))
}

/// `ALTER USER ... IDENTIFIED BY '...'`.
///
/// When the connecting account is the target, `CURRENT_USER()` is used so the
/// statement applies to whichever host pattern the login matched.
pub fn mysql_alter_user(connecting_user: &str, username: &str, password: &str) -> Result<String> {
    reject_nul(EngineKind::MySql, username, "username")?;
    reject_nul(EngineKind::MySql, password, "password")?;

    let account = if connecting_user == username {
        "CURRENT_USER()".to_string()
    } else {
        format!("{}@'%'", quote_mysql_literal(username))
    };
    Ok(format!("ALTER USER {} IDENTIFIED BY {}", account, quote_mysql_literal(password)))
}

fn is_oracle_identifier(username: &str) -> bool {
    let mut chars = username.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'))
        && username.len() <= 128
}

/// `ALTER USER NAME IDENTIFIED BY "..."`.
///
/// The username is left unquoted so Oracle applies its usual upper-casing;
/// quoted passwords cannot contain a double quote at all.
pub fn oracle_alter_user(username: &str, password: &str) -> Result<String> {
    if !is_oracle_identifier(username) {
        return Err(RotationError::statement_failed(
            EngineKind::Oracle.as_str(),
            format!("'{}' is not a plain Oracle identifier", username),
        ));
    }
    reject_nul(EngineKind::Oracle, password, "password")?;
    if password.contains('"') {
        return Err(RotationError::statement_failed(
            EngineKind::Oracle.as_str(),
            "password contains a double quote, which Oracle cannot quote",
        ));
    }
    Ok(format!("ALTER USER {} IDENTIFIED BY \"{}\"", username, password))
}
