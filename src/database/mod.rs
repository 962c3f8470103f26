//! # Database Drivers
//!
//! Per-engine password changes and login checks. Each driver opens a single
//! short-lived connection per call; nothing is pooled across rotation steps.

pub mod dialect;
pub mod driver;
pub mod engine;
pub mod mysql;
#[cfg(feature = "oracle")]
pub mod oracle;
pub mod postgres;
mod sqlx_support;

pub use driver::{DatabaseDriver, DriverRegistry};
pub use engine::{ConnectionParams, EngineKind};
pub use mysql::MySqlDriver;
#[cfg(feature = "oracle")]
pub use oracle::OracleDriver;
pub use postgres::PostgresDriver;
