//! # Error Handling
//!
//! Error types for the rotation engine. Library code returns
//! [`RotationError`]; the command-line boundary wraps it in `anyhow`.

pub mod types;

pub use types::{ErrorKind, Result, RotationError};
