//! # Rotation Protocol
//!
//! The create/set/test/finish protocol over a versioned secret store. A
//! coordinator drives the steps in order, passing the same client request
//! token to each; the engine reconstructs all state from the store on every
//! call.

pub mod engine;
pub mod event;
pub mod step;

pub use engine::RotationEngine;
pub use event::RotationEvent;
pub use step::RotationStep;
