//! Shared types and models for the Restock replenishment engine
//!
//! This crate contains the pure domain layer: data models, the constraint
//! evaluator, the vendor allocation planner, and the delivery state machine
//! rules. It performs no I/O and is shared between the backend service and
//! its tests.

pub mod allocation;
pub mod constraints;
pub mod models;
pub mod types;
pub mod validation;

pub use allocation::*;
pub use constraints::*;
pub use models::*;
pub use types::*;
pub use validation::*;
