//! HTTP handlers for the Restock replenishment service

pub mod audit;
pub mod constraint;
pub mod health;
pub mod prediction;
pub mod sku;
pub mod stats;
pub mod transaction;

pub use audit::*;
pub use constraint::*;
pub use health::*;
pub use prediction::*;
pub use sku::*;
pub use stats::*;
pub use transaction::*;
