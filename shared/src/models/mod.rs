//! Domain models for the Restock replenishment engine

mod audit;
mod constraint;
mod sku;
mod transaction;
mod vendor;

pub use audit::*;
pub use constraint::*;
pub use sku::*;
pub use transaction::*;
pub use vendor::*;
