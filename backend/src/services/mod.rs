//! Business logic services for the Restock replenishment engine

pub mod audit;
pub mod constraint;
pub mod ledger;
pub mod proposal;
pub mod scheduler;
pub mod sku;
pub mod stats;
pub mod transaction;

pub use audit::AuditService;
pub use constraint::ConstraintService;
pub use ledger::InventoryLedger;
pub use proposal::ProposalService;
pub use scheduler::ReconciliationScheduler;
pub use sku::SkuService;
pub use stats::StatsService;
pub use transaction::TransactionService;
