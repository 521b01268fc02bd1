//! SKU (stock keeping unit) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A distinct inventory item tracked by name and on-hand unit count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub id: Uuid,
    pub name: String,
    /// Current on-hand units, never negative. Mutated by confirmed
    /// deliveries and by explicit manual edits only.
    pub on_hand_units: i64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate dashboard statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_skus: i64,
    pub total_units: i64,
    pub total_vendors: i64,
    pub avg_unit_cost: rust_decimal::Decimal,
}
