//! Vendor offer models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vendor's standing offer for a single SKU
///
/// Transaction legs snapshot the offer's name and unit cost at creation
/// time; editing or deleting an offer never changes historical legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorOffer {
    pub id: Uuid,
    pub sku_id: Uuid,
    pub name: String,
    pub unit_cost: Decimal,
    pub lead_time_days: i32,
    pub min_order_quantity: Option<i64>,
    pub created_at: DateTime<Utc>,
}
