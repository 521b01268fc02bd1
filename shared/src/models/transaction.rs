//! Replenishment transaction models and the delivery state machine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance for comparing summed leg costs against the stored total
/// (cent-level rounding)
pub const COST_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Delivery status of a single vendor leg
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LegStatus {
    Pending,
    InTransit,
    Delivered,
}

impl LegStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegStatus::Pending => "pending",
            LegStatus::InTransit => "in_transit",
            LegStatus::Delivered => "delivered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(LegStatus::Pending),
            "in_transit" => Some(LegStatus::InTransit),
            "delivered" => Some(LegStatus::Delivered),
            _ => None,
        }
    }

    /// Legal transitions: pending -> in_transit -> delivered, with
    /// pending -> delivered allowed for same-day shipments. Delivered is
    /// terminal.
    pub fn can_transition(&self, to: LegStatus) -> bool {
        matches!(
            (self, to),
            (LegStatus::Pending, LegStatus::InTransit)
                | (LegStatus::Pending, LegStatus::Delivered)
                | (LegStatus::InTransit, LegStatus::Delivered)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LegStatus::Delivered)
    }
}

/// One vendor's portion of a transaction's total ordered quantity
///
/// Vendor name and unit cost are immutable snapshots taken when the
/// transaction was created; the live vendor offer may change or disappear
/// without affecting historical legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorLeg {
    pub vendor_name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub status: LegStatus,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl VendorLeg {
    pub fn cost(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.quantity)
    }
}

/// Derived overall state of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    InTransit,
    PartiallyDelivered,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::InTransit => "in_transit",
            TransactionStatus::PartiallyDelivered => "partially_delivered",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "in_transit" => Some(TransactionStatus::InTransit),
            "partially_delivered" => Some(TransactionStatus::PartiallyDelivered),
            "completed" | "delivered" => Some(TransactionStatus::Completed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Cancelled
        )
    }
}

/// A replenishment purchase split across one or more vendor legs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub sku_id: Uuid,
    /// SKU name snapshot for display and audit
    pub sku_name: String,
    pub total_quantity: i64,
    pub total_cost: Decimal,
    /// Terminal override, settable only while every leg is still pending
    pub cancelled: bool,
    pub expected_delivery_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub legs: Vec<VendorLeg>,
    /// Always derived from `cancelled` and the leg statuses, never stored
    pub status: TransactionStatus,
}

/// Derive the aggregate transaction status from the cancelled flag and the
/// individual leg statuses
///
/// The aggregate is never persisted independently; it is recomputed on
/// every read and write.
pub fn derive_status(cancelled: bool, legs: &[VendorLeg]) -> TransactionStatus {
    if cancelled {
        return TransactionStatus::Cancelled;
    }
    if legs.is_empty() {
        return TransactionStatus::Pending;
    }

    let delivered = legs
        .iter()
        .filter(|l| l.status == LegStatus::Delivered)
        .count();

    if delivered == legs.len() {
        TransactionStatus::Completed
    } else if delivered > 0 {
        TransactionStatus::PartiallyDelivered
    } else if legs.iter().any(|l| l.status == LegStatus::InTransit) {
        TransactionStatus::InTransit
    } else {
        TransactionStatus::Pending
    }
}

/// Validate the leg-sum invariants for a proposed transaction
///
/// The sum of leg quantities must equal the total quantity exactly, every
/// leg quantity must be positive, and the summed leg costs must match the
/// total cost within cent tolerance.
pub fn validate_legs(
    total_quantity: i64,
    total_cost: Decimal,
    legs: &[VendorLeg],
) -> Result<(), String> {
    if legs.is_empty() {
        return Err("Transaction must have at least one vendor leg".to_string());
    }

    for leg in legs {
        if leg.quantity <= 0 {
            return Err(format!(
                "Leg quantity for vendor '{}' must be positive",
                leg.vendor_name
            ));
        }
        if leg.unit_cost < Decimal::ZERO {
            return Err(format!(
                "Unit cost for vendor '{}' cannot be negative",
                leg.vendor_name
            ));
        }
    }

    let quantity_sum: i64 = legs.iter().map(|l| l.quantity).sum();
    if quantity_sum != total_quantity {
        return Err(format!(
            "Leg quantities sum to {} but transaction total is {}",
            quantity_sum, total_quantity
        ));
    }

    let cost_sum: Decimal = legs.iter().map(|l| l.cost()).sum();
    if (cost_sum - total_cost).abs() > COST_TOLERANCE {
        return Err(format!(
            "Leg costs sum to {} but transaction total is {}",
            cost_sum, total_cost
        ));
    }

    Ok(())
}
