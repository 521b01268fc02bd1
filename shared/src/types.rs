//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Who performed a state-changing action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    Ai,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::User => "user",
            Actor::Ai => "ai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Actor::User),
            "ai" => Some(Actor::Ai),
            _ => None,
        }
    }
}

/// Audit log action kinds
///
/// Fixed vocabulary: extend only by adding new kinds, never by repurposing
/// existing ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Prediction,
    ConstraintViolation,
    Delivery,
    AddSku,
    EditSku,
    DeleteSku,
    Transaction,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Prediction => "prediction",
            AuditAction::ConstraintViolation => "constraint_violation",
            AuditAction::Delivery => "delivery",
            AuditAction::AddSku => "add_sku",
            AuditAction::EditSku => "edit_sku",
            AuditAction::DeleteSku => "delete_sku",
            AuditAction::Transaction => "transaction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "prediction" => Some(AuditAction::Prediction),
            "constraint_violation" => Some(AuditAction::ConstraintViolation),
            "delivery" => Some(AuditAction::Delivery),
            "add_sku" => Some(AuditAction::AddSku),
            "edit_sku" => Some(AuditAction::EditSku),
            "delete_sku" => Some(AuditAction::DeleteSku),
            "transaction" => Some(AuditAction::Transaction),
            _ => None,
        }
    }
}

/// Kinds of purchasing constraints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    MaxQuantity,
    MinQuantity,
    BudgetLimit,
    VendorRestriction,
    MonthlyBudget,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::MaxQuantity => "max_quantity",
            ConstraintKind::MinQuantity => "min_quantity",
            ConstraintKind::BudgetLimit => "budget_limit",
            ConstraintKind::VendorRestriction => "vendor_restriction",
            ConstraintKind::MonthlyBudget => "monthly_budget",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "max_quantity" => Some(ConstraintKind::MaxQuantity),
            "min_quantity" => Some(ConstraintKind::MinQuantity),
            "budget_limit" => Some(ConstraintKind::BudgetLimit),
            "vendor_restriction" => Some(ConstraintKind::VendorRestriction),
            "monthly_budget" => Some(ConstraintKind::MonthlyBudget),
            _ => None,
        }
    }

    /// Whether the constraint value is interpreted as a number
    /// (`vendor_restriction` carries a vendor name set instead)
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ConstraintKind::VendorRestriction)
    }
}
