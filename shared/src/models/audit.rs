//! Audit log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Actor, AuditAction};

/// One append-only record of a state-changing action or rejected attempt
///
/// Entries are never mutated or deleted; the default query order is by
/// timestamp, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: Actor,
    pub action: AuditAction,
    pub sku_id: Option<Uuid>,
    pub sku_name: Option<String>,
    /// Free-form structured details (violation text, quantities, reasoning)
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
