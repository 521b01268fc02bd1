//! HTTP handlers for audit log endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Actor, AuditAction, AuditEntry};

use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditFilter, AuditService, NewAuditEntry};
use crate::AppState;

/// Input for recording a user-initiated log entry from the front end
#[derive(Debug, Deserialize)]
pub struct CreateLogInput {
    pub actor: Actor,
    pub action: String,
    pub sku_id: Option<Uuid>,
    pub sku_name: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// List audit entries, newest first, optionally filtered
pub async fn list_logs(
    State(state): State<AppState>,
    Query(filter): Query<AuditFilter>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let service = AuditService::new(state.db);
    let entries = service.list(filter).await?;
    Ok(Json(entries))
}

/// Append an audit entry for a front-end user action
pub async fn create_log(
    State(state): State<AppState>,
    Json(input): Json<CreateLogInput>,
) -> AppResult<Json<()>> {
    let action = AuditAction::from_str(&input.action).ok_or_else(|| AppError::Validation {
        field: "action".to_string(),
        message: format!("Unknown action kind '{}'", input.action),
    })?;

    let mut entry = NewAuditEntry::new(input.actor, action);
    if let (Some(sku_id), Some(sku_name)) = (input.sku_id, input.sku_name.as_deref()) {
        entry = entry.sku(sku_id, sku_name);
    }
    if let Some(details) = input.details {
        entry = entry.details(details);
    }

    let service = AuditService::new(state.db);
    service.append(entry).await?;
    Ok(Json(()))
}
