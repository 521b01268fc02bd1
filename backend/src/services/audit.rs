//! Append-only audit log service
//!
//! Every state-changing action and every rejected attempt leaves an entry
//! here. Entries are never updated or deleted; concurrent appends need no
//! synchronization beyond the insert itself.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use shared::{Actor, AuditAction, AuditEntry};

use crate::error::{AppError, AppResult};

/// Audit log service
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

/// A new entry, before persistence
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor: Actor,
    pub action: AuditAction,
    pub sku_id: Option<Uuid>,
    pub sku_name: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl NewAuditEntry {
    pub fn new(actor: Actor, action: AuditAction) -> Self {
        Self {
            actor,
            action,
            sku_id: None,
            sku_name: None,
            details: None,
        }
    }

    pub fn sku(mut self, sku_id: Uuid, sku_name: &str) -> Self {
        self.sku_id = Some(sku_id);
        self.sku_name = Some(sku_name.to_string());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Filters for listing audit entries
#[derive(Debug, Default, Deserialize)]
pub struct AuditFilter {
    pub actor: Option<String>,
    pub action: Option<String>,
    pub limit: Option<i64>,
}

/// Row shape for audit queries
#[derive(Debug, FromRow)]
struct AuditRow {
    id: Uuid,
    actor: String,
    action: String,
    sku_id: Option<Uuid>,
    sku_name: Option<String>,
    details: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_entry(self) -> AppResult<AuditEntry> {
        let actor = Actor::from_str(&self.actor)
            .ok_or_else(|| AppError::StorageError(format!("unknown actor '{}'", self.actor)))?;
        let action = AuditAction::from_str(&self.action).ok_or_else(|| {
            AppError::StorageError(format!("unknown audit action '{}'", self.action))
        })?;
        Ok(AuditEntry {
            id: self.id,
            actor,
            action,
            sku_id: self.sku_id,
            sku_name: self.sku_name,
            details: self.details,
            created_at: self.created_at,
        })
    }
}

impl AuditService {
    /// Create a new AuditService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append an entry outside of any caller-managed transaction
    pub async fn append(&self, entry: NewAuditEntry) -> AppResult<()> {
        Self::append_on(&self.db, entry).await
    }

    /// Append an entry on the given executor
    ///
    /// Services that must commit an audit entry atomically with their own
    /// writes call this with their open database transaction.
    pub async fn append_on<'e, E>(executor: E, entry: NewAuditEntry) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_log (actor, action, sku_id, sku_name, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.actor.as_str())
        .bind(entry.action.as_str())
        .bind(entry.sku_id)
        .bind(&entry.sku_name)
        .bind(&entry.details)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// List entries, newest first, optionally filtered by actor and action
    pub async fn list(&self, filter: AuditFilter) -> AppResult<Vec<AuditEntry>> {
        if let Some(actor) = &filter.actor {
            if Actor::from_str(actor).is_none() {
                return Err(AppError::Validation {
                    field: "actor".to_string(),
                    message: format!("Unknown actor '{}'", actor),
                });
            }
        }
        if let Some(action) = &filter.action {
            if AuditAction::from_str(action).is_none() {
                return Err(AppError::Validation {
                    field: "action".to_string(),
                    message: format!("Unknown action kind '{}'", action),
                });
            }
        }

        let limit = filter.limit.unwrap_or(100).clamp(1, 1000);

        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, actor, action, sku_id, sku_name, details, created_at
            FROM audit_log
            WHERE ($1::text IS NULL OR actor = $1)
              AND ($2::text IS NULL OR action = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(&filter.actor)
        .bind(&filter.action)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AuditRow::into_entry).collect()
    }
}
