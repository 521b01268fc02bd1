//! Inventory ledger: the single owner of on-hand unit counts
//!
//! A leg transition to `delivered` is the only path by which this engine
//! increments a SKU's on-hand units. Manual edits go through the SKU
//! update flow, bypass delivery semantics, and may never drive the count
//! negative. The database backs both rules with a CHECK constraint.

use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Inventory ledger service
#[derive(Clone)]
pub struct InventoryLedger {
    db: PgPool,
}

impl InventoryLedger {
    /// Create a new InventoryLedger instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Read-only snapshot of a SKU's current on-hand units
    pub async fn current_units(&self, sku_id: Uuid) -> AppResult<i64> {
        let units =
            sqlx::query_scalar::<_, i64>("SELECT on_hand_units FROM skus WHERE id = $1")
                .bind(sku_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("SKU".to_string()))?;

        Ok(units)
    }

    /// Increment a SKU's on-hand units as part of a delivery confirmation
    ///
    /// Runs on the caller's open database transaction so that the leg
    /// status write and the ledger increment commit or roll back together.
    pub async fn increment_on<'e, E>(executor: E, sku_id: Uuid, delta: i64) -> AppResult<i64>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        if delta <= 0 {
            return Err(AppError::ValidationError(format!(
                "Ledger increment must be positive, got {}",
                delta
            )));
        }

        let units = sqlx::query_scalar::<_, i64>(
            "UPDATE skus SET on_hand_units = on_hand_units + $1 WHERE id = $2 RETURNING on_hand_units",
        )
        .bind(delta)
        .bind(sku_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("SKU".to_string()))?;

        Ok(units)
    }
}
