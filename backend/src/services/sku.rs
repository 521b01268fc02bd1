//! SKU and vendor offer management
//!
//! Deletion is refused while open transactions still reference the SKU,
//! and otherwise cascades to the SKU's vendor offers, constraints and
//! terminal transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{Actor, AuditAction, Sku, VendorOffer};

use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditService, NewAuditEntry};

/// SKU management service
#[derive(Clone)]
pub struct SkuService {
    db: PgPool,
}

/// Input for creating a SKU together with its vendor offers
#[derive(Debug, Deserialize)]
pub struct CreateSkuInput {
    pub name: String,
    pub on_hand_units: i64,
    #[serde(default)]
    pub vendors: Vec<CreateVendorOfferInput>,
}

/// Input for a single vendor offer
#[derive(Debug, Deserialize)]
pub struct CreateVendorOfferInput {
    pub name: String,
    pub unit_cost: Decimal,
    pub lead_time_days: i32,
    pub min_order_quantity: Option<i64>,
}

/// Input for updating a SKU
#[derive(Debug, Deserialize)]
pub struct UpdateSkuInput {
    pub name: Option<String>,
    pub on_hand_units: Option<i64>,
}

#[derive(Debug, FromRow)]
struct SkuRow {
    id: Uuid,
    name: String,
    on_hand_units: i64,
    created_at: DateTime<Utc>,
}

impl From<SkuRow> for Sku {
    fn from(row: SkuRow) -> Self {
        Sku {
            id: row.id,
            name: row.name,
            on_hand_units: row.on_hand_units,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct VendorOfferRow {
    id: Uuid,
    sku_id: Uuid,
    name: String,
    unit_cost: Decimal,
    lead_time_days: i32,
    min_order_quantity: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<VendorOfferRow> for VendorOffer {
    fn from(row: VendorOfferRow) -> Self {
        VendorOffer {
            id: row.id,
            sku_id: row.sku_id,
            name: row.name,
            unit_cost: row.unit_cost,
            lead_time_days: row.lead_time_days,
            min_order_quantity: row.min_order_quantity,
            created_at: row.created_at,
        }
    }
}

impl SkuService {
    /// Create a new SkuService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a SKU with its initial unit count and vendor offers
    pub async fn create_sku(&self, input: CreateSkuInput) -> AppResult<Sku> {
        shared::validate_sku_name(&input.name)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        shared::validate_unit_count(input.on_hand_units)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        for vendor in &input.vendors {
            Self::validate_vendor_input(vendor)?;
        }

        let mut tx = self.db.begin().await?;

        let sku = sqlx::query_as::<_, SkuRow>(
            r#"
            INSERT INTO skus (name, on_hand_units)
            VALUES ($1, $2)
            RETURNING id, name, on_hand_units, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.on_hand_units)
        .fetch_one(&mut *tx)
        .await?;

        for vendor in &input.vendors {
            sqlx::query(
                r#"
                INSERT INTO vendor_offers (sku_id, name, unit_cost, lead_time_days, min_order_quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(sku.id)
            .bind(vendor.name.trim())
            .bind(vendor.unit_cost)
            .bind(vendor.lead_time_days)
            .bind(vendor.min_order_quantity)
            .execute(&mut *tx)
            .await?;
        }

        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(Actor::User, AuditAction::AddSku)
                .sku(sku.id, &sku.name)
                .details(serde_json::json!({
                    "on_hand_units": sku.on_hand_units,
                    "vendors_added": input.vendors.len(),
                })),
        )
        .await?;

        tx.commit().await?;

        Ok(sku.into())
    }

    /// List all SKUs, newest first
    pub async fn list_skus(&self) -> AppResult<Vec<Sku>> {
        let rows = sqlx::query_as::<_, SkuRow>(
            r#"
            SELECT id, name, on_hand_units, created_at
            FROM skus
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Sku::from).collect())
    }

    /// Get a single SKU
    pub async fn get_sku(&self, sku_id: Uuid) -> AppResult<Sku> {
        let row = sqlx::query_as::<_, SkuRow>(
            "SELECT id, name, on_hand_units, created_at FROM skus WHERE id = $1",
        )
        .bind(sku_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("SKU".to_string()))?;

        Ok(row.into())
    }

    /// Update a SKU's name and/or on-hand units
    ///
    /// A manual unit edit is an explicit user action that bypasses delivery
    /// semantics but still may not drive the count negative.
    pub async fn update_sku(&self, sku_id: Uuid, input: UpdateSkuInput) -> AppResult<Sku> {
        if input.name.is_none() && input.on_hand_units.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }
        if let Some(name) = &input.name {
            shared::validate_sku_name(name)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
        }
        if let Some(units) = input.on_hand_units {
            shared::validate_unit_count(units)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
        }

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, SkuRow>(
            "SELECT id, name, on_hand_units, created_at FROM skus WHERE id = $1 FOR UPDATE",
        )
        .bind(sku_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("SKU".to_string()))?;

        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.name);
        let units = input.on_hand_units.unwrap_or(existing.on_hand_units);

        let updated = sqlx::query_as::<_, SkuRow>(
            r#"
            UPDATE skus SET name = $1, on_hand_units = $2
            WHERE id = $3
            RETURNING id, name, on_hand_units, created_at
            "#,
        )
        .bind(name)
        .bind(units)
        .bind(sku_id)
        .fetch_one(&mut *tx)
        .await?;

        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(Actor::User, AuditAction::EditSku)
                .sku(sku_id, &existing.name)
                .details(serde_json::json!({
                    "name": updated.name,
                    "on_hand_units": updated.on_hand_units,
                })),
        )
        .await?;

        tx.commit().await?;

        Ok(updated.into())
    }

    /// Delete a SKU, its vendor offers, constraints and terminal transactions
    ///
    /// Refused while any open (non-terminal) transaction references the
    /// SKU: an in-flight delivery must not lose its inventory target.
    /// Completed and cancelled transactions go with the SKU; the audit log
    /// remains the durable record of what happened.
    pub async fn delete_sku(&self, sku_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let sku = sqlx::query_as::<_, SkuRow>(
            "SELECT id, name, on_hand_units, created_at FROM skus WHERE id = $1 FOR UPDATE",
        )
        .bind(sku_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("SKU".to_string()))?;

        let open_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM transactions t
            WHERE t.sku_id = $1
              AND NOT t.cancelled
              AND EXISTS (
                  SELECT 1 FROM transaction_legs l
                  WHERE l.transaction_id = t.id AND l.status <> 'delivered'
              )
            "#,
        )
        .bind(sku_id)
        .fetch_one(&mut *tx)
        .await?;

        if open_count > 0 {
            return Err(AppError::ValidationError(format!(
                "Cannot delete SKU '{}': {} open transaction(s) still reference it",
                sku.name, open_count
            )));
        }

        // Vendor offers, constraints and terminal transactions (with their
        // legs) cascade at the database level; the audit log keeps the
        // sku_name snapshot

        sqlx::query("DELETE FROM skus WHERE id = $1")
            .bind(sku_id)
            .execute(&mut *tx)
            .await?;

        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(Actor::User, AuditAction::DeleteSku).sku(sku_id, &sku.name),
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Add a vendor offer for a SKU
    pub async fn add_vendor_offer(
        &self,
        sku_id: Uuid,
        input: CreateVendorOfferInput,
    ) -> AppResult<VendorOffer> {
        Self::validate_vendor_input(&input)?;

        // Validate the SKU exists
        let sku_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM skus WHERE id = $1)")
                .bind(sku_id)
                .fetch_one(&self.db)
                .await?;

        if !sku_exists {
            return Err(AppError::NotFound("SKU".to_string()));
        }

        let offer = sqlx::query_as::<_, VendorOfferRow>(
            r#"
            INSERT INTO vendor_offers (sku_id, name, unit_cost, lead_time_days, min_order_quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sku_id, name, unit_cost, lead_time_days, min_order_quantity, created_at
            "#,
        )
        .bind(sku_id)
        .bind(input.name.trim())
        .bind(input.unit_cost)
        .bind(input.lead_time_days)
        .bind(input.min_order_quantity)
        .fetch_one(&self.db)
        .await?;

        Ok(offer.into())
    }

    /// List vendor offers for a SKU
    pub async fn list_vendor_offers(&self, sku_id: Uuid) -> AppResult<Vec<VendorOffer>> {
        let sku_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM skus WHERE id = $1)")
                .bind(sku_id)
                .fetch_one(&self.db)
                .await?;

        if !sku_exists {
            return Err(AppError::NotFound("SKU".to_string()));
        }

        let rows = sqlx::query_as::<_, VendorOfferRow>(
            r#"
            SELECT id, sku_id, name, unit_cost, lead_time_days, min_order_quantity, created_at
            FROM vendor_offers
            WHERE sku_id = $1
            ORDER BY unit_cost ASC, lead_time_days ASC, name ASC
            "#,
        )
        .bind(sku_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(VendorOffer::from).collect())
    }

    fn validate_vendor_input(input: &CreateVendorOfferInput) -> AppResult<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Vendor name cannot be empty".to_string(),
            });
        }
        shared::validate_unit_cost(input.unit_cost).map_err(|e| AppError::Validation {
            field: "unit_cost".to_string(),
            message: e.to_string(),
        })?;
        shared::validate_lead_time(input.lead_time_days).map_err(|e| AppError::Validation {
            field: "lead_time_days".to_string(),
            message: e.to_string(),
        })?;
        if let Some(min) = input.min_order_quantity {
            if min <= 0 {
                return Err(AppError::Validation {
                    field: "min_order_quantity".to_string(),
                    message: "Minimum order quantity must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}
