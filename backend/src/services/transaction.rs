//! Transaction store and delivery state machine
//!
//! Owns transaction records and their per-vendor legs. A leg's transition
//! to `delivered` is the only path that mutates the inventory ledger, and
//! the leg write, the ledger increment and the audit entry commit as one
//! database transaction. Concurrent confirmations of the same leg are
//! serialized by a `FOR UPDATE` lock on the transaction row plus a guarded
//! status update: the loser observes `delivered` and gets
//! `InvalidTransition`, never a double increment.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction as DbTransaction};
use uuid::Uuid;

use shared::{
    derive_status, validate_legs, Actor, AuditAction, LegStatus, Transaction, TransactionStatus,
    VendorLeg,
};

use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditService, NewAuditEntry};
use crate::services::ledger::InventoryLedger;

/// Transaction store service
#[derive(Clone)]
pub struct TransactionService {
    db: PgPool,
}

/// Input for creating a transaction
#[derive(Debug, Deserialize)]
pub struct CreateTransactionInput {
    pub sku_id: Uuid,
    pub legs: Vec<NewLegInput>,
    /// Defaults to the sum of leg quantities
    pub total_quantity: Option<i64>,
    /// Defaults to the sum of leg costs
    pub total_cost: Option<Decimal>,
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub actor: Option<Actor>,
}

/// One vendor leg of a new transaction (vendor data becomes an immutable
/// snapshot on insert)
#[derive(Debug, Clone, Deserialize)]
pub struct NewLegInput {
    pub vendor_name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

/// Filters for listing transactions
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub sku_id: Option<Uuid>,
    /// Matched against the derived aggregate status, never a stored column
    pub status: Option<TransactionStatus>,
}

/// A transaction whose expected delivery date has passed with undelivered
/// legs remaining
#[derive(Debug, Clone, serde::Serialize)]
pub struct DueDelivery {
    pub transaction_id: Uuid,
    pub sku_id: Uuid,
    pub sku_name: String,
    pub total_quantity: i64,
    pub expected_delivery_date: NaiveDate,
    pub undelivered_legs: i64,
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    sku_id: Uuid,
    sku_name: String,
    total_quantity: i64,
    total_cost: Decimal,
    cancelled: bool,
    expected_delivery_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LegRow {
    transaction_id: Uuid,
    vendor_name: String,
    quantity: i64,
    unit_cost: Decimal,
    status: String,
    delivered_at: Option<DateTime<Utc>>,
}

impl LegRow {
    fn into_leg(self) -> AppResult<VendorLeg> {
        let status = LegStatus::from_str(&self.status)
            .ok_or_else(|| AppError::StorageError(format!("unknown leg status '{}'", self.status)))?;
        Ok(VendorLeg {
            vendor_name: self.vendor_name,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            status,
            delivered_at: self.delivered_at,
        })
    }
}

fn assemble(row: TransactionRow, legs: Vec<VendorLeg>) -> Transaction {
    let status = derive_status(row.cancelled, &legs);
    Transaction {
        id: row.id,
        sku_id: row.sku_id,
        sku_name: row.sku_name,
        total_quantity: row.total_quantity,
        total_cost: row.total_cost,
        cancelled: row.cancelled,
        expected_delivery_date: row.expected_delivery_date,
        created_at: row.created_at,
        legs,
        status,
    }
}

impl TransactionService {
    /// Create a new TransactionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a transaction with every leg in `pending`
    ///
    /// Validates the leg-sum invariants before persisting: leg quantities
    /// must sum to the total and leg costs must match the total cost
    /// within cent tolerance.
    pub async fn create_transaction(&self, input: CreateTransactionInput) -> AppResult<Transaction> {
        let legs: Vec<VendorLeg> = input
            .legs
            .iter()
            .map(|l| VendorLeg {
                vendor_name: l.vendor_name.clone(),
                quantity: l.quantity,
                unit_cost: l.unit_cost,
                status: LegStatus::Pending,
                delivered_at: None,
            })
            .collect();

        let total_quantity = input
            .total_quantity
            .unwrap_or_else(|| legs.iter().map(|l| l.quantity).sum());
        let total_cost = input
            .total_cost
            .unwrap_or_else(|| legs.iter().map(|l| l.cost()).sum());

        validate_legs(total_quantity, total_cost, &legs).map_err(AppError::ValidationError)?;

        let actor = input.actor.unwrap_or(Actor::User);

        let mut tx = self.db.begin().await?;

        let sku_name = sqlx::query_scalar::<_, String>("SELECT name FROM skus WHERE id = $1")
            .bind(input.sku_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("SKU".to_string()))?;

        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (sku_id, sku_name, total_quantity, total_cost, expected_delivery_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sku_id, sku_name, total_quantity, total_cost, cancelled,
                      expected_delivery_date, created_at
            "#,
        )
        .bind(input.sku_id)
        .bind(&sku_name)
        .bind(total_quantity)
        .bind(total_cost)
        .bind(input.expected_delivery_date)
        .fetch_one(&mut *tx)
        .await?;

        for (index, leg) in legs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_legs (transaction_id, leg_index, vendor_name, quantity, unit_cost, status)
                VALUES ($1, $2, $3, $4, $5, 'pending')
                "#,
            )
            .bind(row.id)
            .bind(index as i32)
            .bind(&leg.vendor_name)
            .bind(leg.quantity)
            .bind(leg.unit_cost)
            .execute(&mut *tx)
            .await?;
        }

        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(actor, AuditAction::Transaction)
                .sku(row.sku_id, &row.sku_name)
                .details(serde_json::json!({
                    "transaction_id": row.id,
                    "total_quantity": total_quantity,
                    "total_cost": total_cost,
                    "vendors": legs.iter().map(|l| l.vendor_name.clone()).collect::<Vec<_>>(),
                })),
        )
        .await?;

        tx.commit().await?;

        Ok(assemble(row, legs))
    }

    /// Get a single transaction with its derived status
    pub async fn get_transaction(&self, transaction_id: Uuid) -> AppResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, sku_id, sku_name, total_quantity, total_cost, cancelled,
                   expected_delivery_date, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let legs = self.load_legs(transaction_id).await?;
        Ok(assemble(row, legs))
    }

    /// List transactions, newest first
    ///
    /// The status filter is applied to the derived aggregate status after
    /// the legs are loaded; it is never pushed into SQL because the
    /// aggregate is not stored.
    pub async fn list_transactions(&self, filter: TransactionFilter) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, sku_id, sku_name, total_quantity, total_cost, cancelled,
                   expected_delivery_date, created_at
            FROM transactions
            WHERE ($1::uuid IS NULL OR sku_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.sku_id)
        .fetch_all(&self.db)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let leg_rows = sqlx::query_as::<_, LegRow>(
            r#"
            SELECT transaction_id, vendor_name, quantity, unit_cost, status, delivered_at
            FROM transaction_legs
            WHERE transaction_id = ANY($1)
            ORDER BY transaction_id, leg_index
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut legs_by_tx: std::collections::HashMap<Uuid, Vec<VendorLeg>> =
            std::collections::HashMap::new();
        for leg_row in leg_rows {
            let tx_id = leg_row.transaction_id;
            legs_by_tx.entry(tx_id).or_default().push(leg_row.into_leg()?);
        }

        let mut transactions: Vec<Transaction> = rows
            .into_iter()
            .map(|row| {
                let legs = legs_by_tx.remove(&row.id).unwrap_or_default();
                assemble(row, legs)
            })
            .collect();

        if let Some(status) = filter.status {
            transactions.retain(|t| t.status == status);
        }

        Ok(transactions)
    }

    /// Mark one vendor leg of a transaction as delivered
    ///
    /// As a single atomic unit: sets the leg to `delivered`, increments the
    /// SKU's on-hand units by the leg quantity, and appends a `delivery`
    /// audit entry. A second confirmation of the same leg observes
    /// `delivered` and fails with `InvalidTransition` without touching the
    /// ledger.
    pub async fn mark_leg_delivered(
        &self,
        transaction_id: Uuid,
        leg_index: i32,
        actor: Actor,
    ) -> AppResult<Transaction> {
        let mut tx = self.db.begin().await?;

        // Per-transaction exclusive lock: concurrent confirmations queue here
        let header = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, sku_id, sku_name, total_quantity, total_cost, cancelled,
                   expected_delivery_date, created_at
            FROM transactions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        if header.cancelled {
            return self
                .reject_delivery(tx, &header, leg_index, actor, "transaction is cancelled")
                .await;
        }

        let leg = sqlx::query_as::<_, LegRow>(
            r#"
            SELECT transaction_id, vendor_name, quantity, unit_cost, status, delivered_at
            FROM transaction_legs
            WHERE transaction_id = $1 AND leg_index = $2
            "#,
        )
        .bind(transaction_id)
        .bind(leg_index)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction leg".to_string()))?;

        if leg.status == LegStatus::Delivered.as_str() {
            return self
                .reject_delivery(tx, &header, leg_index, actor, "leg is already delivered")
                .await;
        }

        // Guarded status write: zero rows means a concurrent delivery won
        let updated = sqlx::query(
            r#"
            UPDATE transaction_legs
            SET status = 'delivered', delivered_at = NOW()
            WHERE transaction_id = $1 AND leg_index = $2 AND status <> 'delivered'
            "#,
        )
        .bind(transaction_id)
        .bind(leg_index)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return self
                .reject_delivery(tx, &header, leg_index, actor, "leg is already delivered")
                .await;
        }

        InventoryLedger::increment_on(&mut *tx, header.sku_id, leg.quantity).await?;

        let trigger = match actor {
            Actor::User => "manual",
            Actor::Ai => "auto",
        };
        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(actor, AuditAction::Delivery)
                .sku(header.sku_id, &header.sku_name)
                .details(serde_json::json!({
                    "transaction_id": transaction_id,
                    "leg_index": leg_index,
                    "vendor": leg.vendor_name,
                    "quantity_added": leg.quantity,
                    "trigger": trigger,
                })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            %transaction_id,
            leg_index,
            vendor = %leg.vendor_name,
            quantity = leg.quantity,
            "Leg delivered"
        );

        self.get_transaction(transaction_id).await
    }

    /// Advance a pending leg to `in_transit`
    pub async fn mark_leg_in_transit(
        &self,
        transaction_id: Uuid,
        leg_index: i32,
    ) -> AppResult<Transaction> {
        let mut tx = self.db.begin().await?;

        let header = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, sku_id, sku_name, total_quantity, total_cost, cancelled,
                   expected_delivery_date, created_at
            FROM transactions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        if header.cancelled {
            return Self::reject_transition(
                tx,
                &header,
                leg_index,
                "transaction is cancelled",
            )
            .await;
        }

        let updated = sqlx::query(
            r#"
            UPDATE transaction_legs
            SET status = 'in_transit'
            WHERE transaction_id = $1 AND leg_index = $2 AND status = 'pending'
            "#,
        )
        .bind(transaction_id)
        .bind(leg_index)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM transaction_legs WHERE transaction_id = $1 AND leg_index = $2)",
            )
            .bind(transaction_id)
            .bind(leg_index)
            .fetch_one(&mut *tx)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Transaction leg".to_string()));
            }
            return Self::reject_transition(tx, &header, leg_index, "leg is not pending").await;
        }

        tx.commit().await?;

        self.get_transaction(transaction_id).await
    }

    /// Cancel a transaction
    ///
    /// A terminal override, allowed only while every leg is still pending.
    /// Cancelling never touches the ledger.
    pub async fn cancel_transaction(&self, transaction_id: Uuid) -> AppResult<Transaction> {
        let mut tx = self.db.begin().await?;

        let header = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, sku_id, sku_name, total_quantity, total_cost, cancelled,
                   expected_delivery_date, created_at
            FROM transactions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        if header.cancelled {
            AuditService::append_on(
                &mut *tx,
                NewAuditEntry::new(Actor::User, AuditAction::Transaction)
                    .sku(header.sku_id, &header.sku_name)
                    .details(serde_json::json!({
                        "transaction_id": transaction_id,
                        "rejected": true,
                        "reason": "transaction is already cancelled",
                    })),
            )
            .await?;
            tx.commit().await?;

            return Err(AppError::InvalidTransition(
                "Transaction is already cancelled".to_string(),
            ));
        }

        let non_pending = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM transaction_legs
            WHERE transaction_id = $1 AND status <> 'pending'
            "#,
        )
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        if non_pending > 0 {
            AuditService::append_on(
                &mut *tx,
                NewAuditEntry::new(Actor::User, AuditAction::Transaction)
                    .sku(header.sku_id, &header.sku_name)
                    .details(serde_json::json!({
                        "transaction_id": transaction_id,
                        "rejected": true,
                        "reason": "cancel refused: legs have progressed past pending",
                    })),
            )
            .await?;
            tx.commit().await?;

            return Err(AppError::InvalidTransition(format!(
                "Cannot cancel transaction {}: {} leg(s) have progressed past pending",
                transaction_id, non_pending
            )));
        }

        sqlx::query("UPDATE transactions SET cancelled = TRUE WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(Actor::User, AuditAction::Transaction)
                .sku(header.sku_id, &header.sku_name)
                .details(serde_json::json!({
                    "transaction_id": transaction_id,
                    "cancelled": true,
                })),
        )
        .await?;

        tx.commit().await?;

        self.get_transaction(transaction_id).await
    }

    /// Transactions whose expected delivery date has passed with at least
    /// one undelivered leg
    pub async fn find_due_deliveries(&self, today: NaiveDate) -> AppResult<Vec<DueDelivery>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, i64, NaiveDate, i64)>(
            r#"
            SELECT t.id, t.sku_id, t.sku_name, t.total_quantity, t.expected_delivery_date,
                   COUNT(l.*) AS undelivered
            FROM transactions t
            JOIN transaction_legs l ON l.transaction_id = t.id AND l.status <> 'delivered'
            WHERE t.expected_delivery_date IS NOT NULL
              AND t.expected_delivery_date <= $1
              AND NOT t.cancelled
            GROUP BY t.id, t.sku_id, t.sku_name, t.total_quantity, t.expected_delivery_date
            ORDER BY t.expected_delivery_date ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(transaction_id, sku_id, sku_name, total_quantity, expected, undelivered)| {
                    DueDelivery {
                        transaction_id,
                        sku_id,
                        sku_name,
                        total_quantity,
                        expected_delivery_date: expected,
                        undelivered_legs: undelivered,
                    }
                },
            )
            .collect())
    }

    /// Units on order for a SKU across open transactions
    ///
    /// Fed to the prediction service so it does not re-order quantities
    /// that are already on their way.
    pub async fn in_transit_units(&self, sku_id: Uuid) -> AppResult<i64> {
        let total = sqlx::query_scalar::<_, Option<i64>>(
            r#"
            SELECT SUM(l.quantity)
            FROM transactions t
            JOIN transaction_legs l ON l.transaction_id = t.id
            WHERE t.sku_id = $1 AND NOT t.cancelled AND l.status <> 'delivered'
            "#,
        )
        .bind(sku_id)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(0);

        Ok(total)
    }

    async fn load_legs(&self, transaction_id: Uuid) -> AppResult<Vec<VendorLeg>> {
        let rows = sqlx::query_as::<_, LegRow>(
            r#"
            SELECT transaction_id, vendor_name, quantity, unit_cost, status, delivered_at
            FROM transaction_legs
            WHERE transaction_id = $1
            ORDER BY leg_index
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LegRow::into_leg).collect()
    }

    /// Persist the audit record for a rejected non-delivery transition,
    /// then surface `InvalidTransition`
    async fn reject_transition(
        mut tx: DbTransaction<'_, Postgres>,
        header: &TransactionRow,
        leg_index: i32,
        reason: &str,
    ) -> AppResult<Transaction> {
        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(Actor::User, AuditAction::Transaction)
                .sku(header.sku_id, &header.sku_name)
                .details(serde_json::json!({
                    "transaction_id": header.id,
                    "leg_index": leg_index,
                    "rejected": true,
                    "reason": reason,
                })),
        )
        .await?;
        tx.commit().await?;

        Err(AppError::InvalidTransition(format!(
            "Cannot move leg {} of transaction {} to in_transit: {}",
            leg_index, header.id, reason
        )))
    }

    /// Persist the audit record for a rejected delivery attempt, then
    /// surface `InvalidTransition`. Rejections stay forensically visible.
    async fn reject_delivery(
        &self,
        mut tx: DbTransaction<'_, Postgres>,
        header: &TransactionRow,
        leg_index: i32,
        actor: Actor,
        reason: &str,
    ) -> AppResult<Transaction> {
        AuditService::append_on(
            &mut *tx,
            NewAuditEntry::new(actor, AuditAction::Delivery)
                .sku(header.sku_id, &header.sku_name)
                .details(serde_json::json!({
                    "transaction_id": header.id,
                    "leg_index": leg_index,
                    "rejected": true,
                    "reason": reason,
                })),
        )
        .await?;
        tx.commit().await?;

        Err(AppError::InvalidTransition(format!(
            "Cannot deliver leg {} of transaction {}: {}",
            leg_index, header.id, reason
        )))
    }
}
