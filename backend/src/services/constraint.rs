//! Constraint management and proposal evaluation glue
//!
//! Stores SKU-scoped and global constraints and feeds them, together with
//! the current month-to-date spend, into the pure evaluator in `shared`.
//! Month-to-date spend is always a fresh query over this month's
//! transactions, never an incrementally maintained counter.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use shared::{evaluate, Constraint, ConstraintKind, EvaluationOutcome, OrderProposal};

use crate::error::{AppError, AppResult};

/// Constraint management service
#[derive(Clone)]
pub struct ConstraintService {
    db: PgPool,
}

/// Input for creating a constraint
#[derive(Debug, Deserialize)]
pub struct CreateConstraintInput {
    pub kind: ConstraintKind,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, FromRow)]
struct ConstraintRow {
    id: Uuid,
    sku_id: Option<Uuid>,
    kind: String,
    value: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl ConstraintRow {
    fn into_constraint(self) -> AppResult<Constraint> {
        let kind = ConstraintKind::from_str(&self.kind).ok_or_else(|| {
            AppError::StorageError(format!("unknown constraint kind '{}'", self.kind))
        })?;
        Ok(Constraint {
            id: self.id,
            sku_id: self.sku_id,
            kind,
            value: self.value,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

impl ConstraintService {
    /// Create a new ConstraintService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add a SKU-scoped constraint
    pub async fn add_sku_constraint(
        &self,
        sku_id: Uuid,
        input: CreateConstraintInput,
    ) -> AppResult<Constraint> {
        if input.kind == ConstraintKind::MonthlyBudget {
            return Err(AppError::Validation {
                field: "kind".to_string(),
                message: "monthly_budget is a global constraint".to_string(),
            });
        }

        let sku_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM skus WHERE id = $1)")
                .bind(sku_id)
                .fetch_one(&self.db)
                .await?;

        if !sku_exists {
            return Err(AppError::NotFound("SKU".to_string()));
        }

        self.insert(Some(sku_id), input).await
    }

    /// Add a global constraint
    pub async fn add_global_constraint(
        &self,
        input: CreateConstraintInput,
    ) -> AppResult<Constraint> {
        self.insert(None, input).await
    }

    async fn insert(
        &self,
        sku_id: Option<Uuid>,
        input: CreateConstraintInput,
    ) -> AppResult<Constraint> {
        if input.value.trim().is_empty() {
            return Err(AppError::Validation {
                field: "value".to_string(),
                message: "Constraint value cannot be empty".to_string(),
            });
        }
        if input.kind.is_numeric() && Decimal::from_str(input.value.trim()).is_err() {
            return Err(AppError::Validation {
                field: "value".to_string(),
                message: format!(
                    "Value for a {} constraint must be numeric",
                    input.kind.as_str()
                ),
            });
        }

        let row = sqlx::query_as::<_, ConstraintRow>(
            r#"
            INSERT INTO constraints (sku_id, kind, value, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sku_id, kind, value, description, created_at
            "#,
        )
        .bind(sku_id)
        .bind(input.kind.as_str())
        .bind(input.value.trim())
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        row.into_constraint()
    }

    /// List constraints for a SKU
    pub async fn list_sku_constraints(&self, sku_id: Uuid) -> AppResult<Vec<Constraint>> {
        let rows = sqlx::query_as::<_, ConstraintRow>(
            r#"
            SELECT id, sku_id, kind, value, description, created_at
            FROM constraints
            WHERE sku_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(sku_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ConstraintRow::into_constraint).collect()
    }

    /// List global constraints
    pub async fn list_global_constraints(&self) -> AppResult<Vec<Constraint>> {
        let rows = sqlx::query_as::<_, ConstraintRow>(
            r#"
            SELECT id, sku_id, kind, value, description, created_at
            FROM constraints
            WHERE sku_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ConstraintRow::into_constraint).collect()
    }

    /// Delete a constraint
    pub async fn delete_constraint(&self, constraint_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM constraints WHERE id = $1")
            .bind(constraint_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Constraint".to_string()));
        }

        Ok(())
    }

    /// Total cost of non-cancelled transactions created this calendar month
    pub async fn month_to_date_spend(&self) -> AppResult<Decimal> {
        let now = Utc::now();
        let month_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::StorageError("invalid month start".to_string()))?;

        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT SUM(total_cost)
            FROM transactions
            WHERE created_at >= $1 AND NOT cancelled
            "#,
        )
        .bind(month_start)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        Ok(total)
    }

    /// Evaluate a proposal against the SKU's and the global constraints
    ///
    /// Pure evaluation happens in `shared`; this loads the inputs, logs any
    /// constraints skipped for malformed values, and leaves audit logging
    /// of rejections to the caller.
    pub async fn evaluate_proposal(&self, proposal: &OrderProposal) -> AppResult<EvaluationOutcome> {
        let sku_constraints = self.list_sku_constraints(proposal.sku_id).await?;
        let global_constraints = self.list_global_constraints().await?;
        let month_to_date = self.month_to_date_spend().await?;

        let outcome = evaluate(
            &sku_constraints,
            &global_constraints,
            proposal,
            month_to_date,
        );

        for warning in &outcome.skipped {
            tracing::warn!(sku_id = %proposal.sku_id, "Skipped malformed constraint: {}", warning);
        }

        Ok(outcome)
    }
}
