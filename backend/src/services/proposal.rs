//! Proposal application: evaluate, allocate, persist
//!
//! The entry point for both human-entered orders and the predictions the
//! external forecasting service produces. A rejected proposal is a normal
//! outcome, not an error: it is audited as a `constraint_violation` and
//! returned as a blocked result the caller can branch on.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    plan, Actor, AuditAction, ConstraintKind, OrderProposal, PlannedLeg, Sku, Transaction,
    Verdict,
};

use crate::error::{AppError, AppResult};
use crate::external::prediction::{PredictionClient, PredictionRequest};
use crate::services::audit::{AuditService, NewAuditEntry};
use crate::services::constraint::ConstraintService;
use crate::services::ledger::InventoryLedger;
use crate::services::sku::SkuService;
use crate::services::transaction::{CreateTransactionInput, NewLegInput, TransactionService};

/// Proposal application service
#[derive(Clone)]
pub struct ProposalService {
    db: PgPool,
}

/// A proposed replenishment order
#[derive(Debug, Deserialize)]
pub struct ProposalInput {
    pub sku_id: Uuid,
    pub quantity: i64,
    /// Desired per-vendor quantities; omitted means "best single vendor"
    pub vendor_split: Option<Vec<SplitEntry>>,
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub actor: Option<Actor>,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitEntry {
    pub vendor: String,
    pub quantity: i64,
}

/// Outcome of applying a proposal
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProposalOutcome {
    Created {
        transaction: Transaction,
    },
    Blocked {
        constraint: String,
        explanation: String,
    },
}

/// Per-SKU result of a prediction sweep
#[derive(Debug, Serialize)]
pub struct PredictionRunResult {
    pub sku_id: Uuid,
    pub sku_name: String,
    pub outcome: Option<ProposalOutcome>,
    pub reasoning: Option<String>,
    pub error: Option<String>,
}

impl ProposalService {
    /// Create a new ProposalService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Evaluate and, if accepted, persist a proposal as a transaction
    pub async fn apply_proposal(&self, input: ProposalInput) -> AppResult<ProposalOutcome> {
        shared::validate_order_quantity(input.quantity)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let sku_service = SkuService::new(self.db.clone());
        let sku = sku_service.get_sku(input.sku_id).await?;

        let offers = sku_service.list_vendor_offers(input.sku_id).await?;
        let split: Option<Vec<(String, i64)>> = input.vendor_split.as_ref().map(|entries| {
            entries
                .iter()
                .map(|e| (e.vendor.clone(), e.quantity))
                .collect()
        });

        let planned = plan(input.quantity, &offers, split.as_deref())?;

        let total_cost: Decimal = planned
            .iter()
            .map(|l| l.unit_cost * Decimal::from(l.quantity))
            .sum();
        let vendor_names: Vec<String> = planned.iter().map(|l| l.vendor_name.clone()).collect();
        let actor = input.actor.unwrap_or(Actor::User);

        let constraint_service = ConstraintService::new(self.db.clone());
        let proposal = OrderProposal {
            sku_id: input.sku_id,
            quantity: input.quantity,
            total_cost,
            vendor_names: vendor_names.clone(),
        };
        let evaluation = constraint_service.evaluate_proposal(&proposal).await?;

        if let Verdict::Rejected { kind, explanation } = evaluation.verdict {
            let audit = AuditService::new(self.db.clone());
            audit
                .append(
                    NewAuditEntry::new(actor, AuditAction::ConstraintViolation)
                        .sku(sku.id, &sku.name)
                        .details(serde_json::json!({
                            "predicted_amount": input.quantity,
                            "total_cost": total_cost,
                            "violation": explanation,
                            "vendors": vendor_names,
                        })),
                )
                .await?;

            return Ok(ProposalOutcome::Blocked {
                constraint: kind.as_str().to_string(),
                explanation,
            });
        }

        let expected = input
            .expected_delivery_date
            .or_else(|| expected_delivery_date(&planned));

        let transaction_service = TransactionService::new(self.db.clone());
        let transaction = transaction_service
            .create_transaction(CreateTransactionInput {
                sku_id: input.sku_id,
                legs: planned
                    .iter()
                    .map(|l| NewLegInput {
                        vendor_name: l.vendor_name.clone(),
                        quantity: l.quantity,
                        unit_cost: l.unit_cost,
                    })
                    .collect(),
                total_quantity: Some(input.quantity),
                total_cost: Some(total_cost),
                expected_delivery_date: expected,
                actor: Some(actor),
            })
            .await?;

        if actor == Actor::Ai {
            let audit = AuditService::new(self.db.clone());
            audit
                .append(
                    NewAuditEntry::new(Actor::Ai, AuditAction::Prediction)
                        .sku(sku.id, &sku.name)
                        .details(serde_json::json!({
                            "transaction_id": transaction.id,
                            "amount": input.quantity,
                            "total_cost": total_cost,
                            "reasoning": input.reasoning,
                            "vendors": vendor_names,
                            "confidence": input.confidence,
                        })),
                )
                .await?;
        }

        Ok(ProposalOutcome::Created { transaction })
    }

    /// Run the external predictor over every SKU and apply its proposals
    ///
    /// Failures for individual SKUs are recorded in the result and do not
    /// abort the sweep.
    pub async fn run_predictions(
        &self,
        client: &PredictionClient,
    ) -> AppResult<Vec<PredictionRunResult>> {
        let sku_service = SkuService::new(self.db.clone());
        let constraint_service = ConstraintService::new(self.db.clone());
        let transaction_service = TransactionService::new(self.db.clone());

        let remaining_budget = self.remaining_monthly_budget(&constraint_service).await?;
        let skus = sku_service.list_skus().await?;

        let mut results = Vec::with_capacity(skus.len());
        for sku in skus {
            let result = self
                .predict_one(
                    client,
                    &sku_service,
                    &constraint_service,
                    &transaction_service,
                    &sku,
                    remaining_budget,
                )
                .await;

            match result {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(sku_id = %sku.id, "Prediction failed: {}", e);
                    results.push(PredictionRunResult {
                        sku_id: sku.id,
                        sku_name: sku.name.clone(),
                        outcome: None,
                        reasoning: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(results)
    }

    async fn predict_one(
        &self,
        client: &PredictionClient,
        sku_service: &SkuService,
        constraint_service: &ConstraintService,
        transaction_service: &TransactionService,
        sku: &Sku,
        remaining_budget: Option<Decimal>,
    ) -> AppResult<PredictionRunResult> {
        let offers = sku_service.list_vendor_offers(sku.id).await?;
        let constraints = constraint_service.list_sku_constraints(sku.id).await?;
        let in_transit = transaction_service.in_transit_units(sku.id).await?;

        // The sweep's SKU snapshot may be stale by now; re-read the units
        let ledger = InventoryLedger::new(self.db.clone());
        let current_units = ledger.current_units(sku.id).await?;

        let response = client
            .predict(&PredictionRequest {
                sku_id: sku.id,
                sku_name: sku.name.clone(),
                current_units,
                in_transit_units: in_transit,
                vendors: offers,
                constraints,
                remaining_budget,
            })
            .await?;

        let Some(amount) = response.amount.filter(|a| *a > 0) else {
            // Predictor sees no need to order
            return Ok(PredictionRunResult {
                sku_id: sku.id,
                sku_name: sku.name.clone(),
                outcome: None,
                reasoning: response.reasoning,
                error: None,
            });
        };

        let vendor_split = if response.vendors.is_empty() {
            None
        } else {
            Some(
                response
                    .vendors
                    .iter()
                    .zip(response.quantities.iter())
                    .map(|(vendor, quantity)| SplitEntry {
                        vendor: vendor.clone(),
                        quantity: *quantity,
                    })
                    .collect(),
            )
        };

        let outcome = self
            .apply_proposal(ProposalInput {
                sku_id: sku.id,
                quantity: amount,
                vendor_split,
                expected_delivery_date: None,
                actor: Some(Actor::Ai),
                reasoning: response.reasoning.clone(),
                confidence: response.confidence,
            })
            .await?;

        Ok(PredictionRunResult {
            sku_id: sku.id,
            sku_name: sku.name.clone(),
            outcome: Some(outcome),
            reasoning: response.reasoning,
            error: None,
        })
    }

    /// Remaining global monthly budget, if one is configured
    async fn remaining_monthly_budget(
        &self,
        constraint_service: &ConstraintService,
    ) -> AppResult<Option<Decimal>> {
        let globals = constraint_service.list_global_constraints().await?;
        let budget = globals
            .iter()
            .filter(|c| c.kind == ConstraintKind::MonthlyBudget)
            .find_map(|c| Decimal::from_str(c.value.trim()).ok());

        let Some(budget) = budget else {
            return Ok(None);
        };

        let spent = constraint_service.month_to_date_spend().await?;
        Ok(Some((budget - spent).max(Decimal::ZERO)))
    }
}

/// Expected delivery date: today plus the slowest chosen vendor's lead time
fn expected_delivery_date(legs: &[PlannedLeg]) -> Option<NaiveDate> {
    let max_lead = legs.iter().map(|l| l.lead_time_days).max()?;
    Some(Utc::now().date_naive() + Duration::days(i64::from(max_lead)))
}
