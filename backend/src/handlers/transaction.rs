//! HTTP handlers for transaction and delivery endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Actor, Transaction};

use crate::error::AppResult;
use crate::services::proposal::{ProposalInput, ProposalOutcome, ProposalService};
use crate::services::scheduler;
use crate::services::transaction::{DueDelivery, TransactionFilter, TransactionService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DeliverParams {
    #[serde(default)]
    pub actor: Option<Actor>,
}

/// Propose a transaction: evaluate constraints, allocate vendors, persist
///
/// A blocked proposal is a normal outcome and returns 200 with the
/// violation, not an error status.
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<ProposalInput>,
) -> AppResult<Json<ProposalOutcome>> {
    let service = ProposalService::new(state.db);
    let outcome = service.apply_proposal(input).await?;
    Ok(Json(outcome))
}

/// List transactions, newest first, optionally filtered by SKU and by
/// derived aggregate status
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<Vec<Transaction>>> {
    let service = TransactionService::new(state.db);
    let transactions = service.list_transactions(filter).await?;
    Ok(Json(transactions))
}

/// Get a single transaction
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<Transaction>> {
    let service = TransactionService::new(state.db);
    let transaction = service.get_transaction(transaction_id).await?;
    Ok(Json(transaction))
}

/// Mark one vendor leg as delivered
pub async fn mark_leg_delivered(
    State(state): State<AppState>,
    Path((transaction_id, leg_index)): Path<(Uuid, i32)>,
    Query(params): Query<DeliverParams>,
) -> AppResult<Json<Transaction>> {
    let service = TransactionService::new(state.db);
    let actor = params.actor.unwrap_or(Actor::User);
    let transaction = service
        .mark_leg_delivered(transaction_id, leg_index, actor)
        .await?;
    Ok(Json(transaction))
}

/// Mark one vendor leg as in transit
pub async fn mark_leg_in_transit(
    State(state): State<AppState>,
    Path((transaction_id, leg_index)): Path<(Uuid, i32)>,
) -> AppResult<Json<Transaction>> {
    let service = TransactionService::new(state.db);
    let transaction = service
        .mark_leg_in_transit(transaction_id, leg_index)
        .await?;
    Ok(Json(transaction))
}

/// Cancel a transaction (only while all legs are pending)
pub async fn cancel_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<Transaction>> {
    let service = TransactionService::new(state.db);
    let transaction = service.cancel_transaction(transaction_id).await?;
    Ok(Json(transaction))
}

/// List transactions with deliveries due
pub async fn list_due_deliveries(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<DueDelivery>>> {
    let service = TransactionService::new(state.db);
    let due = service
        .find_due_deliveries(chrono::Utc::now().date_naive())
        .await?;
    Ok(Json(due))
}

/// Run a reconciliation scan on demand
pub async fn run_reconciliation_scan(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<DueDelivery>>> {
    let due = scheduler::scan(&state.db).await?;
    Ok(Json(due))
}
