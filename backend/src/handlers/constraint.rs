//! HTTP handlers for constraint endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::Constraint;

use crate::error::AppResult;
use crate::services::constraint::{ConstraintService, CreateConstraintInput};
use crate::AppState;

/// Global constraints plus current monthly spending for context
#[derive(Serialize)]
pub struct GlobalConstraintsResponse {
    pub constraints: Vec<Constraint>,
    pub monthly_spending: Decimal,
}

/// Add a constraint to a SKU
pub async fn add_sku_constraint(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
    Json(input): Json<CreateConstraintInput>,
) -> AppResult<Json<Constraint>> {
    let service = ConstraintService::new(state.db);
    let constraint = service.add_sku_constraint(sku_id, input).await?;
    Ok(Json(constraint))
}

/// List constraints for a SKU
pub async fn list_sku_constraints(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
) -> AppResult<Json<Vec<Constraint>>> {
    let service = ConstraintService::new(state.db);
    let constraints = service.list_sku_constraints(sku_id).await?;
    Ok(Json(constraints))
}

/// Add a global constraint
pub async fn add_global_constraint(
    State(state): State<AppState>,
    Json(input): Json<CreateConstraintInput>,
) -> AppResult<Json<Constraint>> {
    let service = ConstraintService::new(state.db);
    let constraint = service.add_global_constraint(input).await?;
    Ok(Json(constraint))
}

/// List global constraints with current month-to-date spending
pub async fn list_global_constraints(
    State(state): State<AppState>,
) -> AppResult<Json<GlobalConstraintsResponse>> {
    let service = ConstraintService::new(state.db);
    let constraints = service.list_global_constraints().await?;
    let monthly_spending = service.month_to_date_spend().await?;
    Ok(Json(GlobalConstraintsResponse {
        constraints,
        monthly_spending,
    }))
}

/// Delete a constraint
pub async fn delete_constraint(
    State(state): State<AppState>,
    Path(constraint_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ConstraintService::new(state.db);
    service.delete_constraint(constraint_id).await?;
    Ok(Json(()))
}
