//! HTTP handler for running the prediction sweep

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::proposal::{PredictionRunResult, ProposalService};
use crate::AppState;

#[derive(Serialize)]
pub struct PredictionSweepResponse {
    pub predictions: Vec<PredictionRunResult>,
}

/// Run the external predictor over all SKUs and apply its proposals
pub async fn run_predictions(
    State(state): State<AppState>,
) -> AppResult<Json<PredictionSweepResponse>> {
    let service = ProposalService::new(state.db.clone());
    let predictions = service.run_predictions(&state.prediction).await?;
    Ok(Json(PredictionSweepResponse { predictions }))
}
