//! HTTP handler for aggregate statistics

use axum::{extract::State, Json};

use shared::InventoryStats;

use crate::error::AppResult;
use crate::services::stats::StatsService;
use crate::AppState;

/// Get dashboard statistics
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<InventoryStats>> {
    let service = StatsService::new(state.db);
    let stats = service.get_stats().await?;
    Ok(Json(stats))
}
