//! Prediction service client
//!
//! The forecasting model is an external collaborator: it receives a SKU's
//! stock position, vendor offers, constraints and remaining budget, and
//! returns a recommended order quantity with a candidate vendor split.
//! The engine treats it as a black box; all calls carry a bounded timeout
//! and transport failures surface as retryable storage errors.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use shared::{Constraint, VendorOffer};

use crate::error::{AppError, AppResult};

/// Prediction API client
#[derive(Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

/// Request payload for a single-SKU prediction
#[derive(Debug, Serialize)]
pub struct PredictionRequest {
    pub sku_id: Uuid,
    pub sku_name: String,
    pub current_units: i64,
    /// Units already on order, so the predictor does not double-order
    pub in_transit_units: i64,
    pub vendors: Vec<VendorOffer>,
    pub constraints: Vec<Constraint>,
    pub remaining_budget: Option<Decimal>,
}

/// Prediction service response
#[derive(Debug, Deserialize)]
pub struct PredictionResponse {
    pub sku_id: Uuid,
    /// Recommended order quantity; absent or zero means "do not order"
    pub amount: Option<i64>,
    #[serde(default)]
    pub vendors: Vec<String>,
    #[serde(default)]
    pub quantities: Vec<i64>,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
}

impl PredictionClient {
    /// Create a new prediction client with a bounded request timeout
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::StorageError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Request a purchase prediction for one SKU
    pub async fn predict(&self, request: &PredictionRequest) -> AppResult<PredictionResponse> {
        let url = format!("{}/predict", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("prediction service unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::StorageError(format!(
                "prediction service returned {}",
                response.status()
            )));
        }

        let prediction = response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| AppError::StorageError(format!("invalid prediction response: {}", e)))?;

        if prediction.sku_id != request.sku_id {
            return Err(AppError::StorageError(format!(
                "prediction response is for SKU {} but {} was requested",
                prediction.sku_id, request.sku_id
            )));
        }

        Ok(prediction)
    }
}
