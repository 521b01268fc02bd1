//! HTTP handlers for SKU and vendor offer endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::{Sku, VendorOffer};

use crate::error::AppResult;
use crate::services::sku::{CreateSkuInput, CreateVendorOfferInput, SkuService, UpdateSkuInput};
use crate::AppState;

/// Create a SKU with its initial units and vendor offers
pub async fn create_sku(
    State(state): State<AppState>,
    Json(input): Json<CreateSkuInput>,
) -> AppResult<Json<Sku>> {
    let service = SkuService::new(state.db);
    let sku = service.create_sku(input).await?;
    Ok(Json(sku))
}

/// List all SKUs
pub async fn list_skus(State(state): State<AppState>) -> AppResult<Json<Vec<Sku>>> {
    let service = SkuService::new(state.db);
    let skus = service.list_skus().await?;
    Ok(Json(skus))
}

/// Get a single SKU
pub async fn get_sku(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
) -> AppResult<Json<Sku>> {
    let service = SkuService::new(state.db);
    let sku = service.get_sku(sku_id).await?;
    Ok(Json(sku))
}

/// Update a SKU's name and/or on-hand units
pub async fn update_sku(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
    Json(input): Json<UpdateSkuInput>,
) -> AppResult<Json<Sku>> {
    let service = SkuService::new(state.db);
    let sku = service.update_sku(sku_id, input).await?;
    Ok(Json(sku))
}

/// Delete a SKU and its vendors and constraints
pub async fn delete_sku(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = SkuService::new(state.db);
    service.delete_sku(sku_id).await?;
    Ok(Json(()))
}

/// Add a vendor offer for a SKU
pub async fn add_vendor_offer(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
    Json(input): Json<CreateVendorOfferInput>,
) -> AppResult<Json<VendorOffer>> {
    let service = SkuService::new(state.db);
    let offer = service.add_vendor_offer(sku_id, input).await?;
    Ok(Json(offer))
}

/// List vendor offers for a SKU
pub async fn list_vendor_offers(
    State(state): State<AppState>,
    Path(sku_id): Path<Uuid>,
) -> AppResult<Json<Vec<VendorOffer>>> {
    let service = SkuService::new(state.db);
    let offers = service.list_vendor_offers(sku_id).await?;
    Ok(Json(offers))
}
