//! Route definitions for the Restock replenishment service

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // SKU and vendor management
        .nest("/skus", sku_routes())
        // Constraints
        .route(
            "/constraints/global",
            get(handlers::list_global_constraints).post(handlers::add_global_constraint),
        )
        .route("/constraints/:constraint_id", delete(handlers::delete_constraint))
        // Transactions and deliveries
        .nest("/transactions", transaction_routes())
        .route("/deliveries/due", get(handlers::list_due_deliveries))
        .route("/reconciliation/scan", post(handlers::run_reconciliation_scan))
        // Prediction sweep
        .route("/predictions", post(handlers::run_predictions))
        // Audit log
        .route("/logs", get(handlers::list_logs).post(handlers::create_log))
        // Dashboard statistics
        .route("/stats", get(handlers::get_stats))
}

/// SKU management routes
fn sku_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_skus).post(handlers::create_sku))
        .route(
            "/:sku_id",
            get(handlers::get_sku)
                .put(handlers::update_sku)
                .delete(handlers::delete_sku),
        )
        .route(
            "/:sku_id/vendors",
            get(handlers::list_vendor_offers).post(handlers::add_vendor_offer),
        )
        .route(
            "/:sku_id/constraints",
            get(handlers::list_sku_constraints).post(handlers::add_sku_constraint),
        )
}

/// Transaction routes
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/:transaction_id", get(handlers::get_transaction))
        .route("/:transaction_id/cancel", post(handlers::cancel_transaction))
        .route(
            "/:transaction_id/legs/:leg_index/deliver",
            post(handlers::mark_leg_delivered),
        )
        .route(
            "/:transaction_id/legs/:leg_index/in-transit",
            post(handlers::mark_leg_in_transit),
        )
}
