//! Reconciliation scheduler
//!
//! A single timer-driven task owned by the service process. Each tick
//! scans for transactions whose expected delivery date has passed with
//! undelivered legs and surfaces them; it never marks anything delivered,
//! because delivery confirmation is always an explicit act. The tick also
//! refreshes the month-to-date spend figure the constraint evaluator
//! reads. Scans are read-only, so running twice in succession changes no
//! state and writes no duplicate audit entries.

use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::AppResult;
use crate::services::constraint::ConstraintService;
use crate::services::transaction::{DueDelivery, TransactionService};

/// Reconciliation scheduler
pub struct ReconciliationScheduler {
    db: PgPool,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ReconciliationScheduler {
    pub fn new(db: PgPool, interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            db,
            interval,
            shutdown,
        }
    }

    /// Run the timer loop until shutdown is signalled
    ///
    /// Scan failures are logged and the ticker continues; the scheduler
    /// never crashes the service.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(interval_secs = self.interval.as_secs(), "Reconciliation scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = scan(&self.db).await {
                        tracing::error!("Reconciliation scan failed: {}", e);
                    }
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        tracing::info!("Reconciliation scheduler stopping");
                        break;
                    }
                }
            }
        }
    }
}

/// One reconciliation scan: surface due deliveries and refresh the
/// month-to-date spend figure
///
/// Also serves the on-demand scan endpoint.
pub async fn scan(db: &PgPool) -> AppResult<Vec<DueDelivery>> {
    let transaction_service = TransactionService::new(db.clone());
    let today = Utc::now().date_naive();

    let due = transaction_service.find_due_deliveries(today).await?;
    for delivery in &due {
        tracing::info!(
            transaction_id = %delivery.transaction_id,
            sku = %delivery.sku_name,
            expected = %delivery.expected_delivery_date,
            undelivered_legs = delivery.undelivered_legs,
            "Delivery due, awaiting explicit confirmation"
        );
    }

    let constraint_service = ConstraintService::new(db.clone());
    let spend = constraint_service.month_to_date_spend().await?;
    tracing::debug!(month_to_date_spend = %spend, due_deliveries = due.len(), "Reconciliation scan complete");

    Ok(due)
}
