//! Aggregate dashboard statistics

use rust_decimal::Decimal;
use sqlx::PgPool;

use shared::InventoryStats;

use crate::error::AppResult;

/// Statistics service
#[derive(Clone)]
pub struct StatsService {
    db: PgPool,
}

impl StatsService {
    /// Create a new StatsService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// SKU count, total on-hand units, vendor offer count and average
    /// vendor unit cost
    pub async fn get_stats(&self) -> AppResult<InventoryStats> {
        let (total_skus, total_units) = sqlx::query_as::<_, (i64, Option<i64>)>(
            "SELECT COUNT(*), SUM(on_hand_units) FROM skus",
        )
        .fetch_one(&self.db)
        .await?;

        let (total_vendors, avg_unit_cost) = sqlx::query_as::<_, (i64, Option<Decimal>)>(
            "SELECT COUNT(*), AVG(unit_cost) FROM vendor_offers",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(InventoryStats {
            total_skus,
            total_units: total_units.unwrap_or(0),
            total_vendors,
            avg_unit_cost: avg_unit_cost.unwrap_or(Decimal::ZERO).round_dp(2),
        })
    }
}
