//! Vendor allocation planning
//!
//! Splits an approved order quantity across vendor offers, producing the
//! leg list that the transaction store persists. Offers that cannot meet
//! their minimum order quantity within the requested split are excluded
//! and their quantity redistributed.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::VendorOffer;

/// No feasible vendor split exists for the requested quantity
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no vendor offers available for this SKU")]
    NoOffers,

    #[error("split references vendor '{0}' which has no offer for this SKU")]
    UnknownVendor(String),

    #[error("split quantities sum to {actual} but requested quantity is {requested}")]
    SplitMismatch { requested: i64, actual: i64 },

    #[error(
        "no combination of offers can satisfy quantity {0} without violating a minimum order"
    )]
    Infeasible(i64),

    #[error("requested quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
}

/// One planned vendor leg, with cost and lead time snapshotted from the
/// offer it was allocated against
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLeg {
    pub vendor_name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub lead_time_days: i32,
}

/// Allocate `quantity` units across the given offers
///
/// When `requested_split` is provided (the predictor's or caller's desired
/// per-vendor quantities) it is normalized: zero entries dropped, offers
/// unable to meet their minimum within their assigned share excluded and
/// the remainder redistributed to the best surviving leg. Without a split
/// the whole quantity goes to the best eligible offer. "Best" means lowest
/// unit cost, then shortest lead time, then lexical name order.
pub fn plan(
    quantity: i64,
    offers: &[VendorOffer],
    requested_split: Option<&[(String, i64)]>,
) -> Result<Vec<PlannedLeg>, AllocationError> {
    if quantity <= 0 {
        return Err(AllocationError::NonPositiveQuantity(quantity));
    }
    if offers.is_empty() {
        return Err(AllocationError::NoOffers);
    }

    let mut ranked: Vec<&VendorOffer> = offers.iter().collect();
    ranked.sort_by(|a, b| {
        a.unit_cost
            .cmp(&b.unit_cost)
            .then(a.lead_time_days.cmp(&b.lead_time_days))
            .then(a.name.cmp(&b.name))
    });

    match requested_split {
        Some(split) => plan_from_split(quantity, &ranked, split),
        None => single_best(quantity, &ranked),
    }
}

/// Place the whole quantity on the best-ranked offer whose minimum order
/// (if any) fits
fn single_best(
    quantity: i64,
    ranked: &[&VendorOffer],
) -> Result<Vec<PlannedLeg>, AllocationError> {
    let offer = ranked
        .iter()
        .find(|o| o.min_order_quantity.map_or(true, |min| quantity >= min))
        .ok_or(AllocationError::Infeasible(quantity))?;

    Ok(vec![PlannedLeg {
        vendor_name: offer.name.clone(),
        quantity,
        unit_cost: offer.unit_cost,
        lead_time_days: offer.lead_time_days,
    }])
}

fn plan_from_split(
    quantity: i64,
    ranked: &[&VendorOffer],
    split: &[(String, i64)],
) -> Result<Vec<PlannedLeg>, AllocationError> {
    // Resolve each split entry to its offer, dropping non-positive shares
    let mut legs: Vec<(&VendorOffer, i64)> = Vec::new();
    for (name, qty) in split {
        if *qty <= 0 {
            continue;
        }
        let offer = ranked
            .iter()
            .find(|o| &o.name == name)
            .ok_or_else(|| AllocationError::UnknownVendor(name.clone()))?;
        legs.push((offer, *qty));
    }

    let actual: i64 = legs.iter().map(|(_, q)| q).sum();
    if actual != quantity {
        return Err(AllocationError::SplitMismatch {
            requested: quantity,
            actual,
        });
    }

    // Exclude offers that cannot meet their minimum within their share and
    // hand the freed quantity to the best surviving leg. Survivors already
    // satisfy their minimums, so adding quantity keeps them valid.
    loop {
        let violating = legs
            .iter()
            .position(|(o, q)| o.min_order_quantity.map_or(false, |min| *q < min));
        let Some(idx) = violating else { break };

        let (_, freed) = legs.remove(idx);
        if legs.is_empty() {
            // Nothing left to absorb the quantity; fall back to the best
            // single offer that can take it all.
            return single_best(quantity, ranked);
        }

        let best = best_leg_index(&legs, ranked);
        legs[best].1 += freed;
    }

    Ok(legs
        .into_iter()
        .map(|(offer, qty)| PlannedLeg {
            vendor_name: offer.name.clone(),
            quantity: qty,
            unit_cost: offer.unit_cost,
            lead_time_days: offer.lead_time_days,
        })
        .collect())
}

/// Index into `legs` of the leg whose offer ranks best
fn best_leg_index(legs: &[(&VendorOffer, i64)], ranked: &[&VendorOffer]) -> usize {
    let mut best = 0;
    let mut best_rank = usize::MAX;
    for (i, (offer, _)) in legs.iter().enumerate() {
        let rank = ranked
            .iter()
            .position(|o| o.id == offer.id)
            .unwrap_or(usize::MAX);
        if rank < best_rank {
            best_rank = rank;
            best = i;
        }
    }
    best
}
