//! Vendor allocation planner tests
//!
//! Covers best-offer ranking, minimum order handling, requested-split
//! normalization and redistribution, and the error cases.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{plan, AllocationError, VendorOffer};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn offer(name: &str, unit_cost: &str, lead_time_days: i32, min: Option<i64>) -> VendorOffer {
    VendorOffer {
        id: Uuid::new_v4(),
        sku_id: Uuid::new_v4(),
        name: name.to_string(),
        unit_cost: dec(unit_cost),
        lead_time_days,
        min_order_quantity: min,
        created_at: Utc::now(),
    }
}

fn split(entries: &[(&str, i64)]) -> Vec<(String, i64)> {
    entries
        .iter()
        .map(|(name, qty)| (name.to_string(), *qty))
        .collect()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Without a split the whole quantity goes to the cheapest offer
    #[test]
    fn test_single_best_picks_cheapest() {
        let offers = vec![
            offer("Acme", "5.00", 3, None),
            offer("Globex", "4.00", 7, None),
        ];

        let legs = plan(20, &offers, None).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].vendor_name, "Globex");
        assert_eq!(legs[0].quantity, 20);
        assert_eq!(legs[0].unit_cost, dec("4.00"));
    }

    /// A cheaper offer whose minimum exceeds the quantity is passed over
    /// for the next best offer
    #[test]
    fn test_minimum_excludes_cheapest() {
        // A is $5/unit with min 10; B is $4/unit with no min. For 5 units
        // only B is eligible.
        let offers = vec![
            offer("A", "5.00", 2, Some(10)),
            offer("B", "4.00", 5, None),
        ];

        let legs = plan(5, &offers, None).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].vendor_name, "B");
        assert_eq!(legs[0].quantity, 5);
    }

    /// Equal cost ties break on lead time, then name
    #[test]
    fn test_tie_breaks_on_lead_time_then_name() {
        let offers = vec![
            offer("Zeta", "4.00", 3, None),
            offer("Alpha", "4.00", 3, None),
            offer("Mid", "4.00", 5, None),
        ];

        let legs = plan(10, &offers, None).unwrap();
        assert_eq!(legs[0].vendor_name, "Alpha");
    }

    /// A requested split is honored when every leg meets its minimum
    #[test]
    fn test_split_honored() {
        let offers = vec![
            offer("A", "5.00", 2, None),
            offer("B", "4.00", 5, None),
        ];

        let legs = plan(30, &offers, Some(&split(&[("A", 10), ("B", 20)]))).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs.iter().map(|l| l.quantity).sum::<i64>(), 30);
    }

    /// A split leg below its offer's minimum is dropped and its quantity
    /// moved to the best surviving leg
    #[test]
    fn test_split_redistributes_min_violation() {
        let offers = vec![
            offer("A", "5.00", 2, Some(10)),
            offer("B", "4.00", 5, None),
        ];

        // A's share of 3 violates its minimum of 10
        let legs = plan(5, &offers, Some(&split(&[("A", 3), ("B", 2)]))).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].vendor_name, "B");
        assert_eq!(legs[0].quantity, 5);
    }

    /// Freed quantity lands on the best surviving leg and keeps it valid
    #[test]
    fn test_split_redistribution_respects_survivor_minimum() {
        let offers = vec![
            offer("A", "5.00", 2, Some(10)),
            offer("B", "4.00", 5, Some(20)),
        ];

        let legs = plan(25, &offers, Some(&split(&[("A", 5), ("B", 20)]))).unwrap();
        // B's share of 20 meets its min; A's 5 is redistributed onto B
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].vendor_name, "B");
        assert_eq!(legs[0].quantity, 25);
    }

    /// When redistribution empties the split entirely the planner falls
    /// back to the best single offer that fits the full quantity
    #[test]
    fn test_split_falls_back_to_single_best() {
        let offers = vec![
            offer("A", "5.00", 2, Some(10)),
            offer("B", "4.00", 5, Some(20)),
        ];

        // A's 4 violates min 10; redistributed B has 10 < min 20; both
        // dropped, so the whole 10 goes to A (the only offer whose min fits)
        let legs = plan(10, &offers, Some(&split(&[("A", 4), ("B", 6)]))).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].vendor_name, "A");
        assert_eq!(legs[0].quantity, 10);
    }

    /// Zero and negative split entries are dropped before validation
    #[test]
    fn test_split_drops_non_positive_entries() {
        let offers = vec![
            offer("A", "5.00", 2, None),
            offer("B", "4.00", 5, None),
        ];

        let legs = plan(10, &offers, Some(&split(&[("A", 10), ("B", 0)]))).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].vendor_name, "A");
    }

    #[test]
    fn test_no_offers_error() {
        assert_eq!(plan(10, &[], None), Err(AllocationError::NoOffers));
    }

    #[test]
    fn test_non_positive_quantity_error() {
        let offers = vec![offer("A", "5.00", 2, None)];
        assert_eq!(
            plan(0, &offers, None),
            Err(AllocationError::NonPositiveQuantity(0))
        );
        assert_eq!(
            plan(-4, &offers, None),
            Err(AllocationError::NonPositiveQuantity(-4))
        );
    }

    #[test]
    fn test_unknown_vendor_error() {
        let offers = vec![offer("A", "5.00", 2, None)];
        assert_eq!(
            plan(10, &offers, Some(&split(&[("Ghost", 10)]))),
            Err(AllocationError::UnknownVendor("Ghost".to_string()))
        );
    }

    #[test]
    fn test_split_mismatch_error() {
        let offers = vec![
            offer("A", "5.00", 2, None),
            offer("B", "4.00", 5, None),
        ];
        assert_eq!(
            plan(10, &offers, Some(&split(&[("A", 3), ("B", 3)]))),
            Err(AllocationError::SplitMismatch {
                requested: 10,
                actual: 6
            })
        );
    }

    /// Quantity below every offer's minimum is infeasible
    #[test]
    fn test_infeasible_quantity() {
        let offers = vec![
            offer("A", "5.00", 2, Some(10)),
            offer("B", "4.00", 5, Some(20)),
        ];
        assert_eq!(plan(5, &offers, None), Err(AllocationError::Infeasible(5)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Every successful plan conserves quantity exactly
    #[test]
    fn prop_plan_conserves_quantity(
        quantity in 1i64..10_000,
        cost_cents in 1u32..100_000,
        lead in 0i32..60,
    ) {
        let offers = vec![VendorOffer {
            id: Uuid::new_v4(),
            sku_id: Uuid::new_v4(),
            name: "Solo".to_string(),
            unit_cost: Decimal::new(cost_cents as i64, 2),
            lead_time_days: lead,
            min_order_quantity: None,
            created_at: Utc::now(),
        }];

        let legs = plan(quantity, &offers, None).unwrap();
        prop_assert_eq!(legs.iter().map(|l| l.quantity).sum::<i64>(), quantity);
    }

    /// With two unrestricted offers, the planner never picks the more
    /// expensive one
    #[test]
    fn prop_single_best_is_cheapest(
        quantity in 1i64..1_000,
        cheap in 1u32..5_000,
        markup in 1u32..5_000,
    ) {
        let offers = vec![
            offer_with_cost("Pricey", Decimal::new((cheap + markup) as i64, 2)),
            offer_with_cost("Cheap", Decimal::new(cheap as i64, 2)),
        ];

        let legs = plan(quantity, &offers, None).unwrap();
        prop_assert_eq!(&legs[0].vendor_name, "Cheap");
    }
}

fn offer_with_cost(name: &str, unit_cost: Decimal) -> VendorOffer {
    VendorOffer {
        id: Uuid::new_v4(),
        sku_id: Uuid::new_v4(),
        name: name.to_string(),
        unit_cost,
        lead_time_days: 3,
        min_order_quantity: None,
        created_at: Utc::now(),
    }
}
