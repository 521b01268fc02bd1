//! Transaction model and delivery state machine tests
//!
//! Covers the leg transition rules, aggregate status derivation, the
//! leg-sum invariants, and a full delivery walkthrough at the model level.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{derive_status, validate_legs, LegStatus, TransactionStatus, VendorLeg};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn leg(vendor: &str, quantity: i64, unit_cost: &str, status: LegStatus) -> VendorLeg {
    VendorLeg {
        vendor_name: vendor.to_string(),
        quantity,
        unit_cost: dec(unit_cost),
        status,
        delivered_at: None,
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// pending -> in_transit and pending -> delivered are both legal
    #[test]
    fn test_pending_transitions() {
        assert!(LegStatus::Pending.can_transition(LegStatus::InTransit));
        assert!(LegStatus::Pending.can_transition(LegStatus::Delivered));
        assert!(!LegStatus::Pending.can_transition(LegStatus::Pending));
    }

    /// in_transit can only move to delivered
    #[test]
    fn test_in_transit_transitions() {
        assert!(LegStatus::InTransit.can_transition(LegStatus::Delivered));
        assert!(!LegStatus::InTransit.can_transition(LegStatus::Pending));
        assert!(!LegStatus::InTransit.can_transition(LegStatus::InTransit));
    }

    /// delivered is terminal: no transition out, ever
    #[test]
    fn test_delivered_is_terminal() {
        assert!(LegStatus::Delivered.is_terminal());
        assert!(!LegStatus::Delivered.can_transition(LegStatus::Pending));
        assert!(!LegStatus::Delivered.can_transition(LegStatus::InTransit));
        assert!(!LegStatus::Delivered.can_transition(LegStatus::Delivered));
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [LegStatus::Pending, LegStatus::InTransit, LegStatus::Delivered] {
            assert_eq!(LegStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(LegStatus::from_str("shipped"), None);
    }

    /// cancelled overrides every leg state
    #[test]
    fn test_derive_status_cancelled_wins() {
        let legs = vec![leg("A", 10, "4.00", LegStatus::Delivered)];
        assert_eq!(derive_status(true, &legs), TransactionStatus::Cancelled);
        assert_eq!(derive_status(true, &[]), TransactionStatus::Cancelled);
    }

    #[test]
    fn test_derive_status_all_pending() {
        let legs = vec![
            leg("A", 10, "4.00", LegStatus::Pending),
            leg("B", 5, "5.00", LegStatus::Pending),
        ];
        assert_eq!(derive_status(false, &legs), TransactionStatus::Pending);
    }

    #[test]
    fn test_derive_status_in_transit() {
        let legs = vec![
            leg("A", 10, "4.00", LegStatus::Pending),
            leg("B", 5, "5.00", LegStatus::InTransit),
        ];
        assert_eq!(derive_status(false, &legs), TransactionStatus::InTransit);
    }

    /// Any delivered leg among undelivered ones means partially_delivered,
    /// even if the rest are still pending
    #[test]
    fn test_derive_status_partially_delivered() {
        let legs = vec![
            leg("A", 10, "4.00", LegStatus::Delivered),
            leg("B", 5, "5.00", LegStatus::Pending),
        ];
        assert_eq!(
            derive_status(false, &legs),
            TransactionStatus::PartiallyDelivered
        );
    }

    #[test]
    fn test_derive_status_completed() {
        let legs = vec![
            leg("A", 10, "4.00", LegStatus::Delivered),
            leg("B", 5, "5.00", LegStatus::Delivered),
        ];
        assert_eq!(derive_status(false, &legs), TransactionStatus::Completed);
    }

    #[test]
    fn test_validate_legs_accepts_exact_sums() {
        let legs = vec![
            leg("A", 12, "4.00", LegStatus::Pending),
            leg("B", 8, "4.00", LegStatus::Pending),
        ];
        assert!(validate_legs(20, dec("80.00"), &legs).is_ok());
    }

    #[test]
    fn test_validate_legs_rejects_empty() {
        assert!(validate_legs(20, dec("80.00"), &[]).is_err());
    }

    #[test]
    fn test_validate_legs_rejects_quantity_mismatch() {
        let legs = vec![leg("A", 15, "4.00", LegStatus::Pending)];
        let err = validate_legs(20, dec("60.00"), &legs).unwrap_err();
        assert!(err.contains("15"));
        assert!(err.contains("20"));
    }

    #[test]
    fn test_validate_legs_rejects_non_positive_quantity() {
        let legs = vec![
            leg("A", 0, "4.00", LegStatus::Pending),
            leg("B", 20, "4.00", LegStatus::Pending),
        ];
        assert!(validate_legs(20, dec("80.00"), &legs).is_err());
    }

    /// Cost comparison allows cent-level rounding but nothing more
    #[test]
    fn test_validate_legs_cost_tolerance() {
        let legs = vec![leg("A", 3, "3.333", LegStatus::Pending)];
        // 3 * 3.333 = 9.999; stored total 10.00 is within a cent
        assert!(validate_legs(3, dec("10.00"), &legs).is_ok());
        // 10.02 is more than a cent away
        assert!(validate_legs(3, dec("10.02"), &legs).is_err());
    }

    /// Full model-level walkthrough: a 20-unit order at $4/unit moves from
    /// pending through delivery and finishes completed
    #[test]
    fn test_delivery_walkthrough() {
        let mut legs = vec![
            leg("Sunrise Produce", 12, "4.00", LegStatus::Pending),
            leg("Valley Farms", 8, "4.00", LegStatus::Pending),
        ];
        assert!(validate_legs(20, dec("80.00"), &legs).is_ok());
        assert_eq!(derive_status(false, &legs), TransactionStatus::Pending);

        // First leg ships, then arrives
        assert!(legs[0].status.can_transition(LegStatus::InTransit));
        legs[0].status = LegStatus::InTransit;
        assert_eq!(derive_status(false, &legs), TransactionStatus::InTransit);

        assert!(legs[0].status.can_transition(LegStatus::Delivered));
        legs[0].status = LegStatus::Delivered;
        assert_eq!(
            derive_status(false, &legs),
            TransactionStatus::PartiallyDelivered
        );

        // Second leg delivered directly from pending
        assert!(legs[1].status.can_transition(LegStatus::Delivered));
        legs[1].status = LegStatus::Delivered;
        assert_eq!(derive_status(false, &legs), TransactionStatus::Completed);

        // A completed transaction is terminal and no leg can move again
        assert!(derive_status(false, &legs).is_terminal());
        assert!(!legs[0].status.can_transition(LegStatus::InTransit));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn arb_leg_status() -> impl Strategy<Value = LegStatus> {
    prop_oneof![
        Just(LegStatus::Pending),
        Just(LegStatus::InTransit),
        Just(LegStatus::Delivered),
    ]
}

fn arb_legs() -> impl Strategy<Value = Vec<VendorLeg>> {
    prop::collection::vec(
        (1i64..500, 1u32..10_000, arb_leg_status()),
        1..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, cost_cents, status))| VendorLeg {
                vendor_name: format!("Vendor {}", i),
                quantity,
                unit_cost: Decimal::new(cost_cents as i64, 2),
                status,
                delivered_at: None,
            })
            .collect()
    })
}

proptest! {
    /// Legs whose totals are computed from themselves always validate
    #[test]
    fn prop_consistent_legs_validate(legs in arb_legs()) {
        let total_quantity: i64 = legs.iter().map(|l| l.quantity).sum();
        let total_cost: Decimal = legs.iter().map(|l| l.cost()).sum();
        prop_assert!(validate_legs(total_quantity, total_cost, &legs).is_ok());
    }

    /// The derived status is completed exactly when every leg is delivered
    #[test]
    fn prop_completed_iff_all_delivered(legs in arb_legs()) {
        let all_delivered = legs.iter().all(|l| l.status == LegStatus::Delivered);
        let status = derive_status(false, &legs);
        prop_assert_eq!(status == TransactionStatus::Completed, all_delivered);
    }

    /// The state machine admits no cycle: a delivered leg never transitions
    #[test]
    fn prop_delivered_never_transitions(to in arb_leg_status()) {
        prop_assert!(!LegStatus::Delivered.can_transition(to));
    }

    /// Transition legality is monotone toward delivery: any legal
    /// transition strictly advances the leg
    #[test]
    fn prop_transitions_advance(from in arb_leg_status(), to in arb_leg_status()) {
        fn rank(s: LegStatus) -> u8 {
            match s {
                LegStatus::Pending => 0,
                LegStatus::InTransit => 1,
                LegStatus::Delivered => 2,
            }
        }
        if from.can_transition(to) {
            prop_assert!(rank(to) > rank(from));
        }
    }
}
