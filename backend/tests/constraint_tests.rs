//! Constraint evaluator tests
//!
//! Covers the fixed check order, first-violation-wins reporting, malformed
//! value skipping, and the monthly budget arithmetic.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{evaluate, Constraint, ConstraintKind, OrderProposal, Verdict};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn constraint(sku_id: Option<Uuid>, kind: ConstraintKind, value: &str) -> Constraint {
    Constraint {
        id: Uuid::new_v4(),
        sku_id,
        kind,
        value: value.to_string(),
        description: None,
        created_at: Utc::now(),
    }
}

fn proposal(quantity: i64, total_cost: &str, vendors: &[&str]) -> OrderProposal {
    OrderProposal {
        sku_id: Uuid::new_v4(),
        quantity,
        total_cost: dec(total_cost),
        vendor_names: vendors.iter().map(|v| v.to_string()).collect(),
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// No constraints at all: every check is vacuously satisfied
    #[test]
    fn test_no_constraints_accepts() {
        let outcome = evaluate(&[], &[], &proposal(20, "80.00", &["B"]), Decimal::ZERO);
        assert!(outcome.is_accepted());
        assert!(outcome.skipped.is_empty());
    }

    /// max_quantity=100 rejects 150 and cites the constraint
    #[test]
    fn test_max_quantity_rejects_over_limit() {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(Some(sku), ConstraintKind::MaxQuantity, "100")];

        let outcome = evaluate(&constraints, &[], &proposal(150, "750.00", &["A"]), Decimal::ZERO);
        match outcome.verdict {
            Verdict::Rejected { kind, explanation } => {
                assert_eq!(kind, ConstraintKind::MaxQuantity);
                assert_eq!(explanation, "Quantity 150 exceeds max limit of 100");
            }
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// max_quantity=100 accepts exactly 100
    #[test]
    fn test_max_quantity_accepts_at_limit() {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(Some(sku), ConstraintKind::MaxQuantity, "100")];

        let outcome = evaluate(&constraints, &[], &proposal(100, "500.00", &["A"]), Decimal::ZERO);
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_min_quantity_rejects_under_limit() {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(Some(sku), ConstraintKind::MinQuantity, "10")];

        let outcome = evaluate(&constraints, &[], &proposal(5, "25.00", &["A"]), Decimal::ZERO);
        match outcome.verdict {
            Verdict::Rejected { kind, .. } => assert_eq!(kind, ConstraintKind::MinQuantity),
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// vendor_restriction is an allow-list: any vendor outside it rejects
    #[test]
    fn test_vendor_restriction_allow_list() {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(
            Some(sku),
            ConstraintKind::VendorRestriction,
            "Acme, Globex",
        )];

        let ok = evaluate(&constraints, &[], &proposal(10, "50.00", &["Acme"]), Decimal::ZERO);
        assert!(ok.is_accepted());

        let bad = evaluate(
            &constraints,
            &[],
            &proposal(10, "50.00", &["Acme", "Initech"]),
            Decimal::ZERO,
        );
        match bad.verdict {
            Verdict::Rejected { kind, explanation } => {
                assert_eq!(kind, ConstraintKind::VendorRestriction);
                assert!(explanation.contains("Initech"));
            }
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_budget_limit_rejects_over_cost() {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(Some(sku), ConstraintKind::BudgetLimit, "500")];

        let outcome = evaluate(&constraints, &[], &proposal(200, "600.00", &["A"]), Decimal::ZERO);
        match outcome.verdict {
            Verdict::Rejected { kind, explanation } => {
                assert_eq!(kind, ConstraintKind::BudgetLimit);
                assert!(explanation.contains("$600.00"));
                assert!(explanation.contains("$500.00"));
            }
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// monthly_budget is checked against month-to-date spend plus the
    /// proposed cost
    #[test]
    fn test_monthly_budget_includes_spend() {
        let globals = vec![constraint(None, ConstraintKind::MonthlyBudget, "1000")];

        // 700 spent + 200 proposed = 900, within budget
        let ok = evaluate(&[], &globals, &proposal(40, "200.00", &["A"]), dec("700"));
        assert!(ok.is_accepted());

        // 900 spent + 200 proposed = 1100, over budget
        let over = evaluate(&[], &globals, &proposal(40, "200.00", &["A"]), dec("900"));
        match over.verdict {
            Verdict::Rejected { kind, .. } => assert_eq!(kind, ConstraintKind::MonthlyBudget),
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// A global max_quantity binds every proposal, not just SKU-scoped ones
    #[test]
    fn test_global_max_quantity_enforced() {
        let globals = vec![constraint(None, ConstraintKind::MaxQuantity, "100")];

        let outcome = evaluate(&[], &globals, &proposal(150, "750.00", &["A"]), Decimal::ZERO);
        match outcome.verdict {
            Verdict::Rejected { kind, explanation } => {
                assert_eq!(kind, ConstraintKind::MaxQuantity);
                assert_eq!(explanation, "Quantity 150 exceeds max limit of 100");
            }
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// A global vendor allow-list applies on top of the SKU-scoped one;
    /// both must admit every vendor in the proposal
    #[test]
    fn test_global_vendor_restriction_enforced() {
        let sku = Uuid::new_v4();
        let sku_constraints = vec![constraint(
            Some(sku),
            ConstraintKind::VendorRestriction,
            "Acme, Globex",
        )];
        let globals = vec![constraint(None, ConstraintKind::VendorRestriction, "Acme")];

        let ok = evaluate(
            &sku_constraints,
            &globals,
            &proposal(10, "50.00", &["Acme"]),
            Decimal::ZERO,
        );
        assert!(ok.is_accepted());

        // Globex passes the SKU list but fails the global one
        let bad = evaluate(
            &sku_constraints,
            &globals,
            &proposal(10, "50.00", &["Globex"]),
            Decimal::ZERO,
        );
        match bad.verdict {
            Verdict::Rejected { kind, explanation } => {
                assert_eq!(kind, ConstraintKind::VendorRestriction);
                assert!(explanation.contains("Globex"));
            }
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// Global budget_limit and min_quantity are checked even with no
    /// SKU-scoped constraints at all
    #[test]
    fn test_global_numeric_constraints_enforced() {
        let globals = vec![
            constraint(None, ConstraintKind::MinQuantity, "10"),
            constraint(None, ConstraintKind::BudgetLimit, "500"),
        ];

        let under = evaluate(&[], &globals, &proposal(5, "25.00", &["A"]), Decimal::ZERO);
        match under.verdict {
            Verdict::Rejected { kind, .. } => assert_eq!(kind, ConstraintKind::MinQuantity),
            Verdict::Accepted => panic!("expected rejection"),
        }

        let over = evaluate(&[], &globals, &proposal(200, "600.00", &["A"]), Decimal::ZERO);
        match over.verdict {
            Verdict::Rejected { kind, .. } => assert_eq!(kind, ConstraintKind::BudgetLimit),
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// Checks run in a fixed order and the first violation wins
    #[test]
    fn test_first_violation_wins() {
        let sku = Uuid::new_v4();
        let constraints = vec![
            constraint(Some(sku), ConstraintKind::BudgetLimit, "1"),
            constraint(Some(sku), ConstraintKind::MaxQuantity, "10"),
        ];

        // Violates both; max_quantity is checked first
        let outcome = evaluate(&constraints, &[], &proposal(50, "250.00", &["A"]), Decimal::ZERO);
        match outcome.verdict {
            Verdict::Rejected { kind, .. } => assert_eq!(kind, ConstraintKind::MaxQuantity),
            Verdict::Accepted => panic!("expected rejection"),
        }
    }

    /// A malformed value is skipped with a warning, never coerced to a pass
    /// or a failure
    #[test]
    fn test_malformed_value_skipped() {
        let sku = Uuid::new_v4();
        let constraints = vec![
            constraint(Some(sku), ConstraintKind::MaxQuantity, "lots"),
            constraint(Some(sku), ConstraintKind::MaxQuantity, "100"),
        ];

        let outcome = evaluate(&constraints, &[], &proposal(50, "250.00", &["A"]), Decimal::ZERO);
        assert!(outcome.is_accepted());
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].contains("lots"));
    }

    /// Multiple constraints of the same kind must all hold
    #[test]
    fn test_multiple_constraints_of_same_kind_and_together() {
        let sku = Uuid::new_v4();
        let constraints = vec![
            constraint(Some(sku), ConstraintKind::MaxQuantity, "200"),
            constraint(Some(sku), ConstraintKind::MaxQuantity, "100"),
        ];

        let outcome = evaluate(&constraints, &[], &proposal(150, "750.00", &["A"]), Decimal::ZERO);
        assert!(!outcome.is_accepted());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Quantities at or below a max_quantity limit always pass it;
    /// quantities above always fail it
    #[test]
    fn prop_max_quantity_threshold(limit in 1i64..10_000, quantity in 1i64..10_000) {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(
            Some(sku),
            ConstraintKind::MaxQuantity,
            &limit.to_string(),
        )];

        let outcome = evaluate(
            &constraints,
            &[],
            &proposal(quantity, "0.00", &[]),
            Decimal::ZERO,
        );

        prop_assert_eq!(outcome.is_accepted(), quantity <= limit);
    }

    /// Evaluation is pure: the same inputs always produce the same verdict
    #[test]
    fn prop_evaluation_deterministic(quantity in 1i64..1_000, limit in 1i64..1_000) {
        let sku = Uuid::new_v4();
        let constraints = vec![constraint(
            Some(sku),
            ConstraintKind::MaxQuantity,
            &limit.to_string(),
        )];
        let p = proposal(quantity, "10.00", &["A"]);

        let first = evaluate(&constraints, &[], &p, Decimal::ZERO);
        let second = evaluate(&constraints, &[], &p, Decimal::ZERO);
        prop_assert_eq!(first.is_accepted(), second.is_accepted());
    }
}
