//! Constraint evaluation for proposed replenishment orders
//!
//! Evaluation is a pure function: it never mutates state and never writes
//! an audit entry itself. The caller logs a `constraint_violation` entry on
//! rejection using the returned explanation, and logs warnings for any
//! constraints skipped because their value could not be parsed.

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::Constraint;
use crate::types::ConstraintKind;

/// A proposed order, before any persistence
#[derive(Debug, Clone)]
pub struct OrderProposal {
    pub sku_id: Uuid,
    pub quantity: i64,
    pub total_cost: Decimal,
    pub vendor_names: Vec<String>,
}

/// Evaluation verdict: rejection is a normal outcome, not an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected {
        kind: ConstraintKind,
        explanation: String,
    },
}

/// Result of evaluating a proposal against all applicable constraints
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub verdict: Verdict,
    /// Constraints skipped because their value was malformed; the caller
    /// must log these, they are never silently coerced into a pass
    pub skipped: Vec<String>,
}

impl EvaluationOutcome {
    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }
}

/// Evaluate a proposal against the SKU-scoped and global constraints
///
/// Checks run in a fixed order (max_quantity, min_quantity,
/// vendor_restriction, budget_limit, monthly_budget) and the first
/// violation wins. Each kind is checked across both the SKU-scoped and
/// the global list, SKU-scoped first; monthly_budget is global-only by
/// construction. All constraints of a kind must hold simultaneously;
/// absence of a kind is a vacuous pass.
pub fn evaluate(
    sku_constraints: &[Constraint],
    global_constraints: &[Constraint],
    proposal: &OrderProposal,
    month_to_date_spend: Decimal,
) -> EvaluationOutcome {
    let mut skipped = Vec::new();

    macro_rules! reject {
        ($kind:expr, $msg:expr) => {
            return EvaluationOutcome {
                verdict: Verdict::Rejected {
                    kind: $kind,
                    explanation: $msg,
                },
                skipped,
            }
        };
    }

    for c in applicable(sku_constraints, global_constraints, ConstraintKind::MaxQuantity) {
        match numeric_value(c, &mut skipped) {
            Some(limit) if Decimal::from(proposal.quantity) > limit => {
                reject!(
                    ConstraintKind::MaxQuantity,
                    format!(
                        "Quantity {} exceeds max limit of {}",
                        proposal.quantity,
                        limit.normalize()
                    )
                );
            }
            _ => {}
        }
    }

    for c in applicable(sku_constraints, global_constraints, ConstraintKind::MinQuantity) {
        match numeric_value(c, &mut skipped) {
            Some(limit) if Decimal::from(proposal.quantity) < limit => {
                reject!(
                    ConstraintKind::MinQuantity,
                    format!(
                        "Quantity {} is below min limit of {}",
                        proposal.quantity,
                        limit.normalize()
                    )
                );
            }
            _ => {}
        }
    }

    for c in applicable(sku_constraints, global_constraints, ConstraintKind::VendorRestriction) {
        let allowed = c.allowed_vendors();
        if allowed.is_empty() {
            skipped.push(format!(
                "vendor_restriction constraint {} has an empty vendor set",
                c.id
            ));
            continue;
        }
        for name in &proposal.vendor_names {
            if !allowed.iter().any(|a| a == name) {
                reject!(
                    ConstraintKind::VendorRestriction,
                    format!(
                        "Vendor '{}' is not in the allowed set [{}]",
                        name,
                        allowed.join(", ")
                    )
                );
            }
        }
    }

    for c in applicable(sku_constraints, global_constraints, ConstraintKind::BudgetLimit) {
        match numeric_value(c, &mut skipped) {
            Some(limit) if proposal.total_cost > limit => {
                reject!(
                    ConstraintKind::BudgetLimit,
                    format!(
                        "Total cost ${:.2} exceeds budget limit of ${:.2}",
                        proposal.total_cost, limit
                    )
                );
            }
            _ => {}
        }
    }

    for c in constraints_of(global_constraints, ConstraintKind::MonthlyBudget) {
        match numeric_value(c, &mut skipped) {
            Some(limit) if month_to_date_spend + proposal.total_cost > limit => {
                reject!(
                    ConstraintKind::MonthlyBudget,
                    format!(
                        "Month-to-date spend ${:.2} plus order cost ${:.2} exceeds monthly budget of ${:.2}",
                        month_to_date_spend, proposal.total_cost, limit
                    )
                );
            }
            _ => {}
        }
    }

    EvaluationOutcome {
        verdict: Verdict::Accepted,
        skipped,
    }
}

fn constraints_of<'a>(
    constraints: &'a [Constraint],
    kind: ConstraintKind,
) -> impl Iterator<Item = &'a Constraint> {
    constraints.iter().filter(move |c| c.kind == kind)
}

/// All constraints of a kind that bind this proposal, SKU-scoped first
fn applicable<'a>(
    sku_constraints: &'a [Constraint],
    global_constraints: &'a [Constraint],
    kind: ConstraintKind,
) -> impl Iterator<Item = &'a Constraint> {
    constraints_of(sku_constraints, kind).chain(constraints_of(global_constraints, kind))
}

/// Parse a numeric constraint value, recording malformed values as skipped
fn numeric_value(constraint: &Constraint, skipped: &mut Vec<String>) -> Option<Decimal> {
    match Decimal::from_str(constraint.value.trim()) {
        Ok(v) => Some(v),
        Err(_) => {
            skipped.push(format!(
                "{} constraint {} has a non-numeric value '{}'",
                constraint.kind.as_str(),
                constraint.id,
                constraint.value
            ));
            None
        }
    }
}
