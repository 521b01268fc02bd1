//! Schema invariants
//!
//! The services lean on the database for referential integrity, so the
//! migration text is checked here for the rules they assume: deleting a
//! SKU must cascade through its dependents rather than trip a foreign key,
//! and the audit log must never be tied to a SKU row.

const INITIAL_SCHEMA: &str = include_str!("../migrations/0001_initial.sql");

/// Strip SQL comments and collapse whitespace so assertions are not
/// sensitive to formatting
fn normalized() -> String {
    INITIAL_SCHEMA
        .lines()
        .map(|line| match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        })
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every table that references skus(id) must cascade on delete. Without
/// this, deleting a SKU whose transactions are all terminal fails with a
/// foreign key violation even though the service-level open-transaction
/// guard passed.
#[test]
fn test_sku_references_cascade_on_delete() {
    let schema = normalized();
    let mut rest = schema.as_str();
    let mut references = 0;

    while let Some(pos) = rest.find("REFERENCES skus (id)") {
        references += 1;
        let after = &rest[pos + "REFERENCES skus (id)".len()..];
        assert!(
            after.trim_start().starts_with("ON DELETE CASCADE"),
            "a foreign key to skus(id) is missing ON DELETE CASCADE"
        );
        rest = after;
    }

    // vendor_offers, constraints and transactions
    assert_eq!(references, 3);
}

/// Transaction legs follow their transaction
#[test]
fn test_transaction_legs_cascade_from_transactions() {
    assert!(normalized().contains("REFERENCES transactions (id) ON DELETE CASCADE"));
}

/// The audit log is the durable record: its sku_id column carries no
/// foreign key, so entries survive SKU deletion
#[test]
fn test_audit_log_survives_sku_deletion() {
    let schema = normalized();
    let audit_start = schema
        .find("CREATE TABLE audit_log")
        .unwrap_or_else(|| panic!("audit_log table not found"));
    let audit = &schema[audit_start..];
    let audit = match audit.find(';') {
        Some(end) => &audit[..end],
        None => audit,
    };

    assert!(audit.contains("sku_id UUID"));
    assert!(!audit.contains("REFERENCES"));
}
