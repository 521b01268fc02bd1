//! Validation utilities for replenishment inputs

use rust_decimal::Decimal;

/// Validate a SKU name
pub fn validate_sku_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("SKU name cannot be empty");
    }
    if trimmed.len() > 200 {
        return Err("SKU name is too long (max 200 characters)");
    }
    Ok(())
}

/// Validate an on-hand unit count (manual edits included)
pub fn validate_unit_count(units: i64) -> Result<(), &'static str> {
    if units < 0 {
        return Err("Unit count cannot be negative");
    }
    Ok(())
}

/// Validate a vendor offer's unit cost
pub fn validate_unit_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

/// Validate a vendor offer's delivery lead time
pub fn validate_lead_time(days: i32) -> Result<(), &'static str> {
    if days < 0 {
        return Err("Delivery lead time cannot be negative");
    }
    Ok(())
}

/// Validate an order quantity
pub fn validate_order_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Order quantity must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_name() {
        assert!(validate_sku_name("Mangoes").is_ok());
        assert!(validate_sku_name("  ").is_err());
        assert!(validate_sku_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_unit_count() {
        assert!(validate_unit_count(0).is_ok());
        assert!(validate_unit_count(-1).is_err());
    }

    #[test]
    fn test_unit_cost() {
        assert!(validate_unit_cost(Decimal::ZERO).is_ok());
        assert!(validate_unit_cost(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_lead_time() {
        assert!(validate_lead_time(0).is_ok());
        assert!(validate_lead_time(-3).is_err());
    }

    #[test]
    fn test_order_quantity() {
        assert!(validate_order_quantity(1).is_ok());
        assert!(validate_order_quantity(0).is_err());
        assert!(validate_order_quantity(-5).is_err());
    }
}
