//! Purchasing constraint models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ConstraintKind;

/// A rule limiting permissible order quantity, cost, or vendor choice
///
/// The value is stored as raw text; numeric kinds parse it at evaluation
/// time and `vendor_restriction` treats it as a comma-separated set of
/// allowed vendor names. Multiple constraints of the same kind may coexist
/// for a SKU; all must hold simultaneously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: Uuid,
    /// None for global constraints
    pub sku_id: Option<Uuid>,
    pub kind: ConstraintKind,
    pub value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Constraint {
    pub fn is_global(&self) -> bool {
        self.sku_id.is_none()
    }

    /// Parse the allowed vendor set for `vendor_restriction` constraints
    pub fn allowed_vendors(&self) -> Vec<String> {
        self.value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn restriction(value: &str) -> Constraint {
        Constraint {
            id: Uuid::new_v4(),
            sku_id: Some(Uuid::new_v4()),
            kind: ConstraintKind::VendorRestriction,
            value: value.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_allowed_vendors_trims_and_drops_empties() {
        let c = restriction(" Acme , Globex ,, ");
        assert_eq!(c.allowed_vendors(), vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_allowed_vendors_empty_value() {
        assert!(restriction("").allowed_vendors().is_empty());
    }

    #[test]
    fn test_is_global() {
        let mut c = restriction("Acme");
        assert!(!c.is_global());
        c.sku_id = None;
        assert!(c.is_global());
    }
}
