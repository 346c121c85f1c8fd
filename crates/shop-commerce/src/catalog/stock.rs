//! Stock level types.

use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Units available for a product at the source of truth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    /// Product this stock belongs to.
    pub id: ProductId,
    /// Total available units.
    pub amount: i64,
}

impl Stock {
    pub fn new(id: impl Into<ProductId>, amount: i64) -> Self {
        Self {
            id: id.into(),
            amount,
        }
    }

    /// Check if a specific quantity is available.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        quantity <= self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_fulfill() {
        let stock = Stock::new(1u64, 3);
        assert!(stock.can_fulfill(3));
        assert!(!stock.can_fulfill(4));
    }

    #[test]
    fn test_out_of_stock() {
        let stock = Stock::new(1u64, 0);
        assert!(!stock.can_fulfill(1));
        assert!(!Stock::new(1u64, -2).can_fulfill(1));
    }

    #[test]
    fn test_parse() {
        let stock: Stock = serde_json::from_str(r#"{"id": 2, "amount": 5}"#).unwrap();
        assert_eq!(stock, Stock::new(2u64, 5));
    }
}
