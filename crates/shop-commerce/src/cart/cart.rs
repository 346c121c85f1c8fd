//! Cart and cart line types.

use crate::catalog::Product;
use crate::error::InvalidCart;
use crate::ids::ProductId;
use crate::money::Price;
use serde::{Deserialize, Serialize};

/// A product paired with a quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// The product, flattened so a line reads like the product plus `amount`.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity, always at least 1.
    pub amount: i64,
}

impl CartLine {
    /// Create a line holding a single unit.
    pub fn new(product: Product) -> Self {
        Self { product, amount: 1 }
    }

    /// Product id of this line.
    pub fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount, `None` on overflow.
    pub fn subtotal(&self) -> Option<Price> {
        self.product.price.try_multiply(self.amount)
    }
}

/// An ordered set of cart lines.
///
/// Lines keep the order in which products were first added and no product
/// appears twice. Serializes as a plain JSON array of lines; deserializing
/// rejects duplicates and non-positive amounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartLine> {
        self.lines.iter()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the line for a product.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id() == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Product ids in insertion order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(CartLine::id).collect()
    }

    /// Sum of all amounts.
    pub fn total_amount(&self) -> i64 {
        self.lines.iter().map(|l| l.amount).sum()
    }

    /// Sum of all line subtotals, `None` on overflow.
    pub fn subtotal(&self) -> Option<Price> {
        self.lines
            .iter()
            .try_fold(Price::zero(), |acc, line| acc.try_add(&line.subtotal()?))
    }

    /// Append a new line with amount 1.
    ///
    /// Fails if the product is already in the cart.
    pub fn push_product(&mut self, product: Product) -> Result<(), InvalidCart> {
        if self.contains(product.id) {
            return Err(InvalidCart::DuplicateProduct(product.id));
        }
        self.lines.push(CartLine::new(product));
        Ok(())
    }

    /// Set the amount of an existing line in place.
    ///
    /// Returns `false` if the product is missing or `amount` is not positive.
    pub fn set_amount(&mut self, product_id: ProductId, amount: i64) -> bool {
        if amount < 1 {
            return false;
        }
        match self.lines.iter_mut().find(|l| l.id() == product_id) {
            Some(line) => {
                line.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove a line, keeping the order of the rest.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.id() == product_id)?;
        Some(self.lines.remove(index))
    }
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = InvalidCart;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        let mut seen = std::collections::HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.amount < 1 {
                return Err(InvalidCart::NonPositiveAmount {
                    product_id: line.id(),
                    amount: line.amount,
                });
            }
            if !seen.insert(line.id()) {
                return Err(InvalidCart::DuplicateProduct(line.id()));
            }
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
