//! Price type for product and cart amounts.
//!
//! Prices are held as an integer number of hundredths to avoid floating-point
//! drift when summing lines. On the wire they stay decimal numbers
//! (`179.9`), which is what the storefront API and persisted carts use.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Currencies a price can be displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    BRL,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::BRL => "BRL",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::BRL => "R$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A price in hundredths of the display currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price {
    cents: i64,
}

impl Price {
    /// Create a price from hundredths.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Create a price from a decimal amount.
    ///
    /// ```
    /// use shop_commerce::money::Price;
    /// assert_eq!(Price::from_decimal(179.9).cents(), 17990);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        Self::from_cents((amount * 100.0).round() as i64)
    }

    /// Zero price.
    pub const fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Amount in hundredths.
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Multiply by a quantity, returning `None` on overflow.
    pub fn try_multiply(&self, quantity: i64) -> Option<Price> {
        self.cents.checked_mul(quantity).map(Price::from_cents)
    }

    /// Add another price, returning `None` on overflow.
    pub fn try_add(&self, other: &Price) -> Option<Price> {
        self.cents.checked_add(other.cents).map(Price::from_cents)
    }

    /// Format as a display string (e.g., "$49.99").
    pub fn display(&self, currency: Currency) -> String {
        format!("{}{:.2}", currency.symbol(), self.to_decimal())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.cents % 100 == 0 {
            serializer.serialize_i64(self.cents / 100)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        if !amount.is_finite() {
            return Err(serde::de::Error::custom("price must be a finite number"));
        }
        Ok(Price::from_decimal(amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}
