//! Price representation using decimal arithmetic.
//!
//! Book prices arrive from the backend as JSON numbers in Egyptian pounds.
//! They are held as [`Decimal`] so that discount math stays exact
//! (`200 × 0.9 × 2` is `360`, not `359.99999`).

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in Egyptian pounds, formatted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    /// Currency symbol shown after every amount.
    pub const SYMBOL: &'static str = "ج.م";

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.0.round_dp(2), Self::SYMBOL)
    }
}

/// Apply a percentage discount ("offer") to a price.
///
/// `offer` is a percentage in `0..=100`; values outside that range are
/// clamped so a malformed offer can never produce a negative price.
///
/// ```
/// use kotob_core::apply_offer;
/// use rust_decimal::Decimal;
///
/// assert_eq!(apply_offer(Decimal::from(200), Decimal::from(10)), Decimal::from(180));
/// ```
#[must_use]
pub fn apply_offer(price: Decimal, offer: Decimal) -> Decimal {
    let offer = offer.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    price - price * offer / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_offer() {
        assert_eq!(
            apply_offer(Decimal::from(200), Decimal::from(10)),
            Decimal::from(180)
        );
        assert_eq!(
            apply_offer(Decimal::from(100), Decimal::ZERO),
            Decimal::from(100)
        );
        assert_eq!(
            apply_offer(Decimal::from(80), Decimal::ONE_HUNDRED),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_apply_offer_clamps_out_of_range() {
        assert_eq!(
            apply_offer(Decimal::from(50), Decimal::from(150)),
            Decimal::ZERO
        );
        assert_eq!(
            apply_offer(Decimal::from(50), Decimal::from(-5)),
            Decimal::from(50)
        );
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(4605, 1));
        assert_eq!(price.to_string(), "460.50 ج.م");
    }
}
