//! Cart lines and cart pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::book::Book;
use crate::types::BookId;

/// A cart line: a snapshot of the book plus the requested quantity.
///
/// A cart holds at most one line per book identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub book: Book,
    pub quantity: u32,
}

impl CartItem {
    /// Create a new cart line.
    #[must_use]
    pub const fn new(book: Book, quantity: u32) -> Self {
        Self { book, quantity }
    }

    /// Identifier of the book on this line.
    #[must_use]
    pub const fn book_id(&self) -> &BookId {
        &self.book.id
    }

    /// Unit price after the book's offer.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.book.final_price()
    }

    /// Line total (discounted unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// Sum of all line totals.
///
/// ```
/// use kotob_core::cart_subtotal;
/// assert_eq!(cart_subtotal(&[]), rust_decimal::Decimal::ZERO);
/// ```
#[must_use]
pub fn cart_subtotal(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Subtotal minus a manual (coupon) discount.
#[must_use]
pub fn cart_total(items: &[CartItem], discount: Decimal) -> Decimal {
    cart_subtotal(items) - discount
}

/// Total number of units across all lines.
#[must_use]
pub fn cart_item_count(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}
