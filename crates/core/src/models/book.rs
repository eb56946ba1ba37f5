//! Book catalog entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BookId, StockStatus, apply_offer};

/// A book as returned by the catalog endpoints.
///
/// The backend also sends a `stockStatus` field; it is ignored on input and
/// recomputed from [`Book::quantity`] so the client never disagrees with the
/// quantity it is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    /// Image references (absolute URLs, `/uploads/...` paths or bare file names).
    #[serde(default, deserialize_with = "deserialize_images")]
    pub imgs: Vec<String>,
    #[serde(default)]
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units in stock. Authoritative on the backend.
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    /// Discount percentage (0-100).
    #[serde(default, with = "rust_decimal::serde::float")]
    pub offer: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Stock status derived from the available quantity.
    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.quantity)
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Unit price after the offer is applied.
    #[must_use]
    pub fn final_price(&self) -> Decimal {
        apply_offer(self.price, self.offer)
    }

    /// Whether the book currently has a discount.
    #[must_use]
    pub fn has_offer(&self) -> bool {
        self.offer > Decimal::ZERO
    }

    /// Title for display, falling back to the name when the title is blank.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}

/// Accept `null` or a non-array value for `imgs` as an empty list.
fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "_id": "b1",
            "name": "مغامرات في الغابة",
            "title": "رحلة الأصدقاء",
            "category": "مغامرات",
            "imgs": ["/uploads/b1.jpg"],
            "code": "ADV-1",
            "price": 200,
            "quantity": 4,
            "description": "قصة مصورة",
            "offer": 10,
            "stockStatus": "inStock",
            "createdAt": "2026-10-17T08:30:00.000Z"
        }"#
    }

    #[test]
    fn test_deserialize_backend_book() {
        let book: Book = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(book.id, BookId::new("b1"));
        assert_eq!(book.price, Decimal::from(200));
        assert_eq!(book.offer, Decimal::from(10));
        assert_eq!(book.quantity, 4);
        assert_eq!(book.imgs, vec!["/uploads/b1.jpg".to_string()]);
        assert!(book.created_at.is_some());
    }

    #[test]
    fn test_final_price_applies_offer() {
        let book: Book = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(book.final_price(), Decimal::from(180));
        assert!(book.has_offer());
    }

    #[test]
    fn test_stock_status_is_derived_from_quantity() {
        let json = r#"{"_id":"b2","name":"x","price":10,"quantity":0,"stockStatus":"inStock"}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.stock_status(), StockStatus::OutOfStock);
        assert!(!book.is_in_stock());
    }

    #[test]
    fn test_missing_or_malformed_images_default_to_empty() {
        let json = r#"{"_id":"b3","name":"x","price":10,"imgs":null}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert!(book.imgs.is_empty());

        let json = r#"{"_id":"b4","name":"x","price":10}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert!(book.imgs.is_empty());
        assert_eq!(book.offer, Decimal::ZERO);
    }

    #[test]
    fn test_price_serializes_as_number() {
        let book: Book = serde_json::from_str(sample_json()).unwrap();
        let value = serde_json::to_value(&book).unwrap();
        assert!(value["price"].is_number());
        assert_eq!(value["_id"], "b1");
    }

    #[test]
    fn test_display_title_falls_back_to_name() {
        let json = r#"{"_id":"b5","name":"الاسم","title":" ","price":1}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.display_title(), "الاسم");
    }
}
