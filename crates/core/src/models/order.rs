//! Orders placed at checkout.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BookId, OrderId, OrderStatus, PaymentMethod, UserId};

/// Book snapshot embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemBook {
    #[serde(rename = "_id")]
    pub id: BookId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub imgs: Vec<String>,
    #[serde(default)]
    pub category: String,
}

/// One ordered line: book snapshot, quantity, and the unit price charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub book: OrderItemBook,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Customer reference attached to an order by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

/// An order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderUser>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Governorate the order ships to.
    pub government: String,
    pub full_name: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Calendar day (UTC) the order was placed.
    #[must_use]
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Whether the order may still be edited, re-statused or deleted.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.status.is_terminal()
    }

    /// Last six characters of the ID, used as a short reference.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(5)
            .map_or(0, |(index, _)| index);
        id.get(start..).unwrap_or(id)
    }
}

/// Order list response: orders plus the backend's total count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub count: u64,
}

/// Checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub government: String,
    pub full_name: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial admin update. Absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub government: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderUpdate {
    /// Whether the update carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.government.is_none()
            && self.full_name.is_none()
            && self.address.is_none()
            && self.payment_method.is_none()
            && self.sale_code.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "_id": "66aa00112233445566778899",
            "items": [{
                "book": {"_id": "b1", "name": "كتاب", "price": 120, "imgs": []},
                "quantity": 2,
                "price": 120
            }],
            "totalAmount": 240,
            "government": "القاهرة",
            "fullName": "سارة أحمد",
            "address": "شارع النيل 12",
            "paymentMethod": "cash",
            "status": "قيد الانتظار",
            "createdAt": "2026-10-17T09:00:00.000Z",
            "updatedAt": "2026-10-17T09:00:00.000Z"
        })
    }

    #[test]
    fn test_deserialize_backend_order() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.total_amount, Decimal::from(240));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::Cash);
        assert_eq!(order.items.len(), 1);
        assert!(order.sale_code.is_none());
        assert!(!order.is_locked());
        assert_eq!(
            order.created_on(),
            NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
        );
    }

    #[test]
    fn test_short_id() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.short_id(), "778899");
    }

    #[test]
    fn test_new_order_omits_blank_optionals() {
        let order = NewOrder {
            government: "الجيزة".to_string(),
            full_name: "Omar".to_string(),
            address: "12 Street".to_string(),
            payment_method: PaymentMethod::Visa,
            sale_code: None,
            notes: None,
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["paymentMethod"], "visa");
        assert_eq!(value["fullName"], "Omar");
        assert!(value.get("saleCode").is_none());
    }

    #[test]
    fn test_order_update_is_empty() {
        assert!(OrderUpdate::default().is_empty());
        let update = OrderUpdate {
            notes: Some("اتصل قبل التوصيل".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
