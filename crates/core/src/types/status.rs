//! Status enums for various entities.
//!
//! Order statuses travel over the wire as their Arabic labels, exactly as the
//! backend stores them.

use serde::{Deserialize, Serialize};

/// Order status.
///
/// `Delivered` is terminal: the client refuses any further transition or
/// deletion once an order reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "قيد الانتظار")]
    Pending,
    #[serde(rename = "مسلم")]
    Delivered,
    #[serde(rename = "ملغي")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Delivered, Self::Cancelled];

    /// Arabic label, identical to the wire value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "قيد الانتظار",
            Self::Delivered => "مسلم",
            Self::Cancelled => "ملغي",
        }
    }

    /// Whether no further changes are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether the order may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        !self.is_terminal() && self != next
    }

    /// Statuses an administrator may pick for an order currently in `self`.
    #[must_use]
    pub fn available_statuses(self) -> Vec<Self> {
        if self.is_terminal() {
            vec![self]
        } else {
            Self::ALL.to_vec()
        }
    }

    /// Whether moving into this status needs an explicit confirmation.
    #[must_use]
    pub const fn requires_confirmation(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "قيد الانتظار" | "pending" => Ok(Self::Pending),
            "مسلم" | "delivered" => Ok(Self::Delivered),
            "ملغي" | "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Stock status of a book, derived from its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Derive the status from an available quantity.
    #[must_use]
    pub const fn from_quantity(quantity: u32) -> Self {
        if quantity > 0 {
            Self::InStock
        } else {
            Self::OutOfStock
        }
    }
}

impl std::str::FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inStock" | "in-stock" => Ok(Self::InStock),
            "outOfStock" | "out-of-stock" => Ok(Self::OutOfStock),
            _ => Err(format!("invalid stock status: {s}")),
        }
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Visa,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Visa => write!(f, "visa"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "visa" => Ok(Self::Visa),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// User role.
///
/// Any role string other than `admin` is treated as a regular customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access to the dashboard.
    Admin,
    /// Regular shopper.
    #[default]
    #[serde(other)]
    Customer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"مسلم\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"قيد الانتظار\"").unwrap();
        assert_eq!(parsed, OrderStatus::Pending);
        let parsed: OrderStatus = serde_json::from_str("\"ملغي\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_delivered_is_locked() {
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
        }
        assert_eq!(
            OrderStatus::Delivered.available_statuses(),
            vec![OrderStatus::Delivered]
        );
    }

    #[test]
    fn test_pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert_eq!(OrderStatus::Pending.available_statuses().len(), 3);
    }

    #[test]
    fn test_requires_confirmation() {
        assert!(!OrderStatus::Pending.requires_confirmation());
        assert!(OrderStatus::Delivered.requires_confirmation());
        assert!(OrderStatus::Cancelled.requires_confirmation());
    }

    #[test]
    fn test_stock_status_from_quantity() {
        assert_eq!(StockStatus::from_quantity(3), StockStatus::InStock);
        assert_eq!(StockStatus::from_quantity(0), StockStatus::OutOfStock);
        assert_eq!(
            serde_json::to_string(&StockStatus::OutOfStock).unwrap(),
            "\"outOfStock\""
        );
    }

    #[test]
    fn test_unknown_role_is_customer() {
        let role: UserRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, UserRole::Customer);
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_parse_from_cli_words() {
        assert_eq!("delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert_eq!("visa".parse::<PaymentMethod>(), Ok(PaymentMethod::Visa));
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }
}
