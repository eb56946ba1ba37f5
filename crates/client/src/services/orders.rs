//! Order client.
//!
//! Unwraps the backend's `{message, order}` / `{message, orders, count}`
//! envelopes. A delivered order is locked: status changes, edits and
//! deletion are refused before any write is sent.

use kotob_core::{NewOrder, Order, OrderId, OrderList, OrderStatus, OrderUpdate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::{ApiClient, MessageResponse, endpoints};
use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Serialize)]
struct StatusRequest {
    status: OrderStatus,
}

/// Client for orders.
#[derive(Debug, Clone)]
pub struct OrderService {
    api: ApiClient,
}

impl OrderService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Place an order for the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection, or "فشل في إنشاء الطلب".
    #[instrument(skip(self, order), fields(government = %order.government))]
    pub async fn create(&self, order: &NewOrder) -> Result<Order, ClientError> {
        let envelope: OrderEnvelope = self
            .api
            .post(endpoints::orders::ROOT, order)
            .await
            .map_err(ClientError::request("create order", "فشل في إنشاء الطلب"))?;
        info!(order_id = %envelope.order.id, total = %envelope.order.total_amount, "Order placed");
        Ok(envelope.order)
    }

    /// All orders plus the backend's count.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection, or "فشل في جلب الطلبات".
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<OrderList, ClientError> {
        self.api
            .get(endpoints::orders::ROOT)
            .await
            .map_err(ClientError::request("list orders", "فشل في جلب الطلبات"))
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection, or "فشل في جلب الطلب".
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Order, ClientError> {
        let envelope: OrderEnvelope = self
            .api
            .get(&endpoints::orders::by_id(id))
            .await
            .map_err(ClientError::request("get order", "فشل في جلب الطلب"))?;
        Ok(envelope.order)
    }

    /// Fetch the order, then move it to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OrderLocked`] for a delivered order and
    /// [`ClientError::StatusUnchanged`] when the order already has `status`.
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, ClientError> {
        let current = self.get(id).await?;
        self.transition(&current, status).await
    }

    /// Move an order already in hand to `status`.
    ///
    /// # Errors
    ///
    /// See [`OrderService::update_status`].
    #[instrument(skip(self, order), fields(order_id = %order.id, from = %order.status, to = %status))]
    pub async fn transition(&self, order: &Order, status: OrderStatus) -> Result<Order, ClientError> {
        check_transition(order, status)?;

        let envelope: OrderEnvelope = self
            .api
            .put(&endpoints::orders::status(&order.id), &StatusRequest { status })
            .await
            .map_err(ClientError::request(
                "update order status",
                "فشل في تحديث حالة الطلب",
            ))?;
        info!("Order status updated");
        Ok(envelope.order)
    }

    /// Fetch the order, then apply a partial edit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OrderLocked`] for a delivered order, or a
    /// status error when `update` carries an invalid transition.
    #[instrument(skip(self, update), fields(order_id = %id))]
    pub async fn update(&self, id: &OrderId, update: &OrderUpdate) -> Result<Order, ClientError> {
        let current = self.get(id).await?;
        if current.is_locked() {
            return Err(ClientError::OrderLocked(current.id));
        }
        if let Some(status) = update.status
            && status != current.status
        {
            check_transition(&current, status)?;
        }
        if update.is_empty() {
            return Ok(current);
        }

        let envelope: OrderEnvelope = self
            .api
            .put(&endpoints::orders::by_id(id), update)
            .await
            .map_err(ClientError::request("update order", "فشل في تحديث الطلب"))?;
        Ok(envelope.order)
    }

    /// Fetch the order, then delete it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OrderLocked`] for a delivered order.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete(&self, id: &OrderId) -> Result<Option<String>, ClientError> {
        let current = self.get(id).await?;
        if current.is_locked() {
            return Err(ClientError::OrderLocked(current.id));
        }

        let response: MessageResponse = self
            .api
            .delete(&endpoints::orders::by_id(id))
            .await
            .map_err(ClientError::request("delete order", "فشل في حذف الطلب"))?;
        info!("Order deleted");
        Ok(response.message)
    }
}

/// Refuse transitions out of a delivered order and no-op transitions.
fn check_transition(order: &Order, next: OrderStatus) -> Result<(), ClientError> {
    if order.is_locked() {
        return Err(ClientError::OrderLocked(order.id.clone()));
    }
    if order.status == next {
        return Err(ClientError::StatusUnchanged(next));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(status: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "items": [],
            "totalAmount": 100,
            "government": "القاهرة",
            "fullName": "Test",
            "address": "Somewhere 1",
            "paymentMethod": "cash",
            "status": status,
            "createdAt": "2026-10-17T10:00:00Z",
            "updatedAt": "2026-10-17T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_delivered_order_is_locked() {
        let delivered = order("مسلم");
        for next in OrderStatus::ALL {
            assert!(matches!(
                check_transition(&delivered, next),
                Err(ClientError::OrderLocked(_))
            ));
        }
    }

    #[test]
    fn test_same_status_is_refused() {
        assert!(matches!(
            check_transition(&order("قيد الانتظار"), OrderStatus::Pending),
            Err(ClientError::StatusUnchanged(OrderStatus::Pending))
        ));
    }

    #[test]
    fn test_pending_and_cancelled_can_move() {
        assert!(check_transition(&order("قيد الانتظار"), OrderStatus::Delivered).is_ok());
        assert!(check_transition(&order("ملغي"), OrderStatus::Pending).is_ok());
    }

    #[test]
    fn test_status_request_uses_arabic_label() {
        let body = serde_json::to_value(StatusRequest {
            status: OrderStatus::Cancelled,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"status": "ملغي"}));
    }
}
