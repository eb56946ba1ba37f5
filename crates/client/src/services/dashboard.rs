//! Admin dashboard figures.

use chrono::{NaiveDate, Utc};
use kotob_core::{Order, OrderStatus};
use rust_decimal::Decimal;
use tracing::instrument;

use super::books::BookService;
use super::orders::OrderService;
use crate::error::ClientError;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_books: usize,
    /// Order count as reported by the backend.
    pub total_orders: u64,
    /// Sum of delivered orders placed today (UTC).
    pub today_revenue: Decimal,
    /// Orders per status; statuses with no orders are omitted.
    pub status_breakdown: Vec<(OrderStatus, usize)>,
}

/// Aggregates catalog and order reads into [`DashboardStats`].
#[derive(Debug, Clone)]
pub struct DashboardService {
    books: BookService,
    orders: OrderService,
}

impl DashboardService {
    #[must_use]
    pub const fn new(books: BookService, orders: OrderService) -> Self {
        Self { books, orders }
    }

    /// Fetch the books, the order count and the order list concurrently and
    /// derive the dashboard figures. "Today" is the current UTC date.
    ///
    /// # Errors
    ///
    /// Fails if any of the three reads fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats, ClientError> {
        let (books, order_count, order_list) = tokio::try_join!(
            self.books.list(),
            async { self.orders.list().await.map(|list| list.count) },
            self.orders.list(),
        )?;

        let orders = order_list.orders;
        Ok(DashboardStats {
            total_books: books.len(),
            total_orders: order_count,
            today_revenue: today_revenue(&orders, Utc::now().date_naive()),
            status_breakdown: status_breakdown(&orders),
        })
    }
}

/// Total of delivered orders whose UTC creation date is `today`.
#[must_use]
pub fn today_revenue(orders: &[Order], today: NaiveDate) -> Decimal {
    orders
        .iter()
        .filter(|order| order.status == OrderStatus::Delivered && order.created_on() == today)
        .map(|order| order.total_amount)
        .sum()
}

/// Count orders per status, in display order, skipping empty statuses.
#[must_use]
pub fn status_breakdown(orders: &[Order]) -> Vec<(OrderStatus, usize)> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| {
            let count = orders.iter().filter(|order| order.status == status).count();
            (status, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}
