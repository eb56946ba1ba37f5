//! Filtering and sorting for catalog and order listings.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use kotob_core::{Book, Order, OrderStatus, PaymentMethod, StockStatus};

// =============================================================================
// Books
// =============================================================================

/// Sort order for book listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    /// Name, ascending.
    #[default]
    Name,
    /// Price, cheapest first.
    Price,
    /// Quantity, largest stock first.
    Quantity,
}

impl FromStr for BookSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "quantity" => Ok(Self::Quantity),
            _ => Err(format!("invalid sort: {s} (expected name, price or quantity)")),
        }
    }
}

/// Criteria for a book listing. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Exact category.
    pub category: Option<String>,
    pub stock: Option<StockStatus>,
    /// Case-insensitive substring of the name or title.
    pub search: Option<String>,
    pub sort: BookSort,
}

impl BookFilter {
    /// Whether a book meets every set criterion.
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        let category = self
            .category
            .as_deref()
            .is_none_or(|c| c.is_empty() || book.category == c);
        let stock = self.stock.is_none_or(|s| book.stock_status() == s);
        let search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                book.name.to_lowercase().contains(&term) || book.title.to_lowercase().contains(&term)
            }
        };
        category && stock && search
    }

    /// Matching books, sorted.
    #[must_use]
    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        let mut matched: Vec<Book> = books.iter().filter(|b| self.matches(b)).cloned().collect();
        match self.sort {
            BookSort::Name => matched.sort_by(|a, b| a.name.cmp(&b.name)),
            BookSort::Price => matched.sort_by(|a, b| a.price.cmp(&b.price)),
            BookSort::Quantity => matched.sort_by(|a, b| b.quantity.cmp(&a.quantity)),
        }
        matched
    }
}

/// Distinct non-empty categories, in first-seen order.
#[must_use]
pub fn unique_categories(books: &[Book]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for book in books {
        if !book.category.is_empty() && !categories.contains(&book.category) {
            categories.push(book.category.clone());
        }
    }
    categories
}

// =============================================================================
// Orders
// =============================================================================

/// Creation-date window for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Same calendar day.
    Today,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
    /// Since January 1st of the current year.
    Year,
}

impl DateWindow {
    /// Whether `created_at` falls inside the window ending at `now`.
    #[must_use]
    pub fn contains(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Today => created_at.date_naive() == now.date_naive(),
            Self::Week => created_at >= now - Duration::days(7),
            Self::Month => created_at >= now - Duration::days(30),
            Self::Year => NaiveDate::from_ymd_opt(now.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .is_none_or(|start| created_at >= Utc.from_utc_datetime(&start)),
        }
    }

    /// Arabic label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "اليوم",
            Self::Week => "هذا الأسبوع",
            Self::Month => "هذا الشهر",
            Self::Year => "هذا العام",
        }
    }
}

impl FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("invalid date window: {s} (expected today, week, month or year)")),
        }
    }
}

/// Criteria for the admin order listing. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Case-insensitive substring of the customer name, order ID or governorate.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    /// Exact governorate.
    pub government: Option<String>,
    pub window: Option<DateWindow>,
}

impl OrderFilter {
    /// Whether an order meets every set criterion at time `now`.
    #[must_use]
    pub fn matches(&self, order: &Order, now: DateTime<Utc>) -> bool {
        let search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                order.full_name.to_lowercase().contains(&term)
                    || order.id.as_str().to_lowercase().contains(&term)
                    || order.government.to_lowercase().contains(&term)
            }
        };
        search
            && self.status.is_none_or(|s| order.status == s)
            && self.payment_method.is_none_or(|p| order.payment_method == p)
            && self
                .government
                .as_deref()
                .is_none_or(|g| g.is_empty() || order.government == g)
            && self.window.is_none_or(|w| w.contains(order.created_at, now))
    }

    /// Matching orders, in their original order.
    #[must_use]
    pub fn apply(&self, orders: &[Order], now: DateTime<Utc>) -> Vec<Order> {
        orders
            .iter()
            .filter(|o| self.matches(o, now))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn book(id: &str, name: &str, title: &str, category: &str, price: i64, quantity: u32) -> Book {
        serde_json::from_value(serde_json::json!({
            "_id": id, "name": name, "title": title, "category": category,
            "price": price, "quantity": quantity
        }))
        .unwrap()
    }

    fn catalog() -> Vec<Book> {
        vec![
            book("1", "Beta", "Space Trip", "علوم", 80, 0),
            book("2", "alpha", "Forest", "مغامرات", 120, 5),
            book("3", "Gamma", "Deep SPACE", "علوم", 50, 9),
        ]
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_book_search_is_case_insensitive_over_name_and_title() {
        let filter = BookFilter {
            search: Some("space".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), vec!["1", "3"]);

        let filter = BookFilter {
            search: Some("ALPHA".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), vec!["2"]);
    }

    #[test]
    fn test_book_category_and_stock_filters() {
        let filter = BookFilter {
            category: Some("علوم".to_string()),
            stock: Some(StockStatus::InStock),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&catalog())), vec!["3"]);
    }

    #[test]
    fn test_book_sorts() {
        let by = |sort| {
            ids(&BookFilter {
                sort,
                ..Default::default()
            }
            .apply(&catalog()))
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
        };
        assert_eq!(by(BookSort::Name), vec!["1", "3", "2"]);
        assert_eq!(by(BookSort::Price), vec!["3", "1", "2"]);
        assert_eq!(by(BookSort::Quantity), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_unique_categories_first_seen_order() {
        assert_eq!(unique_categories(&catalog()), vec!["علوم", "مغامرات"]);
    }

    fn order(id: &str, name: &str, government: &str, payment: &str, created_at: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "items": [],
            "totalAmount": 10,
            "government": government,
            "fullName": name,
            "address": "Street 1",
            "paymentMethod": payment,
            "status": "قيد الانتظار",
            "createdAt": created_at,
            "updatedAt": created_at
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-10-17T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_order_search_and_filters() {
        let orders = vec![
            order("aa11", "Sara Ahmed", "القاهرة", "cash", "2026-10-17T08:00:00Z"),
            order("bb22", "Omar", "الجيزة", "visa", "2026-10-12T08:00:00Z"),
        ];

        let filter = OrderFilter {
            search: Some("sara".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&orders, now()).len(), 1);

        let filter = OrderFilter {
            search: Some("BB2".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&orders, now()).first().unwrap().id.as_str(), "bb22");

        let filter = OrderFilter {
            payment_method: Some(PaymentMethod::Visa),
            government: Some("الجيزة".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&orders, now()).len(), 1);

        let filter = OrderFilter {
            status: Some(OrderStatus::Delivered),
            ..Default::default()
        };
        assert!(filter.apply(&orders, now()).is_empty());
        assert_eq!(orders.first().unwrap().total_amount, Decimal::from(10));
    }

    #[test]
    fn test_date_windows() {
        let at = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
        assert!(DateWindow::Today.contains(at("2026-10-17T00:00:01Z"), now()));
        assert!(!DateWindow::Today.contains(at("2026-10-16T23:59:59Z"), now()));
        assert!(DateWindow::Week.contains(at("2026-10-10T12:00:00Z"), now()));
        assert!(!DateWindow::Week.contains(at("2026-10-10T11:59:59Z"), now()));
        assert!(DateWindow::Month.contains(at("2026-09-17T12:00:00Z"), now()));
        assert!(DateWindow::Year.contains(at("2026-01-01T00:00:00Z"), now()));
        assert!(!DateWindow::Year.contains(at("2025-12-31T23:59:59Z"), now()));
    }
}
