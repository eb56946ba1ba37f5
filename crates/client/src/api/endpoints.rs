//! REST endpoint paths, relative to the configured API base URL.

use kotob_core::{BookId, OrderId};

pub const REGISTER: &str = "/auth/register";
pub const LOGIN: &str = "/auth/login";
pub const FORGOT_PASSWORD: &str = "/auth/forgetpassword";

/// Password reset endpoint for an emailed reset token.
#[must_use]
pub fn reset_password(token: &str) -> String {
    format!("/auth/resetpassword/{}", urlencoding::encode(token))
}

pub mod books {
    use super::BookId;

    pub const ALL: &str = "/books";

    #[must_use]
    pub fn by_id(id: &BookId) -> String {
        format!("/books/{}", urlencoding::encode(id.as_str()))
    }

    /// Catalog filtered by category; the category is percent-encoded.
    #[must_use]
    pub fn by_category(category: &str) -> String {
        format!("/books?category={}", urlencoding::encode(category))
    }

    #[must_use]
    pub fn offer(id: &BookId) -> String {
        format!("{}/offer", by_id(id))
    }

    #[must_use]
    pub fn stock(id: &BookId) -> String {
        format!("{}/stock", by_id(id))
    }
}

pub mod cart {
    use super::BookId;

    pub const ROOT: &str = "/cart";
    pub const CLEAR: &str = "/cart/clear";

    #[must_use]
    pub fn item(book_id: &BookId) -> String {
        format!("/cart/{}", urlencoding::encode(book_id.as_str()))
    }
}

pub mod favorites {
    use super::BookId;

    pub const ROOT: &str = "/favorites";
    pub const CLEAR: &str = "/favorites/clear";

    #[must_use]
    pub fn item(book_id: &BookId) -> String {
        format!("/favorites/{}", urlencoding::encode(book_id.as_str()))
    }
}

pub mod orders {
    use super::OrderId;

    pub const ROOT: &str = "/orders";

    #[must_use]
    pub fn by_id(id: &OrderId) -> String {
        format!("/orders/{}", urlencoding::encode(id.as_str()))
    }

    #[must_use]
    pub fn status(id: &OrderId) -> String {
        format!("{}/status", by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_paths() {
        let id = BookId::new("66aa01");
        assert_eq!(books::by_id(&id), "/books/66aa01");
        assert_eq!(books::offer(&id), "/books/66aa01/offer");
        assert_eq!(books::stock(&id), "/books/66aa01/stock");
    }

    #[test]
    fn test_category_is_percent_encoded() {
        assert_eq!(
            books::by_category("قصص أطفال"),
            "/books?category=%D9%82%D8%B5%D8%B5%20%D8%A3%D8%B7%D9%81%D8%A7%D9%84"
        );
        assert_eq!(books::by_category("a&b"), "/books?category=a%26b");
    }

    #[test]
    fn test_cart_favorites_and_order_paths() {
        let book = BookId::new("b1");
        assert_eq!(cart::item(&book), "/cart/b1");
        assert_eq!(favorites::item(&book), "/favorites/b1");

        let order = OrderId::new("o1");
        assert_eq!(orders::by_id(&order), "/orders/o1");
        assert_eq!(orders::status(&order), "/orders/o1/status");
        assert_eq!(reset_password("tok"), "/auth/resetpassword/tok");
    }
}
