//! Unified client error.
//!
//! Every fallible operation of the state holders returns [`ClientError`].
//! [`ClientError::user_message`] turns it into the Arabic text shown to the
//! shopper or administrator; the `Display` impl stays technical for logs.

use kotob_core::{BookId, OrderId, OrderStatus};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::images::ImageError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

const GENERIC_MESSAGE: &str = "حدث خطأ ما. يرجى المحاولة مرة أخرى.";
const NETWORK_MESSAGE: &str = "تعذر الاتصال بالخادم. تحقق من اتصالك بالإنترنت.";

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// API call failed with no operation-specific fallback message.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// API call failed; `fallback` is shown when the backend sent no message.
    #[error("{operation} failed: {source}")]
    Request {
        operation: &'static str,
        fallback: &'static str,
        #[source]
        source: ApiError,
    },

    /// A form failed client-side validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An image upload was rejected before submission.
    #[error("Image rejected: {0}")]
    Image(#[from] ImageError),

    /// The requested cart quantity exceeds the stock.
    #[error("Insufficient stock for {book_id}: requested {requested}, available {available}")]
    InsufficientStock {
        book_id: BookId,
        requested: u32,
        available: u32,
    },

    /// Quantities must be at least one.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// The book has no cart line.
    #[error("Book {0} is not in the cart")]
    NotInCart(BookId),

    /// The book is not a favorite.
    #[error("Book {0} is not in favorites")]
    NotInFavorites(BookId),

    /// The book does not exist.
    #[error("Book {0} not found")]
    BookNotFound(BookId),

    /// The order is delivered and can no longer change.
    #[error("Order {0} is delivered and locked")]
    OrderLocked(OrderId),

    /// The order already has the requested status.
    #[error("Order already has status {0}")]
    StatusUnchanged(OrderStatus),

    /// Unknown coupon code.
    #[error("Invalid coupon code: {0}")]
    InvalidCoupon(String),

    /// Checkout needs at least one cart line.
    #[error("Cart is empty")]
    EmptyCart,

    /// The operation needs a signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Wrap an API error with an operation name and its Arabic fallback message.
    pub fn request(operation: &'static str, fallback: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::Request {
            operation,
            fallback,
            source,
        }
    }

    /// The underlying API error, if this came from the backend.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) | Self::Request { source: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Whether the backend rejected the stored credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_unauthorized)
    }

    /// Whether the backend reported the resource missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Message to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!("إعدادات غير صحيحة: {e}"),
            Self::Storage(_) => "تعذر حفظ البيانات على هذا الجهاز".to_string(),
            Self::Api(e) => api_message(e, GENERIC_MESSAGE),
            Self::Request {
                fallback, source, ..
            } => api_message(source, fallback),
            Self::Validation(e) => e
                .first_message()
                .unwrap_or("يرجى ملء جميع الحقول المطلوبة")
                .to_string(),
            Self::Image(e) => e.to_string(),
            Self::InsufficientStock { available, .. } => {
                format!("الكمية المطلوبة غير متوفرة في المخزون (المتاح: {available})")
            }
            Self::InvalidQuantity => "الكمية يجب أن تكون 1 على الأقل".to_string(),
            Self::NotInCart(_) => "الكتاب غير موجود في السلة".to_string(),
            Self::NotInFavorites(_) => "الكتاب غير موجود في المفضلة".to_string(),
            Self::BookNotFound(_) => "الكتاب غير موجود".to_string(),
            Self::OrderLocked(_) => "لا يمكن تعديل أو حذف طلب تم تسليمه".to_string(),
            Self::StatusUnchanged(status) => format!("الطلب بالفعل في حالة {status}"),
            Self::InvalidCoupon(_) => "كوبون غير صالح".to_string(),
            Self::EmptyCart => "السلة فارغة".to_string(),
            Self::NotAuthenticated => "يرجى تسجيل الدخول أولاً".to_string(),
        }
    }
}

/// Backend message, else a transport message, else the fallback.
fn api_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Status { message: Some(m), .. } => m.clone(),
        ApiError::Http(e) if e.is_connect() || e.is_timeout() => NETWORK_MESSAGE.to_string(),
        _ => fallback.to_string(),
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: Option<&str>) -> ApiError {
        ApiError::Status {
            status: code,
            message: message.map(String::from),
        }
    }

    #[test]
    fn test_request_prefers_backend_message() {
        let err = ClientError::request("create order", "فشل في إنشاء الطلب")(status(
            400,
            Some("السلة فارغة"),
        ));
        assert_eq!(err.user_message(), "السلة فارغة");
    }

    #[test]
    fn test_request_falls_back_to_fixed_message() {
        let err = ClientError::request("delete order", "فشل في حذف الطلب")(status(500, None));
        assert_eq!(err.user_message(), "فشل في حذف الطلب");
        assert_eq!(
            ClientError::Api(status(500, None)).user_message(),
            GENERIC_MESSAGE
        );
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ClientError::Api(status(401, None)).is_unauthorized());
        assert!(ClientError::request("x", "y")(status(403, None)).is_unauthorized());
        assert!(!ClientError::EmptyCart.is_unauthorized());
        assert!(ClientError::Api(status(404, None)).is_not_found());
    }

    #[test]
    fn test_domain_messages() {
        let err = ClientError::InsufficientStock {
            book_id: BookId::new("b1"),
            requested: 5,
            available: 3,
        };
        assert!(err.user_message().contains('3'));
        assert_eq!(
            ClientError::OrderLocked(OrderId::new("o1")).user_message(),
            "لا يمكن تعديل أو حذف طلب تم تسليمه"
        );
        assert_eq!(
            ClientError::StatusUnchanged(OrderStatus::Pending).user_message(),
            "الطلب بالفعل في حالة قيد الانتظار"
        );
    }
}
