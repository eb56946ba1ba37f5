//! Checkout: shipping form, coupon and order placement.
//!
//! The backend builds the order from the signed-in user's server-side cart,
//! so checkout only sends the shipping details. Once the order is placed the
//! cart is cleared.

use kotob_core::{NewOrder, Order, PaymentMethod};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::error::ClientError;
use crate::services::{CartService, Mode, OrderService};
use crate::validation::{FieldError, ValidationError, required};

/// The only coupon the storefront accepts.
pub const COUPON_CODE: &str = "DISCOUNT10";

/// Discount granted by [`COUPON_CODE`], in percent.
pub const COUPON_PERCENT: u32 = 10;

const REQUIRED_FIELDS_MESSAGE: &str = "يرجى ملء جميع الحقول المطلوبة";

/// Governorates offered in the shipping form.
pub const GOVERNORATES: [&str; 26] = [
    "القاهرة",
    "الجيزة",
    "الإسكندرية",
    "الدقهلية",
    "البحر الأحمر",
    "البحيرة",
    "الفيوم",
    "الغربية",
    "الإسماعيلية",
    "المنوفية",
    "المنيا",
    "القليوبية",
    "الأقصر",
    "أسوان",
    "أسيوط",
    "بني سويف",
    "بورسعيد",
    "دمياط",
    "السويس",
    "الشرقية",
    "كفر الشيخ",
    "مطروح",
    "قنا",
    "شمال سيناء",
    "جنوب سيناء",
    "سوهاج",
];

/// Whether `name` is one of [`GOVERNORATES`].
#[must_use]
pub fn is_governorate(name: &str) -> bool {
    GOVERNORATES.contains(&name.trim())
}

/// Discount for `code` on `subtotal`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidCoupon`] for any code other than
/// [`COUPON_CODE`]; the caller should treat the discount as zero.
pub fn apply_coupon(code: &str, subtotal: Decimal) -> Result<Decimal, ClientError> {
    if code.trim() == COUPON_CODE {
        Ok(subtotal * Decimal::from(COUPON_PERCENT) / Decimal::ONE_HUNDRED)
    } else {
        Err(ClientError::InvalidCoupon(code.to_string()))
    }
}

/// Shipping details as entered by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingForm {
    pub government: String,
    pub full_name: String,
    pub address: String,
    pub payment_method: Option<PaymentMethod>,
    pub sale_code: String,
    pub notes: String,
}

impl ShippingForm {
    /// Check the required fields and build the order payload. Blank sale
    /// code and notes are left out.
    ///
    /// # Errors
    ///
    /// Returns every missing field, each carrying the same Arabic message.
    pub fn validate(self) -> Result<NewOrder, ValidationError> {
        let mut errors = ValidationError::new();
        errors.check(required("government", &self.government, REQUIRED_FIELDS_MESSAGE));
        if !self.government.trim().is_empty() && !is_governorate(&self.government) {
            errors.push(FieldError::new("government", "يرجى اختيار محافظة صحيحة"));
        }
        errors.check(required("fullName", &self.full_name, REQUIRED_FIELDS_MESSAGE));
        errors.check(required("address", &self.address, REQUIRED_FIELDS_MESSAGE));
        if self.payment_method.is_none() {
            errors.push(FieldError::new("paymentMethod", REQUIRED_FIELDS_MESSAGE));
        }

        errors.into_result(|| NewOrder {
            government: self.government.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            address: self.address.trim().to_string(),
            payment_method: self.payment_method.unwrap_or_default(),
            sale_code: non_blank(self.sale_code),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Places orders from the signed-in user's cart.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    cart: CartService,
    orders: OrderService,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(cart: CartService, orders: OrderService) -> Self {
        Self { cart, orders }
    }

    /// Validate the form, place the order and clear the cart.
    ///
    /// A failure to clear the cart after the order is placed is logged and
    /// does not fail the checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] for a guest cart,
    /// [`ClientError::EmptyCart`] when there is nothing to order, a
    /// validation error for an incomplete form, or the backend's rejection.
    #[instrument(skip(self, form))]
    pub async fn checkout(&self, form: ShippingForm) -> Result<Order, ClientError> {
        if self.cart.mode().await != Mode::Authenticated {
            return Err(ClientError::NotAuthenticated);
        }
        if self.cart.items().is_empty() {
            return Err(ClientError::EmptyCart);
        }
        let new_order = form.validate()?;

        let order = self.orders.create(&new_order).await?;
        if let Err(e) = self.cart.clear_cart().await {
            warn!(order_id = %order.id, error = %e, "Order placed but cart could not be cleared");
        }
        info!(order_id = %order.id, "Checkout complete");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ShippingForm {
        ShippingForm {
            government: "الجيزة".to_string(),
            full_name: " Mona Adel ".to_string(),
            address: "12 Nile St".to_string(),
            payment_method: Some(PaymentMethod::Visa),
            sale_code: "  ".to_string(),
            notes: "ring twice".to_string(),
        }
    }

    #[test]
    fn test_coupon_gives_ten_percent() {
        assert_eq!(
            apply_coupon("DISCOUNT10", Decimal::from(460)).unwrap(),
            Decimal::from(46)
        );
    }

    #[test]
    fn test_unknown_coupon_is_rejected() {
        let err = apply_coupon("DISCOUNT50", Decimal::from(100)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCoupon(code) if code == "DISCOUNT50"));
        assert!(apply_coupon("discount10", Decimal::from(100)).is_err());
    }

    #[test]
    fn test_governorates() {
        assert_eq!(GOVERNORATES.len(), 26);
        assert!(is_governorate("سوهاج"));
        assert!(!is_governorate("Paris"));
    }

    #[test]
    fn test_valid_form_drops_blank_optionals() {
        let order = form().validate().unwrap();
        assert_eq!(order.full_name, "Mona Adel");
        assert_eq!(order.payment_method, PaymentMethod::Visa);
        assert!(order.sale_code.is_none());
        assert_eq!(order.notes.as_deref(), Some("ring twice"));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let err = ShippingForm {
            address: String::new(),
            payment_method: None,
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.message_for("address"), Some(REQUIRED_FIELDS_MESSAGE));
        assert_eq!(err.message_for("paymentMethod"), Some(REQUIRED_FIELDS_MESSAGE));
        assert!(err.message_for("fullName").is_none());
    }

    #[test]
    fn test_unknown_governorate_is_rejected() {
        let err = ShippingForm {
            government: "Atlantis".to_string(),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert!(err.message_for("government").is_some());
    }
}
