//! Client-side form validation.
//!
//! Each rule yields a [`FieldError`] carrying the Arabic message shown next to
//! the offending field. A form is validated as a whole and every failing field
//! is reported, in form order.

use std::borrow::Cow;
use std::sync::LazyLock;

use kotob_core::Email;
use regex::Regex;
use secrecy::SecretString;
use thiserror::Error;

use crate::services::auth::{Credentials, Registration};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("Invalid regex")
});

/// Allowed password characters; letter and digit presence is checked separately.
static PASSWORD_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\d@$!%*#?&]{8,}$").expect("Invalid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{10,15}$").expect("Invalid regex"));

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_NAME_LEN: usize = 3;
pub const MIN_ADDRESS_LEN: usize = 5;
pub const MIN_AGE: u32 = 18;

/// A single failed rule on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: Cow<'static, str>,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every failed rule of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure.
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Record the failure of a rule, if any.
    pub fn check(&mut self, result: Result<(), FieldError>) {
        if let Err(e) = result {
            self.push(e);
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First failure's message for the given field.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_ref())
    }

    /// Message of the first failure, used as the headline.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_ref())
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_ref())
            .collect::<Vec<_>>()
            .join("، ")
    }

    /// `Ok(value)` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one rule failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

// =============================================================================
// Field rules
// =============================================================================

/// Non-blank after trimming.
///
/// # Errors
///
/// Returns `message` for blank input.
pub fn required(field: &'static str, value: &str, message: &'static str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::new(field, message))
    } else {
        Ok(())
    }
}

/// At least `min` characters after trimming.
///
/// # Errors
///
/// Returns `message` for shorter input.
pub fn min_chars(
    field: &'static str,
    value: &str,
    min: usize,
    message: &'static str,
) -> Result<(), FieldError> {
    if value.trim().chars().count() < min {
        Err(FieldError::new(field, message))
    } else {
        Ok(())
    }
}

/// Validate an email address.
///
/// # Errors
///
/// Returns the "required" message for blank input and the format message
/// when the address does not match the accepted pattern.
pub fn validate_email(value: &str) -> Result<Email, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new("email", "البريد الإلكتروني مطلوب"));
    }
    if !EMAIL_RE.is_match(value) {
        return Err(FieldError::new("email", "تنسيق البريد الإلكتروني غير صحيح"));
    }
    Email::parse(value).map_err(|_| FieldError::new("email", "يرجى إدخال بريد إلكتروني صحيح"))
}

/// Validate a password: required, at least 8 characters, letters and digits
/// drawn from `[A-Za-z0-9@$!%*#?&]`, with at least one of each.
///
/// # Errors
///
/// Returns the message of the first failing rule.
pub fn validate_password(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::new("password", "كلمة المرور مطلوبة"));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(FieldError::new(
            "password",
            "كلمة المرور يجب أن تكون 8 أحرف على الأقل",
        ));
    }
    let has_letter = value.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !(PASSWORD_CHARSET_RE.is_match(value) && has_letter && has_digit) {
        return Err(FieldError::new(
            "password",
            "كلمة المرور يجب أن تحتوي على أحرف وأرقام",
        ));
    }
    Ok(())
}

/// Validate a phone number: optional leading `+`, then 10 to 15 digits.
///
/// # Errors
///
/// Returns the message of the first failing rule.
pub fn validate_phone(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new("phone", "رقم الهاتف مطلوب"));
    }
    if !PHONE_RE.is_match(value) {
        return Err(FieldError::new("phone", "يرجى إدخال رقم هاتف صحيح"));
    }
    Ok(())
}

// =============================================================================
// Forms
// =============================================================================

/// Login form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Validate and convert into login credentials.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(self) -> Result<Credentials, ValidationError> {
        let mut errors = ValidationError::new();
        let email = validate_email(&self.email).map_err(|e| errors.push(e)).ok();
        errors.check(validate_password(&self.password));

        match email {
            Some(email) if errors.is_empty() => Ok(Credentials {
                email,
                password: SecretString::from(self.password),
            }),
            _ => Err(errors),
        }
    }
}

/// Registration form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub address: String,
    pub age: Option<u32>,
}

impl RegisterForm {
    /// Validate and convert into a registration request.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let mut errors = ValidationError::new();

        errors.check(required("name", &self.name, "الاسم الكامل مطلوب").and_then(|()| {
            min_chars(
                "name",
                &self.name,
                MIN_NAME_LEN,
                "الاسم يجب أن يكون 3 أحرف على الأقل",
            )
        }));
        let email = validate_email(&self.email).map_err(|e| errors.push(e)).ok();
        errors.check(validate_password(&self.password));
        if self.confirm_password.is_empty() {
            errors.push(FieldError::new("confirmPassword", "تأكيد كلمة المرور مطلوب"));
        } else if self.confirm_password != self.password {
            errors.push(FieldError::new("confirmPassword", "كلمة المرور غير متطابقة"));
        }
        errors.check(validate_phone(&self.phone));
        errors.check(required("address", &self.address, "العنوان مطلوب").and_then(|()| {
            min_chars(
                "address",
                &self.address,
                MIN_ADDRESS_LEN,
                "العنوان يجب أن يكون 5 أحرف على الأقل",
            )
        }));
        let age = match self.age {
            None => {
                errors.push(FieldError::new("age", "العمر مطلوب"));
                None
            }
            Some(age) if age < MIN_AGE => {
                errors.push(FieldError::new("age", "العمر يجب أن يكون 18 عامًا أو أكثر"));
                None
            }
            Some(age) => Some(age),
        };

        match (email, age) {
            (Some(email), Some(age)) if errors.is_empty() => Ok(Registration {
                name: self.name.trim().to_string(),
                email,
                password: SecretString::from(self.password),
                phone: self.phone.trim().to_string(),
                address: self.address.trim().to_string(),
                age,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            name: "منى علي".to_string(),
            email: "mona@example.com".to_string(),
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
            phone: "+201001234567".to_string(),
            address: "شارع التحرير 5".to_string(),
            age: Some(30),
        }
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(
            validate_email("").unwrap_err().message,
            "البريد الإلكتروني مطلوب"
        );
        assert_eq!(
            validate_email("user@localhost").unwrap_err().message,
            "تنسيق البريد الإلكتروني غير صحيح"
        );
        assert_eq!(
            validate_email(" reader@example.org ").unwrap().as_str(),
            "reader@example.org"
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("abc12345").is_ok());
        assert!(validate_password("P@ssw0rd!").is_ok());
        assert_eq!(
            validate_password("abc1").unwrap_err().message,
            "كلمة المرور يجب أن تكون 8 أحرف على الأقل"
        );
        // Letters only, digits only, and disallowed characters all fail the pattern.
        for bad in ["abcdefgh", "12345678", "abc 12345", "abcd1234^"] {
            assert_eq!(
                validate_password(bad).unwrap_err().message,
                "كلمة المرور يجب أن تحتوي على أحرف وأرقام",
                "{bad}"
            );
        }
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("01001234567").is_ok());
        assert!(validate_phone("+201001234567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("0100-123-4567").is_err());
    }

    #[test]
    fn test_login_form_collects_all_errors() {
        let err = LoginForm {
            email: String::new(),
            password: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.errors().len(), 2);
        assert_eq!(err.message_for("password"), Some("كلمة المرور مطلوبة"));
        assert_eq!(err.first_message(), Some("البريد الإلكتروني مطلوب"));
    }

    #[test]
    fn test_register_form_valid() {
        let registration = register_form().validate().unwrap();
        assert_eq!(registration.name, "منى علي");
        assert_eq!(registration.age, 30);
    }

    #[test]
    fn test_register_form_rules() {
        let form = RegisterForm {
            name: "مي".to_string(),
            confirm_password: "different1".to_string(),
            address: "abc".to_string(),
            age: Some(17),
            ..register_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(
            err.message_for("name"),
            Some("الاسم يجب أن يكون 3 أحرف على الأقل")
        );
        assert_eq!(
            err.message_for("confirmPassword"),
            Some("كلمة المرور غير متطابقة")
        );
        assert_eq!(
            err.message_for("address"),
            Some("العنوان يجب أن يكون 5 أحرف على الأقل")
        );
        assert_eq!(
            err.message_for("age"),
            Some("العمر يجب أن يكون 18 عامًا أو أكثر")
        );
        assert!(err.message_for("email").is_none());
    }

    #[test]
    fn test_register_form_requires_age() {
        let form = RegisterForm {
            age: None,
            ..register_form()
        };
        assert_eq!(
            form.validate().unwrap_err().message_for("age"),
            Some("العمر مطلوب")
        );
    }
}
