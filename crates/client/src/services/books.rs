//! Books catalog client.
//!
//! Catalog lists are retried on transient failures and cached with `moka`
//! for the configured TTL. Any write (create, update, delete, offer, stock)
//! invalidates the cache.

use std::sync::Arc;
use std::time::Duration;

use kotob_core::{Book, BookId};
use moka::future::Cache;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::api::{ApiClient, ApiError, MessageResponse, endpoints};
use crate::error::ClientError;
use crate::images::{ImageError, ImageUpload, validate_uploads};
use crate::validation::{FieldError, ValidationError, required};

const MAX_OFFER: Decimal = Decimal::ONE_HUNDRED;

/// Book fields submitted by the admin form.
///
/// Numeric fields are signed so that negative input reaches validation
/// instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub name: String,
    pub title: String,
    pub category: String,
    pub code: String,
    pub price: Decimal,
    pub quantity: i64,
    pub description: String,
    pub offer: Decimal,
}

impl BookForm {
    /// Validate the form fields.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        errors.check(required("name", &self.name, "اسم الكتاب مطلوب"));
        errors.check(required("title", &self.title, "عنوان الكتاب مطلوب"));
        errors.check(required("category", &self.category, "التصنيف مطلوب"));
        if self.price < Decimal::ZERO {
            errors.push(FieldError::new("price", "السعر يجب أن يكون 0 أو أكثر"));
        }
        if self.quantity < 0 {
            errors.push(FieldError::new("quantity", "الكمية يجب أن تكون 0 أو أكثر"));
        }
        if let Err(e) = check_offer(self.offer) {
            errors.push(e);
        }
        errors.into_result(|| ())
    }

    /// Multipart body: trimmed text fields plus one `imgs` part per image.
    fn into_multipart(self, images: Vec<ImageUpload>) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name.trim().to_string())
            .text("title", self.title.trim().to_string())
            .text("category", self.category.trim().to_string())
            .text("code", self.code.trim().to_string())
            .text("price", self.price.normalize().to_string())
            .text("quantity", self.quantity.to_string())
            .text("description", self.description.trim().to_string())
            .text("offer", self.offer.normalize().to_string());

        for image in images {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part("imgs", part);
        }
        Ok(form)
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            name: book.name.clone(),
            title: book.title.clone(),
            category: book.category.clone(),
            code: book.code.clone(),
            price: book.price,
            quantity: i64::from(book.quantity),
            description: book.description.clone(),
            offer: book.offer,
        }
    }
}

fn check_offer(offer: Decimal) -> Result<(), FieldError> {
    if offer < Decimal::ZERO || offer > MAX_OFFER {
        Err(FieldError::new("offer", "نسبة الخصم يجب أن تكون بين 0 و 100"))
    } else {
        Ok(())
    }
}

#[derive(Serialize)]
struct OfferRequest {
    #[serde(with = "rust_decimal::serde::float")]
    offer: Decimal,
}

#[derive(Serialize)]
struct StockRequest {
    quantity: u32,
}

// =============================================================================
// BookService
// =============================================================================

/// Client for the books catalog.
#[derive(Clone)]
pub struct BookService {
    inner: Arc<BookServiceInner>,
}

struct BookServiceInner {
    api: ApiClient,
    cache: Option<Cache<String, Arc<Vec<Book>>>>,
}

impl std::fmt::Debug for BookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookService")
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

const ALL_BOOKS_KEY: &str = "books:all";

impl BookService {
    /// Create a catalog client. A zero `cache_ttl` disables list caching.
    #[must_use]
    pub fn new(api: ApiClient, cache_ttl: Duration) -> Self {
        let cache = (!cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(100)
                .time_to_live(cache_ttl)
                .build()
        });
        Self {
            inner: Arc::new(BookServiceInner { api, cache }),
        }
    }

    async fn cached_list(&self, key: String, path: String) -> Result<Vec<Book>, ClientError> {
        if let Some(cache) = &self.inner.cache
            && let Some(books) = cache.get(&key).await
        {
            debug!(key = %key, "Book list cache hit");
            return Ok(books.as_ref().clone());
        }

        let books: Vec<Book> = self
            .inner
            .api
            .get_with_retry(&path)
            .await
            .map_err(ClientError::request("list books", "خطأ في تحميل الكتب"))?;

        if let Some(cache) = &self.inner.cache {
            cache.insert(key, Arc::new(books.clone())).await;
        }
        Ok(books)
    }

    /// Drop every cached list.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }

    /// All books.
    ///
    /// # Errors
    ///
    /// Returns an error once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Book>, ClientError> {
        self.cached_list(ALL_BOOKS_KEY.to_string(), endpoints::books::ALL.to_string())
            .await
    }

    /// Books in one category.
    ///
    /// # Errors
    ///
    /// Returns an error once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) -> Result<Vec<Book>, ClientError> {
        self.cached_list(
            format!("books:category:{category}"),
            endpoints::books::by_category(category),
        )
        .await
    }

    /// One book.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BookNotFound`] for an unknown ID.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn get(&self, id: &BookId) -> Result<Book, ClientError> {
        self.inner
            .api
            .get(&endpoints::books::by_id(id))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ClientError::BookNotFound(id.clone())
                } else {
                    ClientError::request("get book", "خطأ في تحميل الكتاب")(e)
                }
            })
    }

    /// Create a book. At least one image is required.
    ///
    /// # Errors
    ///
    /// Returns a validation or image error before sending anything, or the
    /// backend's rejection.
    #[instrument(skip(self, form, images), fields(name = %form.name, images = images.len()))]
    pub async fn create(&self, form: BookForm, images: Vec<ImageUpload>) -> Result<Book, ClientError> {
        form.validate()?;
        if images.is_empty() {
            return Err(ImageError::Missing.into());
        }
        validate_uploads(&images)?;

        let body = form.into_multipart(images)?;
        let book: Book = self
            .inner
            .api
            .post_multipart(endpoints::books::ALL, body)
            .await
            .map_err(ClientError::request("create book", "خطأ في إضافة الكتاب"))?;

        self.invalidate_cache();
        info!(book_id = %book.id, "Book created");
        Ok(book)
    }

    /// Update a book. New images are optional.
    ///
    /// # Errors
    ///
    /// Returns a validation or image error before sending anything, or the
    /// backend's rejection.
    #[instrument(skip(self, form, images), fields(book_id = %id, images = images.len()))]
    pub async fn update(
        &self,
        id: &BookId,
        form: BookForm,
        images: Vec<ImageUpload>,
    ) -> Result<Book, ClientError> {
        form.validate()?;
        validate_uploads(&images)?;

        let body = form.into_multipart(images)?;
        let book: Book = self
            .inner
            .api
            .put_multipart(&endpoints::books::by_id(id), body)
            .await
            .map_err(ClientError::request("update book", "خطأ في تحديث الكتاب"))?;

        self.invalidate_cache();
        info!(book_id = %book.id, "Book updated");
        Ok(book)
    }

    /// Delete a book. Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn delete(&self, id: &BookId) -> Result<Option<String>, ClientError> {
        let response: MessageResponse = self
            .inner
            .api
            .delete(&endpoints::books::by_id(id))
            .await
            .map_err(ClientError::request("delete book", "خطأ في حذف الكتاب"))?;

        self.invalidate_cache();
        info!("Book deleted");
        Ok(response.message)
    }

    /// Set the discount percentage (0-100).
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range offer, or the backend's
    /// rejection.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn set_offer(&self, id: &BookId, offer: Decimal) -> Result<Book, ClientError> {
        check_offer(offer).map_err(ValidationError::from)?;

        let book: Book = self
            .inner
            .api
            .put(&endpoints::books::offer(id), &OfferRequest { offer })
            .await
            .map_err(ClientError::request("set offer", "خطأ في إضافة العرض"))?;

        self.invalidate_cache();
        Ok(book)
    }

    /// Set the stock quantity.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn set_stock(&self, id: &BookId, quantity: u32) -> Result<Book, ClientError> {
        let book: Book = self
            .inner
            .api
            .put(&endpoints::books::stock(id), &StockRequest { quantity })
            .await
            .map_err(ClientError::request("set stock", "خطأ في تحديث المخزون"))?;

        self.invalidate_cache();
        Ok(book)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> BookForm {
        BookForm {
            name: " مغامرات ".to_string(),
            title: "رحلة".to_string(),
            category: "مغامرات".to_string(),
            price: Decimal::from(120),
            quantity: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_form_rules() {
        let bad = BookForm {
            name: "  ".to_string(),
            price: Decimal::from(-1),
            quantity: -2,
            offer: Decimal::from(101),
            ..form()
        };
        let err = bad.validate().unwrap_err();
        assert_eq!(err.message_for("name"), Some("اسم الكتاب مطلوب"));
        assert!(err.message_for("price").is_some());
        assert!(err.message_for("quantity").is_some());
        assert!(err.message_for("offer").is_some());
        assert!(err.message_for("title").is_none());
    }

    #[test]
    fn test_offer_bounds_are_inclusive() {
        assert!(check_offer(Decimal::ZERO).is_ok());
        assert!(check_offer(Decimal::ONE_HUNDRED).is_ok());
        assert!(check_offer(Decimal::new(-1, 1)).is_err());
    }

    #[test]
    fn test_offer_request_serializes_number() {
        let body = serde_json::to_value(OfferRequest {
            offer: Decimal::from(15),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"offer": 15.0}));
    }

    #[test]
    fn test_multipart_accepts_allowed_images() {
        let images = vec![ImageUpload::new("a.png", "image/png", vec![1, 2, 3])];
        assert!(form().into_multipart(images).is_ok());
    }

    #[test]
    fn test_form_from_book() {
        let book: Book = serde_json::from_value(serde_json::json!({
            "_id": "b1", "name": "n", "title": "t", "category": "c",
            "price": 50, "quantity": 7, "offer": 5
        }))
        .unwrap();
        let form = BookForm::from(&book);
        assert_eq!(form.quantity, 7);
        assert_eq!(form.offer, Decimal::from(5));
    }
}
