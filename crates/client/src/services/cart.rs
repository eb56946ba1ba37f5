//! Cart state holder.
//!
//! Works in one of two [`Mode`]s, chosen at construction from the sign-in
//! state:
//!
//! - **Guest**: lines live in client storage under `guestCart`. Adding fetches
//!   the book and refuses any line quantity above its stock.
//! - **Authenticated**: the backend owns the cart and its answer replaces the
//!   local copy after every call.
//!
//! The mode is not re-evaluated on its own. After signing in, call
//! [`CartService::merge_cart_on_login`] to replay the guest lines into the
//! account one at a time. A 401/403 from the backend drops the holder back to
//! guest mode (signing out) and the operation is retried locally.

use std::sync::Arc;

use kotob_core::{Book, BookId, CartItem, cart_item_count, cart_subtotal, cart_total};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use super::auth::AuthService;
use super::books::BookService;
use super::local::{GuestList, MergeFailure, MergeReport, Mode};
use crate::api::{ApiClient, endpoints};
use crate::error::ClientError;
use crate::storage::keys;

/// Cart payload returned by every `/cart` endpoint. A body without the
/// list is a decode error, never an empty cart.
#[derive(Debug, Deserialize)]
struct CartResponse {
    #[serde(alias = "items")]
    cart: Vec<CartItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartLineRequest<'a> {
    book_id: &'a BookId,
    quantity: u32,
}

/// Cart state holder.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    api: ApiClient,
    auth: AuthService,
    books: BookService,
    guest: GuestList<CartItem>,
    /// Held for the whole of each operation so mutations never interleave.
    mode: Mutex<Mode>,
    items: watch::Sender<Vec<CartItem>>,
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("lines", &self.inner.items.borrow().len())
            .finish_non_exhaustive()
    }
}

impl CartService {
    /// Create the holder. The list starts empty; call [`CartService::reload`]
    /// to load it.
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthService, books: BookService) -> Self {
        let mode = Mode::for_login(auth.is_logged_in());
        debug!(?mode, "Cart mode selected");

        let guest = GuestList::new(Arc::clone(api.storage()), keys::GUEST_CART);
        let (items, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(CartServiceInner {
                api,
                auth,
                books,
                guest,
                mode: Mutex::new(mode),
                items,
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Current mode.
    pub async fn mode(&self) -> Mode {
        *self.inner.mode.lock().await
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.items.borrow().clone()
    }

    /// Receiver that observes every published cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.inner.items.subscribe()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        cart_item_count(&self.inner.items.borrow())
    }

    /// Whether the book has a line.
    #[must_use]
    pub fn is_in_cart(&self, book_id: &BookId) -> bool {
        self.inner
            .items
            .borrow()
            .iter()
            .any(|line| line.book_id() == book_id)
    }

    /// Sum of discounted line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        cart_subtotal(&self.inner.items.borrow())
    }

    /// Subtotal minus a manual discount.
    #[must_use]
    pub fn total(&self, discount: Decimal) -> Decimal {
        cart_total(&self.inner.items.borrow(), discount)
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Load the cart for the current mode and publish it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or storage cannot be read.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<Vec<CartItem>, ClientError> {
        let mut mode = self.inner.mode.lock().await;
        self.reload_locked(&mut mode).await
    }

    /// Add `quantity` units of a book, merging into an existing line.
    ///
    /// # Errors
    ///
    /// In guest mode, returns [`ClientError::InsufficientStock`] when the line
    /// would exceed the book's stock; the cart is left unchanged.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn add_to_cart(
        &self,
        book_id: &BookId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, ClientError> {
        if quantity == 0 {
            return Err(ClientError::InvalidQuantity);
        }

        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            match self.remote_add(book_id, quantity).await {
                Ok(items) => return Ok(self.publish(items)),
                Err(e) if e.is_unauthorized() => self.fall_back_to_guest(&mut mode)?,
                Err(e) => return Err(e),
            }
        }

        let book = self.inner.books.get(book_id).await?;
        let mut items = self.items();
        let current = items
            .iter()
            .find(|line| line.book_id() == book_id)
            .map_or(0, |line| line.quantity);
        let requested = current.saturating_add(quantity);
        check_stock(&book, requested)?;

        upsert_line(&mut items, book, requested);
        self.inner.guest.save(&items)?;
        debug!(quantity = requested, "Guest cart line added");
        Ok(self.publish(items))
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// In guest mode, returns [`ClientError::NotInCart`] for a book without a
    /// line and [`ClientError::InsufficientStock`] above the stock.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn update_quantity(
        &self,
        book_id: &BookId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, ClientError> {
        if quantity == 0 {
            return Err(ClientError::InvalidQuantity);
        }

        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .put::<_, CartResponse>(endpoints::cart::ROOT, &CartLineRequest { book_id, quantity })
                .await
                .map_err(ClientError::request("update cart", "فشل في تحديث الكمية"));
            match result {
                Ok(response) => return Ok(self.publish(response.cart)),
                Err(e) if e.is_unauthorized() => self.fall_back_to_guest(&mut mode)?,
                Err(e) => return Err(e),
            }
        }

        let mut items = self.items();
        if !items.iter().any(|line| line.book_id() == book_id) {
            return Err(ClientError::NotInCart(book_id.clone()));
        }
        let book = self.inner.books.get(book_id).await?;
        check_stock(&book, quantity)?;

        upsert_line(&mut items, book, quantity);
        self.inner.guest.save(&items)?;
        Ok(self.publish(items))
    }

    /// Remove a book's line.
    ///
    /// # Errors
    ///
    /// In guest mode, returns [`ClientError::NotInCart`] for a book without a
    /// line.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn remove_from_cart(&self, book_id: &BookId) -> Result<Vec<CartItem>, ClientError> {
        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .delete::<CartResponse>(&endpoints::cart::item(book_id))
                .await
                .map_err(ClientError::request("remove from cart", "فشل في إزالة العنصر"));
            match result {
                Ok(response) => return Ok(self.publish(response.cart)),
                Err(e) if e.is_unauthorized() => self.fall_back_to_guest(&mut mode)?,
                Err(e) => return Err(e),
            }
        }

        let mut items = self.items();
        let before = items.len();
        items.retain(|line| line.book_id() != book_id);
        if items.len() == before {
            return Err(ClientError::NotInCart(book_id.clone()));
        }
        self.inner.guest.save(&items)?;
        Ok(self.publish(items))
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or storage rejects the change.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ClientError> {
        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .post::<_, serde_json::Value>(endpoints::cart::CLEAR, &serde_json::json!({}))
                .await
                .map_err(ClientError::request("clear cart", "فشل في تفريغ السلة"));
            match result {
                Ok(_) => {
                    self.publish(Vec::new());
                    return Ok(());
                }
                Err(e) if e.is_unauthorized() => self.fall_back_to_guest(&mut mode)?,
                Err(e) => return Err(e),
            }
        }

        self.inner.guest.clear()?;
        self.publish(Vec::new());
        Ok(())
    }

    /// Move the guest cart into the signed-in account.
    ///
    /// Guest lines are replayed through the backend add call one at a time,
    /// each awaited before the next. Refused lines are collected in the
    /// report without stopping the merge. Once every line has been tried the
    /// guest cart is cleared and the account cart reloaded. With an empty
    /// guest cart this only reloads, so repeating a merge is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when signed out, or an error
    /// if storage or the final reload fails.
    #[instrument(skip(self))]
    pub async fn merge_cart_on_login(&self) -> Result<MergeReport, ClientError> {
        if !self.inner.auth.is_logged_in() {
            return Err(ClientError::NotAuthenticated);
        }

        let mut mode = self.inner.mode.lock().await;
        *mode = Mode::Authenticated;

        let guest_items = self.inner.guest.load()?;
        if guest_items.is_empty() {
            self.reload_locked(&mut mode).await?;
            return Ok(MergeReport::default());
        }

        info!(lines = guest_items.len(), "Merging guest cart into account");
        let mut report = MergeReport::default();
        for line in &guest_items {
            match self.remote_add(line.book_id(), line.quantity).await {
                Ok(_) => report.merged += 1,
                Err(e) => {
                    warn!(book_id = %line.book_id(), error = %e, "Guest cart line refused");
                    report.failures.push(MergeFailure {
                        book_id: line.book_id().clone(),
                        reason: e.user_message(),
                    });
                }
            }
        }

        self.inner.guest.clear()?;
        self.reload_locked(&mut mode).await?;
        info!(
            merged = report.merged,
            failed = report.failures.len(),
            "Guest cart merged"
        );
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn remote_add(&self, book_id: &BookId, quantity: u32) -> Result<Vec<CartItem>, ClientError> {
        let response: CartResponse = self
            .inner
            .api
            .post(endpoints::cart::ROOT, &CartLineRequest { book_id, quantity })
            .await
            .map_err(ClientError::request(
                "add to cart",
                "فشل في إضافة الكتاب إلى السلة",
            ))?;
        Ok(response.cart)
    }

    async fn reload_locked(&self, mode: &mut Mode) -> Result<Vec<CartItem>, ClientError> {
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .get::<CartResponse>(endpoints::cart::ROOT)
                .await
                .map_err(ClientError::request("load cart", "خطأ في تحميل السلة"));
            match result {
                Ok(response) => return Ok(self.publish(response.cart)),
                Err(e) if e.is_unauthorized() => {
                    self.fall_back_to_guest(mode)?;
                    return Ok(self.items());
                }
                Err(e) => return Err(e),
            }
        }

        let items = self.inner.guest.load()?;
        Ok(self.publish(items))
    }

    /// Sign out, switch to guest mode and publish the stored guest cart.
    fn fall_back_to_guest(&self, mode: &mut Mode) -> Result<(), ClientError> {
        warn!("Backend rejected credentials, switching cart to guest mode");
        self.inner.auth.logout()?;
        *mode = Mode::Guest;
        let items = self.inner.guest.load()?;
        self.publish(items);
        Ok(())
    }

    fn publish(&self, items: Vec<CartItem>) -> Vec<CartItem> {
        self.inner.items.send_replace(items.clone());
        items
    }
}

/// Refuse a line quantity above the book's stock.
fn check_stock(book: &Book, requested: u32) -> Result<(), ClientError> {
    if requested > book.quantity {
        return Err(ClientError::InsufficientStock {
            book_id: book.id.clone(),
            requested,
            available: book.quantity,
        });
    }
    Ok(())
}

/// Set the line for `book` to `quantity`, refreshing its snapshot.
fn upsert_line(items: &mut Vec<CartItem>, book: Book, quantity: u32) {
    if let Some(line) = items.iter_mut().find(|line| line.book.id == book.id) {
        line.book = book;
        line.quantity = quantity;
    } else {
        items.push(CartItem::new(book, quantity));
    }
}
