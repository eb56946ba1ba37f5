//! Favorites state holder.
//!
//! Same dual-mode discipline as the cart (see [`super::cart`]), with
//! membership only: a book is either a favorite or it is not. Guest favorites
//! live under `guestFavorites` and are merged into the account one at a time
//! after login.

use std::sync::Arc;

use kotob_core::{Book, BookId, FavoriteItem};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use super::auth::AuthService;
use super::books::BookService;
use super::local::{GuestList, MergeFailure, MergeReport, Mode};
use crate::api::{ApiClient, endpoints};
use crate::error::ClientError;
use crate::storage::keys;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoritesResponse {
    favorites: Vec<FavoriteItem>,
    #[serde(default)]
    is_added: Option<bool>,
    #[serde(default)]
    is_removed: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteRequest<'a> {
    book_id: &'a BookId,
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub is_added: bool,
    pub is_removed: bool,
}

/// Favorites state holder.
#[derive(Clone)]
pub struct FavoritesService {
    inner: Arc<FavoritesServiceInner>,
}

struct FavoritesServiceInner {
    api: ApiClient,
    auth: AuthService,
    books: BookService,
    guest: GuestList<FavoriteItem>,
    mode: Mutex<Mode>,
    items: watch::Sender<Vec<FavoriteItem>>,
}

impl std::fmt::Debug for FavoritesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesService")
            .field("favorites", &self.inner.items.borrow().len())
            .finish_non_exhaustive()
    }
}

impl FavoritesService {
    /// Create the holder. The list starts empty; call
    /// [`FavoritesService::reload`] to load it.
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthService, books: BookService) -> Self {
        let mode = Mode::for_login(auth.is_logged_in());
        debug!(?mode, "Favorites mode selected");

        let guest = GuestList::new(Arc::clone(api.storage()), keys::GUEST_FAVORITES);
        let (items, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(FavoritesServiceInner {
                api,
                auth,
                books,
                guest,
                mode: Mutex::new(mode),
                items,
            }),
        }
    }

    /// Current mode.
    pub async fn mode(&self) -> Mode {
        *self.inner.mode.lock().await
    }

    /// Snapshot of the current favorites.
    #[must_use]
    pub fn items(&self) -> Vec<FavoriteItem> {
        self.inner.items.borrow().clone()
    }

    /// Receiver that observes every published list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<FavoriteItem>> {
        self.inner.items.subscribe()
    }

    /// Whether the book is a favorite.
    #[must_use]
    pub fn is_favorited(&self, book_id: &BookId) -> bool {
        self.inner
            .items
            .borrow()
            .iter()
            .any(|item| item.book_id() == book_id)
    }

    /// Load favorites for the current mode and publish them.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or storage cannot be read.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<Vec<FavoriteItem>, ClientError> {
        let mut mode = self.inner.mode.lock().await;
        self.reload_locked(&mut mode).await
    }

    /// Add a book. Adding a book that is already a favorite reports
    /// `false` and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the book cannot be fetched (guest mode) or the
    /// backend refuses.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn add_to_favorites(&self, book_id: &BookId) -> Result<bool, ClientError> {
        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            match self.remote_add(book_id).await {
                Ok(is_added) => return Ok(is_added),
                Err(e) if e.is_unauthorized() => self.fall_back_to_guest(&mut mode)?,
                Err(e) => return Err(e),
            }
        }

        let book = self.inner.books.get(book_id).await?;
        let mut items = self.items();
        let added = insert_favorite(&mut items, book);
        if added {
            self.inner.guest.save(&items)?;
            self.publish(items);
            debug!("Guest favorite added");
        }
        Ok(added)
    }

    /// Remove a book.
    ///
    /// # Errors
    ///
    /// In guest mode, returns [`ClientError::NotInFavorites`] for a book that
    /// is not a favorite.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn remove_from_favorites(&self, book_id: &BookId) -> Result<bool, ClientError> {
        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .delete::<FavoritesResponse>(&endpoints::favorites::item(book_id))
                .await
                .map_err(ClientError::request(
                    "remove favorite",
                    "فشل في إزالة الكتاب من المفضلة",
                ));
            match result {
                Ok(response) => {
                    let removed = response.is_removed.unwrap_or(true);
                    self.publish(response.favorites);
                    return Ok(removed);
                }
                Err(e) if e.is_unauthorized() => self.fall_back_to_guest(&mut mode)?,
                Err(e) => return Err(e),
            }
        }

        let mut items = self.items();
        let before = items.len();
        items.retain(|item| item.book_id() != book_id);
        if items.len() == before {
            return Err(ClientError::NotInFavorites(book_id.clone()));
        }
        self.inner.guest.save(&items)?;
        self.publish(items);
        Ok(true)
    }

    /// Add the book if it is not a favorite, remove it otherwise.
    ///
    /// # Errors
    ///
    /// See [`FavoritesService::add_to_favorites`] and
    /// [`FavoritesService::remove_from_favorites`].
    pub async fn toggle_favorite(&self, book_id: &BookId) -> Result<ToggleOutcome, ClientError> {
        if self.is_favorited(book_id) {
            let is_removed = self.remove_from_favorites(book_id).await?;
            Ok(ToggleOutcome {
                is_added: false,
                is_removed,
            })
        } else {
            let is_added = self.add_to_favorites(book_id).await?;
            Ok(ToggleOutcome {
                is_added,
                is_removed: false,
            })
        }
    }

    /// Remove every favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or storage rejects the change.
    #[instrument(skip(self))]
    pub async fn clear_favorites(&self) -> Result<(), ClientError> {
        let mut mode = self.inner.mode.lock().await;
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .post::<_, serde_json::Value>(endpoints::favorites::CLEAR, &serde_json::json!({}))
                .await
                .map_err(ClientError::request("clear favorites", "خطأ في مسح المفضلة"));
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

    /// Move guest favorites into the signed-in account.
    ///
    /// Same sequence as [`super::cart::CartService::merge_cart_on_login`]:
    /// one awaited backend add per guest favorite, failures collected, then
    /// the guest list is cleared and the account list reloaded.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when signed out, or an error
    /// if storage or the final reload fails.
    #[instrument(skip(self))]
    pub async fn merge_favorites_on_login(&self) -> Result<MergeReport, ClientError> {
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

        info!(favorites = guest_items.len(), "Merging guest favorites into account");
        let mut report = MergeReport::default();
        for item in &guest_items {
            match self.remote_add(item.book_id()).await {
                Ok(_) => report.merged += 1,
                Err(e) => {
                    warn!(book_id = %item.book_id(), error = %e, "Guest favorite refused");
                    report.failures.push(MergeFailure {
                        book_id: item.book_id().clone(),
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
            "Guest favorites merged"
        );
        Ok(report)
    }

    async fn remote_add(&self, book_id: &BookId) -> Result<bool, ClientError> {
        let response: FavoritesResponse = self
            .inner
            .api
            .post(endpoints::favorites::ROOT, &FavoriteRequest { book_id })
            .await
            .map_err(ClientError::request(
                "add favorite",
                "فشل في إضافة الكتاب إلى المفضلة",
            ))?;
        let added = response.is_added.unwrap_or(true);
        self.publish(response.favorites);
        Ok(added)
    }

    async fn reload_locked(&self, mode: &mut Mode) -> Result<Vec<FavoriteItem>, ClientError> {
        if *mode == Mode::Authenticated {
            let result = self
                .inner
                .api
                .get::<FavoritesResponse>(endpoints::favorites::ROOT)
                .await
                .map_err(ClientError::request("load favorites", "خطأ في تحميل المفضلة"));
            match result {
                Ok(response) => return Ok(self.publish(response.favorites)),
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

    fn fall_back_to_guest(&self, mode: &mut Mode) -> Result<(), ClientError> {
        warn!("Backend rejected credentials, switching favorites to guest mode");
        self.inner.auth.logout()?;
        *mode = Mode::Guest;
        let items = self.inner.guest.load()?;
        self.publish(items);
        Ok(())
    }

    fn publish(&self, items: Vec<FavoriteItem>) -> Vec<FavoriteItem> {
        self.inner.items.send_replace(items.clone());
        items
    }
}

/// Add `book` unless it is already present. Returns whether it was added.
fn insert_favorite(items: &mut Vec<FavoriteItem>, book: Book) -> bool {
    if items.iter().any(|item| item.book.id == book.id) {
        return false;
    }
    items.push(FavoriteItem::new(book));
    true
}
