//! Client state shared across front-end commands.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::checkout::CheckoutService;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::services::{
    AuthService, BookService, CartService, DashboardService, FavoritesService, OrderService,
};
use crate::storage::{FileStorage, SharedStorage};

/// Every state holder and API client, wired to one storage and one HTTP
/// client.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    storage: SharedStorage,
    api: ApiClient,
    auth: AuthService,
    books: BookService,
    cart: CartService,
    favorites: FavoritesService,
    orders: OrderService,
    checkout: CheckoutService,
    dashboard: DashboardService,
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("logged_in", &self.inner.auth.is_logged_in())
            .finish_non_exhaustive()
    }
}

impl ClientState {
    /// Wire the services over an explicit storage handle.
    ///
    /// Cart and favorites start empty; call [`ClientState::init`] to load
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: SharedStorage) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config, Arc::clone(&storage))?;
        let auth = AuthService::new(api.clone());
        let books = BookService::new(api.clone(), config.catalog_cache_ttl);
        let cart = CartService::new(api.clone(), auth.clone(), books.clone());
        let favorites = FavoritesService::new(api.clone(), auth.clone(), books.clone());
        let orders = OrderService::new(api.clone());
        let checkout = CheckoutService::new(cart.clone(), orders.clone());
        let dashboard = DashboardService::new(books.clone(), orders.clone());

        Ok(Self {
            inner: Arc::new(ClientStateInner {
                config,
                storage,
                api,
                auth,
                books,
                cart,
                favorites,
                orders,
                checkout,
                dashboard,
            }),
        })
    }

    /// Open the file store named by the configuration and wire the services.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the HTTP client
    /// cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = FileStorage::shared(config.storage_file())?;
        Self::new(config, storage)
    }

    /// Load cart and favorites for the current mode.
    ///
    /// # Errors
    ///
    /// Returns an error if either list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<(), ClientError> {
        let (cart, favorites) = tokio::try_join!(self.inner.cart.reload(), self.inner.favorites.reload())?;
        debug!(
            cart_lines = cart.len(),
            favorites = favorites.len(),
            "Client state loaded"
        );
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn books(&self) -> &BookService {
        &self.inner.books
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesService {
        &self.inner.favorites
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    #[must_use]
    pub fn dashboard(&self) -> &DashboardService {
        &self.inner.dashboard
    }
}
