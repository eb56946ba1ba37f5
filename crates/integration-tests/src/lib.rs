//! Integration tests for Kotob.
//!
//! [`FakeBackend`] serves the bookstore REST contract from memory on an
//! ephemeral local port, so the tests in `tests/` drive the real client over
//! real HTTP without any external service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kotob-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `guest_cart` - Guest cart and stock checks
//! - `merge_on_login` - Guest cart/favorites replay after sign-in
//! - `session` - Login, logout and the 401 fallback to guest mode
//! - `favorites` - Favorites toggling in both modes
//! - `admin_orders` - Checkout, order locking and the dashboard

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use kotob_client::storage::{MemoryStorage, SharedStorage};
use kotob_client::validation::LoginForm;
use kotob_client::{ClientConfig, ClientState};
use kotob_core::{
    Book, BookId, CartItem, Email, FavoriteItem, NewOrder, Order, OrderId, OrderItem,
    OrderItemBook, OrderStatus, OrderUpdate, OrderUser, User, UserId, UserRole,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

type Shared = Arc<Mutex<Store>>;

// =============================================================================
// In-memory store
// =============================================================================

struct Account {
    user: User,
    password: String,
    token: String,
}

#[derive(Default)]
struct Store {
    books: Vec<Book>,
    accounts: Vec<Account>,
    carts: HashMap<UserId, Vec<CartItem>>,
    favorites: HashMap<UserId, Vec<FavoriteItem>>,
    orders: Vec<Order>,
    reset_tokens: HashMap<String, UserId>,
    requests: Vec<String>,
    reject_tokens: bool,
}

impl Store {
    fn book(&self, id: &BookId) -> Result<&Book, Failure> {
        self.books
            .iter()
            .find(|book| &book.id == id)
            .ok_or(Failure(StatusCode::NOT_FOUND, "الكتاب غير موجود"))
    }

    fn book_mut(&mut self, id: &BookId) -> Result<&mut Book, Failure> {
        self.books
            .iter_mut()
            .find(|book| &book.id == id)
            .ok_or(Failure(StatusCode::NOT_FOUND, "الكتاب غير موجود"))
    }

    fn order_mut(&mut self, id: &OrderId) -> Result<&mut Order, Failure> {
        self.orders
            .iter_mut()
            .find(|order| &order.id == id)
            .ok_or(Failure(StatusCode::NOT_FOUND, "الطلب غير موجود"))
    }

    /// The user behind the request's bearer token.
    fn authenticate(&self, headers: &HeaderMap) -> Result<User, Failure> {
        let unauthorized = Failure(StatusCode::UNAUTHORIZED, "غير مصرح. يرجى تسجيل الدخول");
        if self.reject_tokens {
            return Err(unauthorized);
        }
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| unauthorized.clone())?;
        self.accounts
            .iter()
            .find(|account| account.token == token)
            .map(|account| account.user.clone())
            .ok_or(unauthorized)
    }

    fn authenticate_admin(&self, headers: &HeaderMap) -> Result<User, Failure> {
        let user = self.authenticate(headers)?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(Failure(StatusCode::FORBIDDEN, "غير مسموح"))
        }
    }
}

#[derive(Debug, Clone)]
struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

type Reply = Result<Json<Value>, Failure>;

fn lock(store: &Shared) -> MutexGuard<'_, Store> {
    store.lock().expect("fake store poisoned")
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// =============================================================================
// FakeBackend
// =============================================================================

/// In-memory bookstore backend listening on `127.0.0.1`.
///
/// Stops serving when dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    store: Shared,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let store: Shared = Arc::default();
        let app = Router::new()
            .nest("/api", api_routes())
            .layer(middleware::from_fn_with_state(Arc::clone(&store), record_request))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&store));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            store,
            server,
        }
    }

    /// Base URL of the fake API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this backend, with no catalog cache.
    ///
    /// # Panics
    ///
    /// Panics if the generated URL does not parse.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(
            kotob_client::config::parse_api_url(&self.api_url()).expect("Invalid fake API URL"),
        );
        config.catalog_cache_ttl = std::time::Duration::ZERO;
        config.catalog_retries = 0;
        config
    }

    /// A fresh client over its own in-memory storage.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built or its state cannot be loaded.
    pub async fn client(&self) -> ClientState {
        self.client_with_storage(MemoryStorage::shared()).await
    }

    /// A client over `storage`, as a restarted front end would see it.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built or its state cannot be loaded.
    pub async fn client_with_storage(&self, storage: SharedStorage) -> ClientState {
        let state = ClientState::new(self.config(), storage).expect("Failed to build client");
        state.init().await.expect("Failed to load client state");
        state
    }

    /// Add a book to the catalog.
    pub fn add_book(&self, name: &str, price: i64, quantity: u32) -> Book {
        self.add_book_with_offer(name, price, quantity, 0)
    }

    /// Add a discounted book to the catalog.
    pub fn add_book_with_offer(&self, name: &str, price: i64, quantity: u32, offer: i64) -> Book {
        let book = Book {
            id: BookId::new(new_id()),
            name: name.to_string(),
            title: format!("{name} (title)"),
            category: "روايات".to_string(),
            imgs: vec![format!("{}.jpg", name.to_lowercase().replace(' ', "-"))],
            code: String::new(),
            price: Decimal::from(price),
            quantity,
            description: String::new(),
            offer: Decimal::from(offer),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        lock(&self.store).books.push(book.clone());
        book
    }

    /// Register an account directly.
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    pub fn add_user(&self, email: &str, password: &str, role: UserRole) -> User {
        let user = User {
            id: UserId::new(new_id()),
            email: Email::parse(email).expect("Invalid test email"),
            name: email.split('@').next().unwrap_or(email).to_string(),
            role,
        };
        lock(&self.store).accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
            token: new_id(),
        });
        user
    }

    /// Insert an order as if it had been placed earlier.
    pub fn add_order(&self, order: Order) {
        lock(&self.store).orders.push(order);
    }

    /// Answer every authenticated call with 401 from now on.
    pub fn reject_tokens(&self) {
        lock(&self.store).reject_tokens = true;
    }

    /// `METHOD /path` of every request served so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.store).requests.clone()
    }

    /// Forget the request log.
    pub fn clear_requests(&self) {
        lock(&self.store).requests.clear();
    }

    /// Server-side cart of a user.
    #[must_use]
    pub fn cart_of(&self, user: &User) -> Vec<CartItem> {
        lock(&self.store).carts.get(&user.id).cloned().unwrap_or_default()
    }

    /// Server-side favorites of a user.
    #[must_use]
    pub fn favorites_of(&self, user: &User) -> Vec<FavoriteItem> {
        lock(&self.store)
            .favorites
            .get(&user.id)
            .cloned()
            .unwrap_or_default()
    }

    /// Current catalog entry.
    #[must_use]
    pub fn book(&self, id: &BookId) -> Option<Book> {
        lock(&self.store).books.iter().find(|b| &b.id == id).cloned()
    }

    /// Current state of an order.
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        lock(&self.store).orders.iter().find(|o| &o.id == id).cloned()
    }

    /// Reset token issued by the last forgot-password call.
    #[must_use]
    pub fn last_reset_token(&self) -> Option<String> {
        lock(&self.store).reset_tokens.keys().next().cloned()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Sign in through the client, as the login command does.
///
/// # Panics
///
/// Panics if the credentials fail validation or the backend rejects them.
pub async fn sign_in(state: &ClientState, email: &str, password: &str) -> User {
    let credentials = LoginForm {
        email: email.to_string(),
        password: password.to_string(),
    }
    .validate()
    .expect("Invalid test credentials");
    state.auth().login(&credentials).await.expect("Login failed")
}

/// Build an order in the shape the backend returns.
#[must_use]
pub fn order_fixture(status: OrderStatus, total: i64, created_at: chrono::DateTime<Utc>) -> Order {
    Order {
        id: OrderId::new(new_id()),
        user: None,
        items: Vec::new(),
        total_amount: Decimal::from(total),
        government: "القاهرة".to_string(),
        full_name: "Test Customer".to_string(),
        address: "10 Tahrir Sq".to_string(),
        payment_method: kotob_core::PaymentMethod::Cash,
        sale_code: None,
        notes: None,
        status,
        created_at,
        updated_at: created_at,
    }
}

async fn record_request(State(store): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let line = format!("{} {}", request.method(), path.strip_prefix("/api").unwrap_or(path));
    lock(&store).requests.push(line);
    next.run(request).await
}

fn api_routes() -> Router<Shared> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/forgetpassword", post(forgot_password))
        .route("/auth/resetpassword/{token}", put(reset_password))
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/books/{id}/offer", put(set_offer))
        .route("/books/{id}/stock", put(set_stock))
        .route("/cart", get(get_cart).post(add_to_cart).put(update_cart))
        .route("/cart/clear", post(clear_cart))
        .route("/cart/{book_id}", delete(remove_from_cart))
        .route("/favorites", get(get_favorites).post(add_favorite))
        .route("/favorites/clear", post(clear_favorites))
        .route("/favorites/{book_id}", delete(remove_favorite))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order).put(update_order).delete(delete_order))
        .route("/orders/{id}/status", put(update_status))
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

#[derive(Deserialize)]
struct PasswordBody {
    password: String,
}

async fn login(State(store): State<Shared>, Json(body): Json<LoginBody>) -> Reply {
    let store = lock(&store);
    let account = store
        .accounts
        .iter()
        .find(|a| a.user.email.as_str() == body.email && a.password == body.password)
        .ok_or(Failure(
            StatusCode::BAD_REQUEST,
            "البريد الإلكتروني أو كلمة المرور غير صحيحة",
        ))?;
    Ok(Json(json!({ "token": account.token, "user": account.user })))
}

async fn register(State(store): State<Shared>, Json(body): Json<RegisterBody>) -> Result<impl IntoResponse, Failure> {
    let mut store = lock(&store);
    if store.accounts.iter().any(|a| a.user.email.as_str() == body.email) {
        return Err(Failure(StatusCode::BAD_REQUEST, "البريد الإلكتروني مستخدم بالفعل"));
    }
    let email = Email::parse(&body.email)
        .map_err(|_| Failure(StatusCode::BAD_REQUEST, "تنسيق البريد الإلكتروني غير صحيح"))?;
    let user = User {
        id: UserId::new(new_id()),
        email,
        name: body.name,
        role: UserRole::Customer,
    };
    let token = new_id();
    store.accounts.push(Account {
        user: user.clone(),
        password: body.password,
        token: token.clone(),
    });
    Ok((StatusCode::CREATED, Json(json!({ "token": token, "user": user }))))
}

async fn forgot_password(State(store): State<Shared>, Json(body): Json<EmailBody>) -> Reply {
    let mut store = lock(&store);
    let user_id = store
        .accounts
        .iter()
        .find(|a| a.user.email.as_str() == body.email)
        .map(|a| a.user.id.clone());
    if let Some(user_id) = user_id {
        store.reset_tokens.clear();
        store.reset_tokens.insert(new_id(), user_id);
    }
    Ok(Json(json!({ "message": "تم إرسال رابط إعادة تعيين كلمة المرور إلى بريدك الإلكتروني" })))
}

async fn reset_password(
    State(store): State<Shared>,
    Path(token): Path<String>,
    Json(body): Json<PasswordBody>,
) -> Reply {
    let mut store = lock(&store);
    let user_id = store
        .reset_tokens
        .remove(&token)
        .ok_or(Failure(StatusCode::BAD_REQUEST, "رابط إعادة التعيين غير صالح أو منتهي"))?;
    if let Some(account) = store.accounts.iter_mut().find(|a| a.user.id == user_id) {
        account.password = body.password;
    }
    Ok(Json(json!({ "message": "تم تغيير كلمة المرور بنجاح" })))
}

// =============================================================================
// Books
// =============================================================================

#[derive(Deserialize)]
struct OfferBody {
    #[serde(with = "rust_decimal::serde::float")]
    offer: Decimal,
}

#[derive(Deserialize)]
struct StockBody {
    quantity: u32,
}

/// Text fields and image file names of a multipart book form.
async fn read_book_form(mut multipart: Multipart) -> Result<(HashMap<String, String>, Vec<String>), Failure> {
    let bad_form = Failure(StatusCode::BAD_REQUEST, "بيانات الكتاب غير صالحة");
    let mut fields = HashMap::new();
    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| bad_form.clone())? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "imgs" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            field.bytes().await.map_err(|_| bad_form.clone())?;
            images.push(file_name);
        } else {
            let value = field.text().await.map_err(|_| bad_form.clone())?;
            fields.insert(name, value);
        }
    }
    Ok((fields, images))
}

fn apply_book_fields(book: &mut Book, fields: &HashMap<String, String>) -> Result<(), Failure> {
    let invalid = || Failure(StatusCode::BAD_REQUEST, "بيانات الكتاب غير صالحة");
    for (key, value) in fields {
        match key.as_str() {
            "name" => book.name.clone_from(value),
            "title" => book.title.clone_from(value),
            "category" => book.category.clone_from(value),
            "code" => book.code.clone_from(value),
            "description" => book.description.clone_from(value),
            "price" => book.price = value.parse().map_err(|_| invalid())?,
            "quantity" => book.quantity = value.parse().map_err(|_| invalid())?,
            "offer" => book.offer = value.parse().map_err(|_| invalid())?,
            _ => {}
        }
    }
    Ok(())
}

async fn list_books(State(store): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Json<Vec<Book>> {
    let store = lock(&store);
    let books = store
        .books
        .iter()
        .filter(|book| query.get("category").is_none_or(|c| &book.category == c))
        .cloned()
        .collect();
    Json(books)
}

async fn get_book(State(store): State<Shared>, Path(id): Path<BookId>) -> Result<Json<Book>, Failure> {
    lock(&store).book(&id).cloned().map(Json)
}

async fn create_book(
    State(store): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, Failure> {
    lock(&store).authenticate_admin(&headers)?;
    let (fields, images) = read_book_form(multipart).await?;
    if images.is_empty() {
        return Err(Failure(StatusCode::BAD_REQUEST, "يجب رفع صورة واحدة على الأقل"));
    }

    let mut book = Book {
        id: BookId::new(new_id()),
        name: String::new(),
        title: String::new(),
        category: String::new(),
        imgs: images,
        code: String::new(),
        price: Decimal::ZERO,
        quantity: 0,
        description: String::new(),
        offer: Decimal::ZERO,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    };
    apply_book_fields(&mut book, &fields)?;
    lock(&store).books.push(book.clone());
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(store): State<Shared>,
    Path(id): Path<BookId>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Book>, Failure> {
    lock(&store).authenticate_admin(&headers)?;
    let (fields, images) = read_book_form(multipart).await?;

    let mut store = lock(&store);
    let book = store.book_mut(&id)?;
    apply_book_fields(book, &fields)?;
    if !images.is_empty() {
        book.imgs = images;
    }
    book.updated_at = Some(Utc::now());
    Ok(Json(book.clone()))
}

async fn delete_book(State(store): State<Shared>, Path(id): Path<BookId>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    store.authenticate_admin(&headers)?;
    store.book(&id)?;
    store.books.retain(|book| book.id != id);
    Ok(Json(json!({ "message": "تم حذف الكتاب بنجاح" })))
}

async fn set_offer(
    State(store): State<Shared>,
    Path(id): Path<BookId>,
    headers: HeaderMap,
    Json(body): Json<OfferBody>,
) -> Result<Json<Book>, Failure> {
    let mut store = lock(&store);
    store.authenticate_admin(&headers)?;
    let book = store.book_mut(&id)?;
    book.offer = body.offer;
    Ok(Json(book.clone()))
}

async fn set_stock(
    State(store): State<Shared>,
    Path(id): Path<BookId>,
    headers: HeaderMap,
    Json(body): Json<StockBody>,
) -> Result<Json<Book>, Failure> {
    let mut store = lock(&store);
    store.authenticate_admin(&headers)?;
    let book = store.book_mut(&id)?;
    book.quantity = body.quantity;
    Ok(Json(book.clone()))
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLineBody {
    book_id: BookId,
    quantity: u32,
}

const OUT_OF_STOCK: &str = "الكمية المطلوبة غير متوفرة في المخزون";

async fn get_cart(State(store): State<Shared>, headers: HeaderMap) -> Reply {
    let store = lock(&store);
    let user = store.authenticate(&headers)?;
    let cart = store.carts.get(&user.id).cloned().unwrap_or_default();
    Ok(Json(json!({ "cart": cart })))
}

async fn add_to_cart(State(store): State<Shared>, headers: HeaderMap, Json(body): Json<CartLineBody>) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    let book = store.book(&body.book_id)?.clone();

    let cart = store.carts.entry(user.id).or_default();
    let current = cart
        .iter()
        .find(|line| line.book.id == book.id)
        .map_or(0, |line| line.quantity);
    let requested = current + body.quantity;
    if requested > book.quantity {
        return Err(Failure(StatusCode::BAD_REQUEST, OUT_OF_STOCK));
    }
    match cart.iter_mut().find(|line| line.book.id == book.id) {
        Some(line) => line.quantity = requested,
        None => cart.push(CartItem::new(book, requested)),
    }
    Ok(Json(json!({ "message": "تمت إضافة الكتاب إلى السلة", "cart": cart })))
}

async fn update_cart(State(store): State<Shared>, headers: HeaderMap, Json(body): Json<CartLineBody>) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    let available = store.book(&body.book_id)?.quantity;
    if body.quantity > available {
        return Err(Failure(StatusCode::BAD_REQUEST, OUT_OF_STOCK));
    }

    let cart = store.carts.entry(user.id).or_default();
    let line = cart
        .iter_mut()
        .find(|line| line.book.id == body.book_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "الكتاب غير موجود في السلة"))?;
    line.quantity = body.quantity;
    Ok(Json(json!({ "cart": cart })))
}

async fn remove_from_cart(State(store): State<Shared>, Path(book_id): Path<BookId>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    let cart = store.carts.entry(user.id).or_default();
    cart.retain(|line| line.book.id != book_id);
    Ok(Json(json!({ "cart": cart })))
}

async fn clear_cart(State(store): State<Shared>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    store.carts.remove(&user.id);
    Ok(Json(json!({ "message": "تم مسح السلة", "cart": [] })))
}

// =============================================================================
// Favorites
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteBody {
    book_id: BookId,
}

async fn get_favorites(State(store): State<Shared>, headers: HeaderMap) -> Reply {
    let store = lock(&store);
    let user = store.authenticate(&headers)?;
    let favorites = store.favorites.get(&user.id).cloned().unwrap_or_default();
    Ok(Json(json!({ "favorites": favorites })))
}

async fn add_favorite(State(store): State<Shared>, headers: HeaderMap, Json(body): Json<FavoriteBody>) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    let book = store.book(&body.book_id)?.clone();

    let favorites = store.favorites.entry(user.id).or_default();
    if favorites.iter().any(|item| item.book.id == book.id) {
        return Ok(Json(json!({
            "message": "الكتاب موجود بالفعل في المفضلة",
            "isAdded": false,
            "favorites": favorites,
        })));
    }
    favorites.push(FavoriteItem::new(book));
    Ok(Json(json!({
        "message": "تمت إضافة الكتاب إلى المفضلة",
        "isAdded": true,
        "favorites": favorites,
    })))
}

async fn remove_favorite(State(store): State<Shared>, Path(book_id): Path<BookId>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    let favorites = store.favorites.entry(user.id).or_default();
    let before = favorites.len();
    favorites.retain(|item| item.book.id != book_id);
    Ok(Json(json!({
        "isRemoved": favorites.len() < before,
        "favorites": favorites,
    })))
}

async fn clear_favorites(State(store): State<Shared>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    store.favorites.remove(&user.id);
    Ok(Json(json!({ "message": "تم مسح المفضلة", "favorites": [] })))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn create_order(
    State(store): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewOrder>,
) -> Result<impl IntoResponse, Failure> {
    let mut store = lock(&store);
    let user = store.authenticate(&headers)?;
    let cart = store.carts.remove(&user.id).unwrap_or_default();
    if cart.is_empty() {
        return Err(Failure(StatusCode::BAD_REQUEST, "السلة فارغة"));
    }

    let mut items = Vec::with_capacity(cart.len());
    for line in &cart {
        let book = store.book_mut(line.book_id())?;
        book.quantity = book.quantity.saturating_sub(line.quantity);
        items.push(OrderItem {
            book: OrderItemBook {
                id: book.id.clone(),
                name: book.name.clone(),
                title: book.title.clone(),
                price: book.price,
                imgs: book.imgs.clone(),
                category: book.category.clone(),
            },
            quantity: line.quantity,
            price: book.final_price(),
        });
    }

    let now = Utc::now();
    let order = Order {
        id: OrderId::new(new_id()),
        user: Some(OrderUser {
            id: user.id.clone(),
            full_name: user.name.clone(),
            email: user.email.to_string(),
        }),
        total_amount: items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum(),
        items,
        government: body.government,
        full_name: body.full_name,
        address: body.address,
        payment_method: body.payment_method,
        sale_code: body.sale_code,
        notes: body.notes,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    store.orders.push(order.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "تم إنشاء الطلب بنجاح", "order": order })),
    ))
}

async fn list_orders(State(store): State<Shared>, headers: HeaderMap) -> Reply {
    let store = lock(&store);
    let user = store.authenticate(&headers)?;
    let orders: Vec<&Order> = store
        .orders
        .iter()
        .filter(|order| user.is_admin() || order.user.as_ref().is_some_and(|u| u.id == user.id))
        .collect();
    Ok(Json(json!({
        "message": "تم جلب الطلبات بنجاح",
        "orders": orders,
        "count": orders.len(),
    })))
}

async fn get_order(State(store): State<Shared>, Path(id): Path<OrderId>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    store.authenticate(&headers)?;
    let order = store.order_mut(&id)?.clone();
    Ok(Json(json!({ "message": "تم جلب الطلب بنجاح", "order": order })))
}

async fn update_status(
    State(store): State<Shared>,
    Path(id): Path<OrderId>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Reply {
    let mut store = lock(&store);
    store.authenticate_admin(&headers)?;
    let order = store.order_mut(&id)?;
    order.status = body.status;
    order.updated_at = Utc::now();
    Ok(Json(json!({ "message": "تم تحديث حالة الطلب", "order": order })))
}

async fn update_order(
    State(store): State<Shared>,
    Path(id): Path<OrderId>,
    headers: HeaderMap,
    Json(body): Json<OrderUpdate>,
) -> Reply {
    let mut store = lock(&store);
    store.authenticate_admin(&headers)?;
    let order = store.order_mut(&id)?;
    if let Some(government) = body.government {
        order.government = government;
    }
    if let Some(full_name) = body.full_name {
        order.full_name = full_name;
    }
    if let Some(address) = body.address {
        order.address = address;
    }
    if let Some(payment_method) = body.payment_method {
        order.payment_method = payment_method;
    }
    if body.sale_code.is_some() {
        order.sale_code = body.sale_code;
    }
    if body.notes.is_some() {
        order.notes = body.notes;
    }
    if let Some(status) = body.status {
        order.status = status;
    }
    order.updated_at = Utc::now();
    Ok(Json(json!({ "message": "تم تحديث الطلب", "order": order })))
}

async fn delete_order(State(store): State<Shared>, Path(id): Path<OrderId>, headers: HeaderMap) -> Reply {
    let mut store = lock(&store);
    store.authenticate_admin(&headers)?;
    store.order_mut(&id)?;
    store.orders.retain(|order| order.id != id);
    Ok(Json(json!({ "message": "تم حذف الطلب بنجاح" })))
}
