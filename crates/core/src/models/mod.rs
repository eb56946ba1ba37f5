//! Domain models as the bookstore backend serializes them.
//!
//! Field names follow the backend's JSON contract (`_id`, camelCase), so the
//! same structs are used for HTTP payloads and for the guest snapshots kept in
//! client storage.

pub mod book;
pub mod cart;
pub mod favorite;
pub mod order;
pub mod user;

pub use book::Book;
pub use cart::{CartItem, cart_item_count, cart_subtotal, cart_total};
pub use favorite::FavoriteItem;
pub use order::{NewOrder, Order, OrderItem, OrderItemBook, OrderList, OrderUpdate, OrderUser};
pub use user::{AuthSession, User};
