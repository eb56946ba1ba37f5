//! State holders and API clients.
//!
//! - [`auth`] - signed-in user and bearer token
//! - [`books`] - catalog reads (retried, cached) and admin writes
//! - [`cart`] / [`favorites`] - dual-mode lists with merge-on-login
//! - [`orders`] - checkout and admin order management
//! - [`dashboard`] - admin headline figures

pub mod auth;
pub mod books;
pub mod cart;
pub mod dashboard;
pub mod favorites;
mod local;
pub mod orders;

pub use auth::{AuthService, Credentials, Registration};
pub use books::{BookForm, BookService};
pub use cart::CartService;
pub use dashboard::{DashboardService, DashboardStats};
pub use favorites::{FavoritesService, ToggleOutcome};
pub use local::{MergeFailure, MergeReport, Mode};
pub use orders::OrderService;
