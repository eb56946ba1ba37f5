//! Kotob Client - REST client and state holders for the bookstore.
//!
//! Everything a front end needs to talk to the bookstore backend:
//! authentication, the catalog, a cart and favorites that work for guests
//! and signed-in users alike, checkout, and the admin order and dashboard
//! views.
//!
//! # Architecture
//!
//! Business rules that need authority (inventory, pricing, persistence,
//! authorization) live in the backend. This crate validates forms, keeps
//! guest state in a persistent key/value store, issues HTTP calls and
//! publishes list state through `tokio::sync::watch` channels.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`storage`] - Persistent key/value store for the token, user and guest lists
//! - [`api`] - HTTP transport, endpoints and retry policy
//! - [`services`] - Auth, books, cart, favorites, orders and dashboard
//! - [`checkout`] - Shipping form, coupon and order placement
//! - [`listing`] - Catalog and order list filters
//! - [`validation`] - Login and registration form rules
//! - [`images`] - Image URL resolution and upload checks
//! - [`state`] - Services wired together for a front end

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod images;
pub mod listing;
pub mod services;
pub mod state;
pub mod storage;
pub mod validation;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::ClientState;
