//! Kotob Core - Shared domain types for the bookstore client.
//!
//! This crate provides the types used across all Kotob components:
//! - `client` - REST client, guest-state storage and state holders
//! - `cli` - Command-line front end for shoppers and administrators
//! - `integration-tests` - In-process fake backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure calculations - no I/O, no
//! storage access, no HTTP clients. This keeps it lightweight and allows the
//! fake backend and the client to share one JSON contract.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`models`] - Books, cart lines, favorites, orders, and users as the
//!   backend serializes them

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
