//! CLI command implementations.

pub mod auth;
pub mod books;
pub mod cart;
pub mod dashboard;
pub mod favorites;
pub mod orders;
