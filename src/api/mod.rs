//! Catalog HTTP API module.
//!
//! # Purpose
//! Exposes the route handler modules and the shared error type.
pub mod auth;
pub mod error;
pub mod products;
