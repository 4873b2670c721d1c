//! Product catalog service library crate.
//!
//! # Purpose
//! Exposes the catalog API surface, auth helpers, configuration, the command
//! pipeline, and the in-memory store/bus/search backends for use by the
//! binary and tests.
//!
//! # Notes
//! Mutations are decoupled from storage: HTTP handlers publish commands on
//! named topics and a consumer applies them to the document store. The search
//! index is projected from the store's change feed and is only eventually
//! consistent with it.
pub mod api;
pub mod app;
pub mod auth;
pub mod bus;
pub mod commands;
pub mod config;
pub mod model;
pub mod observability;
pub mod query;
pub mod search;
pub mod store;
pub mod sync;
