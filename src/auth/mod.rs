//! Authentication and authorization.
//!
//! # Purpose
//! Token signing/verification, the user directory backing claim lookups, the
//! credential service that resolves tokens to user records, and the gate that
//! decides whether a mutating request may proceed.
pub mod directory;
pub mod gate;
pub mod service;
pub mod token;
