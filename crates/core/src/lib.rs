//! OpenKart Core - Shared types library.
//!
//! This crate provides common types used across OpenKart components:
//! - `storefront` - Public-facing e-commerce site and cart sync shim
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe emails, cart identifiers,
//!   versions, and minor-unit money amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
