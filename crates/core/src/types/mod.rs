//! Core types for OpenKart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod money;

pub use cart::{CartVersion, ExternalCartId};
pub use email::{Email, EmailError};
pub use money::{CurrencyCode, Money};
