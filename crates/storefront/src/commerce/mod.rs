//! External commerce-cloud cart API client.
//!
//! # Architecture
//!
//! - Typed request/response structs serialized with `serde` - no string-built
//!   JSON bodies
//! - The external service is the authoritative holder of the mirrored cart;
//!   snapshots are never cached across requests. Every mutation re-fetches
//!   the cart to obtain the current optimistic-concurrency version.
//! - TLS certificate validation is enabled by default and may only be
//!   relaxed explicitly for test environments (see [`crate::config`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use openkart_storefront::commerce::{CartClient, CommerceCartApi};
//!
//! let client = CartClient::new(&config.commerce)?;
//! let cart = client.fetch_cart(&cart_id).await?;
//! let cart = client
//!     .apply_action(&cart_id, cart.version, action)
//!     .await?;
//! ```

mod client;
pub mod types;

pub use client::CartClient;
pub use types::{
    CartAction, CartDraft, CreatedCart, CustomLineItem, ExternalCart, LocalizedString, MoneyValue,
    TaxCategoryReference,
};

use openkart_core::{CartVersion, ExternalCartId};
use thiserror::Error;

/// Errors that can occur when interacting with the external cart service.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// Network, timeout, or TLS failure reaching the service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The cart id did not resolve on the external service.
    #[error("cart not found: {0}")]
    NotFound(String),

    /// The supplied version no longer matches the service's record.
    #[error("version conflict on cart {cart_id}: supplied version {supplied} is stale")]
    Conflict {
        /// Cart the mutation targeted.
        cart_id: String,
        /// Version supplied with the rejected mutation.
        supplied: CartVersion,
    },

    /// The service returned a non-success status outside the mapped cases.
    #[error("commerce API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// The response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The client could not be constructed from configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Operations the cart sync layer needs from the external cart service.
///
/// Implemented by [`CartClient`] in production and by in-memory fakes in
/// tests.
#[allow(async_fn_in_trait)]
pub trait CommerceCartApi {
    /// Fetch the current state of a cart, including its version token.
    async fn fetch_cart(&self, cart_id: &ExternalCartId) -> Result<ExternalCart, CommerceError>;

    /// Create a new cart associated with an anonymous session token.
    ///
    /// Not idempotent on the service side - callers must not invoke this
    /// more than once per anonymous session.
    async fn create_anonymous_cart(
        &self,
        currency: openkart_core::CurrencyCode,
        anonymous_token: &str,
    ) -> Result<CreatedCart, CommerceError>;

    /// Apply a single update action against a cart at a known version.
    async fn apply_action(
        &self,
        cart_id: &ExternalCartId,
        version: CartVersion,
        action: CartAction,
    ) -> Result<ExternalCart, CommerceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("abc-123".to_string());
        assert_eq!(err.to_string(), "cart not found: abc-123");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = CommerceError::Conflict {
            cart_id: "abc-123".to_string(),
            supplied: CartVersion::new(3),
        };
        assert_eq!(
            err.to_string(),
            "version conflict on cart abc-123: supplied version 3 is stale"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = CommerceError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "commerce API error: 502 - bad gateway");
    }
}
