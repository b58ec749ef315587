//! Shopper identity and external-cart resolution.
//!
//! Decides which external cart id belongs to the current shopper:
//! logged-in customers are looked up in the cart-link mapping store by
//! email; anonymous shoppers carry the mapping in a browser cookie pair,
//! created lazily on their first cart interaction.

use std::time::Duration;

use openkart_core::{CartVersion, CurrencyCode, Email, ExternalCartId};
use thiserror::Error;
use tracing::debug;

use crate::commerce::{CommerceCartApi, CommerceError};
use crate::db::RepositoryError;

/// Marker cookie recording the anonymous session token itself, so a later
/// request can find the token-keyed cart cookie without re-deriving it.
pub const ANONYMOUS_MARKER_COOKIE: &str = "anonymousID";

/// Retention window for both anonymous cart cookies (30 days).
pub const CART_COOKIE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// The shopper behind the current request.
///
/// Derived from session state on every request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopperIdentity {
    /// A logged-in customer, identified by email.
    Authenticated {
        /// The customer's email address.
        email: Email,
    },
    /// A shopper without an account, identified by a per-session token.
    Anonymous {
        /// The anonymous session token.
        session_token: String,
    },
}

/// Errors that can occur while resolving a shopper's external cart.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// An authenticated shopper has no mapped external cart. The mapping is
    /// expected to have been created out-of-band at cart-association time,
    /// so a missing row is a data-integrity problem, fatal to the sync
    /// operation only.
    #[error("no external cart mapped for customer {0}")]
    UnmappedCustomer(Email),

    /// The cart-link mapping store could not be queried.
    #[error("cart mapping lookup failed: {0}")]
    Store(#[from] RepositoryError),

    /// Creating an anonymous cart on the external service failed.
    #[error("anonymous cart creation failed: {0}")]
    CartCreation(#[from] CommerceError),
}

/// Read access to the persistent `customer email -> external cart id`
/// mapping. Writes happen out-of-band at cart-association time.
#[allow(async_fn_in_trait)]
pub trait CartLinkLookup {
    /// Look up the external cart id mapped to a customer email.
    async fn find_by_email(&self, email: &Email)
    -> Result<Option<ExternalCartId>, RepositoryError>;
}

/// The browser-persisted cookie pair holding an anonymous shopper's cart
/// mapping. Implemented over the request/response cookies in production and
/// over a map in tests.
pub trait CartCookies {
    /// Read a cookie value by name.
    fn get(&self, name: &str) -> Option<String>;

    /// Set a cookie with the given retention window.
    fn set(&mut self, name: &str, value: &str, max_age: Duration);
}

/// The cart a shopper's identity resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCart {
    /// The external cart id to sync against.
    pub cart_id: ExternalCartId,
    /// Set only when the cart was created during this resolution; the
    /// coordinator can then skip the initial fetch, since the version is
    /// already known and the cart is empty.
    pub fresh_version: Option<CartVersion>,
}

/// Resolves a [`ShopperIdentity`] to the external cart it owns.
pub struct IdentityResolver<'a, C, L> {
    client: &'a C,
    links: &'a L,
    currency: CurrencyCode,
}

impl<'a, C, L> IdentityResolver<'a, C, L>
where
    C: CommerceCartApi,
    L: CartLinkLookup,
{
    /// Create a resolver over the given client and mapping store.
    pub const fn new(client: &'a C, links: &'a L, currency: CurrencyCode) -> Self {
        Self {
            client,
            links,
            currency,
        }
    }

    /// Resolve the external cart id for the current shopper.
    ///
    /// Resolving the same identity within the cookie lifetime always yields
    /// the same cart id, and an anonymous cart is created at most once per
    /// session token.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnmappedCustomer`] for an authenticated
    /// shopper without a mapping row, [`IdentityError::Store`] if the
    /// mapping store fails, or [`IdentityError::CartCreation`] if the
    /// external service rejects the anonymous cart creation.
    pub async fn resolve(
        &self,
        identity: &ShopperIdentity,
        cookies: &mut impl CartCookies,
    ) -> Result<ResolvedCart, IdentityError> {
        match identity {
            ShopperIdentity::Authenticated { email } => {
                let cart_id = self
                    .links
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| IdentityError::UnmappedCustomer(email.clone()))?;

                debug!(cart_id = %cart_id, "resolved mapped cart for customer");
                Ok(ResolvedCart {
                    cart_id,
                    fresh_version: None,
                })
            }
            ShopperIdentity::Anonymous { session_token } => {
                if let Some(cart_id) = cookies.get(session_token) {
                    debug!(cart_id = %cart_id, "reusing anonymous cart from cookie");
                    return Ok(ResolvedCart {
                        cart_id: ExternalCartId::new(cart_id),
                        fresh_version: None,
                    });
                }

                let created = self
                    .client
                    .create_anonymous_cart(self.currency, session_token)
                    .await?;

                cookies.set(session_token, created.id.as_str(), CART_COOKIE_MAX_AGE);
                cookies.set(ANONYMOUS_MARKER_COOKIE, session_token, CART_COOKIE_MAX_AGE);

                debug!(cart_id = %created.id, "created anonymous cart");
                Ok(ResolvedCart {
                    cart_id: created.id,
                    fresh_version: Some(created.version),
                })
            }
        }
    }
}
