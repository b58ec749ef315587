//! Repository for the customer-to-external-cart mapping.
//!
//! The mapping rows are written out-of-band when a customer's cart is first
//! associated with the external service; the sync path only ever reads them.

use openkart_core::{Email, ExternalCartId};
use sqlx::PgPool;

use crate::sync::CartLinkLookup;

use super::RepositoryError;

/// Read access to `storefront.commerce_cart_link`.
///
/// Owns a pool handle; `PgPool` is reference-counted and cheap to clone.
#[derive(Clone)]
pub struct CartLinkRepository {
    pool: PgPool,
}

impl CartLinkRepository {
    /// Create a new cart-link repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CartLinkLookup for CartLinkRepository {
    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<ExternalCartId>, RepositoryError> {
        let cart_id: Option<String> = sqlx::query_scalar(
            r"
            SELECT external_cart_id
            FROM storefront.commerce_cart_link
            WHERE customer_email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match cart_id {
            Some(id) if id.is_empty() => Err(RepositoryError::DataCorruption(format!(
                "empty external cart id mapped for {email}"
            ))),
            Some(id) => Ok(Some(ExternalCartId::new(id))),
            None => Ok(None),
        }
    }
}
