//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::commerce::{CartClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::db::CartLinkRepository;
use crate::sync::{CartSyncCoordinator, SyncSettings};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    commerce: CartClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce API client cannot be built from
    /// the configuration.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, CommerceError> {
        let commerce = CartClient::new(&config.commerce)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                commerce,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Build a sync coordinator over the shared client and repository.
    #[must_use]
    pub fn sync_coordinator(&self) -> CartSyncCoordinator<CartClient, CartLinkRepository> {
        CartSyncCoordinator::new(
            self.inner.commerce.clone(),
            CartLinkRepository::new(self.inner.pool.clone()),
            SyncSettings {
                currency: self.inner.config.commerce.currency,
                tax_category_id: self.inner.config.commerce.tax_category_id.clone(),
            },
        )
    }
}
