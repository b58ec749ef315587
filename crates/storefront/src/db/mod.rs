//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `openkart_storefront`
//!
//! Stores local data only (the external commerce service is the source of
//! truth for the mirrored carts):
//!
//! ## Tables
//!
//! - `sessions` - Tower-sessions storage
//! - `commerce_cart_link` - Maps customer emails to external cart ids
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and must be run
//! before startup; they are not applied automatically.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod cart_links;

pub use cart_links::CartLinkRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row held data that should never have been stored.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
