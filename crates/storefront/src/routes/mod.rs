//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Cart
//! GET  /cart                   - Local cart as JSON
//! POST /cart/add               - Add item (mirrors to external cart)
//! POST /cart/update            - Update quantity (0 removes; absent SKU ignored)
//! POST /cart/remove            - Remove item
//! ```

pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/cart", cart_routes())
}
