//! Session-related types.
//!
//! Types stored in the session to identify the shopper.

use serde::{Deserialize, Serialize};

use openkart_core::Email;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
/// Written at login time by the authentication flow, which lives outside
/// this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Customer's email address.
    pub email: Email,
}

/// Session keys for shopper data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the local cart.
    pub const LOCAL_CART: &str = "local_cart";
}
