//! Data models for the storefront.

pub mod cart;
pub mod session;

pub use cart::{LocalCart, LocalCartItem};
pub use session::CurrentUser;
pub use session::keys as session_keys;
