//! External-cart synchronization.
//!
//! When a shopper adds, updates, or removes a line item in the local cart,
//! this module mirrors the change into the external commerce-cloud cart
//! keyed to the shopper: by stored mapping for logged-in customers, by
//! cookie pair for anonymous sessions.
//!
//! # Architecture
//!
//! - [`identity::IdentityResolver`] decides which external cart the current
//!   shopper owns, creating an anonymous one lazily on first interaction.
//! - [`coordinator::CartSyncCoordinator`] drives each mutation through
//!   identify -> fetch -> mutate, carrying the service's
//!   optimistic-concurrency version between the calls.
//! - Collaborators are injected through the [`crate::commerce::CommerceCartApi`],
//!   [`identity::CartLinkLookup`], and [`identity::CartCookies`] traits so
//!   the whole chain is testable without a network.
//!
//! Sync is best-effort: the local cart is the source of truth for the
//! shopper-visible experience, and no failure in this module may change the
//! outcome of the local mutation that triggered it. Callers log sync errors
//! and move on.

pub mod coordinator;
pub mod identity;

pub use coordinator::{CartSyncCoordinator, LineItemMutation, SyncError, SyncPhase, SyncReport, SyncSettings};
pub use identity::{
    CartCookies, CartLinkLookup, IdentityError, IdentityResolver, ResolvedCart, ShopperIdentity,
};
