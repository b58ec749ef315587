//! The cart sync coordinator.
//!
//! Drives a single local cart mutation through the external service:
//! `Start -> Identified -> Fetched -> Mutated -> Done`, with any failure
//! carrying the phase it happened in. Every apply supplies the version read
//! in the immediately preceding fetch (or returned by the preceding apply),
//! which is what the service's optimistic concurrency requires.

use core::fmt;

use openkart_core::{CartVersion, ExternalCartId};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::commerce::types::{
    CartAction, ExternalCart, LocalizedString, MoneyValue, TaxCategoryReference,
};
use crate::commerce::{CommerceCartApi, CommerceError};

use super::identity::{
    CartCookies, CartLinkLookup, IdentityError, IdentityResolver, ShopperIdentity,
};

/// A local line-item change to mirror into the external cart.
///
/// Maps 1:1 to a local cart item mutation. Amounts are minor currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItemMutation {
    /// A line item was added locally.
    Add {
        /// Display name of the product.
        name: String,
        /// The local item's SKU, used as the external slug.
        slug: String,
        /// Per-unit price in minor currency units.
        unit_amount: i64,
        /// Quantity added.
        quantity: i64,
    },
    /// A line item was removed locally.
    Remove {
        /// SKU of the removed item.
        slug: String,
    },
    /// A line item's quantity changed locally. Mirrored as remove-then-add;
    /// the external cart briefly lacks the line between the two calls. When
    /// no external line matches the slug, the add still runs, so a cart
    /// that missed an earlier mirror converges on the local state.
    Replace {
        /// SKU of the changed item.
        slug: String,
        /// Display name of the product.
        name: String,
        /// Per-unit price in minor currency units.
        unit_amount: i64,
        /// The new quantity.
        quantity: i64,
    },
}

/// The phase a sync operation was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Fetching the current external cart state.
    Fetch,
    /// Applying the mutation action.
    Mutate,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetching cart state"),
            Self::Mutate => f.write_str("applying cart action"),
        }
    }
}

/// A failed sync operation.
///
/// Never surfaced to the shopper; the triggering local mutation has already
/// completed and is not rolled back.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The shopper's external cart could not be resolved.
    #[error("identity resolution failed: {0}")]
    Identity(#[from] IdentityError),

    /// The external service call failed during the given phase.
    #[error("sync failed while {phase}: {source}")]
    Commerce {
        /// Which step of the state machine failed.
        phase: SyncPhase,
        /// The underlying service error.
        #[source]
        source: CommerceError,
    },
}

/// Outcome of a completed sync operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The external cart that was synced.
    pub cart_id: ExternalCartId,
    /// The cart's version after the operation.
    pub version: CartVersion,
    /// Number of actions actually applied (0 for a remove that matched no
    /// external line item).
    pub actions_applied: u32,
}

/// Configuration the coordinator needs per mutation.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Currency every mirrored amount is expressed in.
    pub currency: openkart_core::CurrencyCode,
    /// Fixed tax category id attached to every added line item.
    pub tax_category_id: String,
}

/// Translates local cart mutations into external-cart API calls.
///
/// All collaborators are injected: the service client, the cart-link
/// mapping store, and (per call) the shopper's cookies.
pub struct CartSyncCoordinator<C, L> {
    client: C,
    links: L,
    settings: SyncSettings,
}

impl<C, L> CartSyncCoordinator<C, L>
where
    C: CommerceCartApi,
    L: CartLinkLookup,
{
    /// Create a coordinator over the given collaborators.
    pub const fn new(client: C, links: L, settings: SyncSettings) -> Self {
        Self {
            client,
            links,
            settings,
        }
    }

    /// Mirror one local cart mutation into the shopper's external cart.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if any step fails. A version conflict is not
    /// retried: the mutation is reported as failed and the caller decides
    /// what to log. Callers must never propagate these errors into the
    /// local mutation's outcome.
    #[instrument(skip(self, identity, cookies))]
    pub async fn sync(
        &self,
        identity: &ShopperIdentity,
        mutation: LineItemMutation,
        cookies: &mut impl CartCookies,
    ) -> Result<SyncReport, SyncError> {
        // Start -> Identified
        let resolver = IdentityResolver::new(&self.client, &self.links, self.settings.currency);
        let resolved = resolver.resolve(identity, cookies).await?;

        // Identified -> Fetched. A cart created during resolution is known
        // to be empty at the returned version, so the fetch is skipped.
        let snapshot = match resolved.fresh_version {
            Some(version) => ExternalCart {
                id: resolved.cart_id.clone(),
                version,
                currency: self.settings.currency.code().to_owned(),
                custom_line_items: Vec::new(),
            },
            None => self
                .client
                .fetch_cart(&resolved.cart_id)
                .await
                .map_err(|source| SyncError::Commerce {
                    phase: SyncPhase::Fetch,
                    source,
                })?,
        };

        // Fetched -> Mutated -> Done
        match mutation {
            LineItemMutation::Add {
                name,
                slug,
                unit_amount,
                quantity,
            } => {
                let money = MoneyValue {
                    currency_code: self.settings.currency,
                    cent_amount: unit_amount,
                };
                let after = self
                    .apply(
                        &snapshot.id,
                        snapshot.version,
                        self.add_action(&name, &slug, quantity, money),
                    )
                    .await?;
                Ok(Self::report(after, 1))
            }
            LineItemMutation::Remove { slug } => {
                let Some(line) = snapshot.line_item_by_slug(&slug) else {
                    // Nothing mirrored under this slug; leave the external
                    // cart untouched.
                    debug!(slug = %slug, "no external line item for slug, skipping remove");
                    return Ok(SyncReport {
                        cart_id: snapshot.id,
                        version: snapshot.version,
                        actions_applied: 0,
                    });
                };

                let action = CartAction::RemoveCustomLineItem {
                    custom_line_item_id: line.id.clone(),
                };
                let after = self.apply(&snapshot.id, snapshot.version, action).await?;
                Ok(Self::report(after, 1))
            }
            LineItemMutation::Replace {
                slug,
                name,
                unit_amount,
                quantity,
            } => {
                let money = MoneyValue {
                    currency_code: self.settings.currency,
                    cent_amount: unit_amount,
                };
                let add = self.add_action(&name, &slug, quantity, money);

                let Some(line) = snapshot.line_item_by_slug(&slug) else {
                    // No external line to remove; the add alone brings the
                    // cart back in line with the local state.
                    debug!(slug = %slug, "no external line item for slug, adding instead of replacing");
                    let after = self.apply(&snapshot.id, snapshot.version, add).await?;
                    return Ok(Self::report(after, 1));
                };

                let remove = CartAction::RemoveCustomLineItem {
                    custom_line_item_id: line.id.clone(),
                };
                let after_remove = self.apply(&snapshot.id, snapshot.version, remove).await?;

                // The add reuses the version from the snapshot the remove
                // returned.
                let after_add = self
                    .apply(&after_remove.id, after_remove.version, add)
                    .await?;
                Ok(Self::report(after_add, 2))
            }
        }
    }

    /// Build an `addCustomLineItem` action with the configured tax category.
    fn add_action(&self, name: &str, slug: &str, quantity: i64, money: MoneyValue) -> CartAction {
        CartAction::AddCustomLineItem {
            name: LocalizedString::from_name(name),
            quantity,
            money,
            slug: slug.to_owned(),
            tax_category: TaxCategoryReference::new(self.settings.tax_category_id.clone()),
        }
    }

    async fn apply(
        &self,
        cart_id: &ExternalCartId,
        version: CartVersion,
        action: CartAction,
    ) -> Result<ExternalCart, SyncError> {
        self.client
            .apply_action(cart_id, version, action)
            .await
            .map_err(|source| SyncError::Commerce {
                phase: SyncPhase::Mutate,
                source,
            })
    }

    fn report(after: ExternalCart, actions_applied: u32) -> SyncReport {
        debug!(cart_id = %after.id, version = %after.version, "external cart sync complete");
        SyncReport {
            cart_id: after.id,
            version: after.version,
            actions_applied,
        }
    }
}
