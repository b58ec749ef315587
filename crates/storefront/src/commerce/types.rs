//! Wire types for the external cart service's JSON API.
//!
//! Field names follow the service's camelCase convention via serde renames.
//! These types are the only place the wire format is spelled out; the sync
//! layer works in terms of them and never assembles JSON by hand.

use openkart_core::{CartVersion, CurrencyCode, ExternalCartId, Money};
use serde::{Deserialize, Serialize};

/// Snapshot of an external cart, fetched before every mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCart {
    /// Cart id assigned by the external service.
    pub id: ExternalCartId,
    /// Optimistic-concurrency token; see [`CartVersion`].
    pub version: CartVersion,
    /// ISO 4217 currency code of the cart.
    pub currency: String,
    /// Line items mirrored from the local cart.
    #[serde(default)]
    pub custom_line_items: Vec<CustomLineItem>,
}

impl ExternalCart {
    /// Find a line item by its slug (the local item's SKU).
    #[must_use]
    pub fn line_item_by_slug(&self, slug: &str) -> Option<&CustomLineItem> {
        self.custom_line_items.iter().find(|li| li.slug == slug)
    }
}

/// A cart line in the external service representing a product not natively
/// modeled there, identified by its `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLineItem {
    /// Line item id assigned by the external service.
    pub id: String,
    /// Slug matching the local item's SKU.
    pub slug: String,
    /// Localized display name.
    pub name: LocalizedString,
    /// Quantity on the line.
    pub quantity: i64,
    /// Per-unit amount.
    pub money: MoneyValue,
}

/// Localized display name in the shape the external service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedString {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub de: String,
}

impl LocalizedString {
    /// Build a localized name from a single display name, mirrored into
    /// every locale the service is configured with.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self {
            en: name.to_owned(),
            de: name.to_owned(),
        }
    }
}

/// A money amount on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyValue {
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
    /// Amount in minor currency units.
    pub cent_amount: i64,
}

impl From<Money> for MoneyValue {
    fn from(money: Money) -> Self {
        Self {
            currency_code: money.currency_code,
            cent_amount: money.cent_amount,
        }
    }
}

/// Reference to the fixed tax category applied to every mirrored line item.
///
/// The id is a configuration constant, not derived from the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCategoryReference {
    /// Always `"tax-category"`.
    pub type_id: String,
    /// Tax category id configured for the project.
    pub id: String,
}

impl TaxCategoryReference {
    /// Build a reference to the configured tax category.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self {
            type_id: "tax-category".to_owned(),
            id,
        }
    }
}

/// A single update action in the batch format the external service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CartAction {
    /// Add a custom line item to the cart.
    #[serde(rename_all = "camelCase")]
    AddCustomLineItem {
        name: LocalizedString,
        quantity: i64,
        money: MoneyValue,
        slug: String,
        tax_category: TaxCategoryReference,
    },
    /// Remove a custom line item by its service-assigned id.
    #[serde(rename_all = "camelCase")]
    RemoveCustomLineItem { custom_line_item_id: String },
}

/// Body of a cart update request: the version read in the immediately
/// preceding fetch plus the actions to apply.
#[derive(Debug, Clone, Serialize)]
pub struct CartUpdate {
    pub version: CartVersion,
    pub actions: Vec<CartAction>,
}

/// Body of an anonymous cart creation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDraft {
    pub currency: CurrencyCode,
    pub anonymous_id: String,
}

/// The subset of a cart creation response the sync layer needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCart {
    pub id: ExternalCartId,
    pub version: CartVersion,
}
