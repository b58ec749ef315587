//! The local cart and its mutation semantics.
//!
//! The local cart lives in the shopper's session and is the source of truth
//! for everything the shopper sees. Each mutation method applies the local
//! change and reports the [`LineItemMutation`] to mirror externally, if any;
//! the caller runs that mirror best-effort after the local change is saved.

use openkart_core::Money;
use serde::{Deserialize, Serialize};

use crate::sync::LineItemMutation;

/// A line item in the local cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCartItem {
    /// Stock keeping unit, also used as the external line item slug.
    pub sku: String,
    /// Display name shown to the shopper.
    pub name: String,
    /// Per-unit price in minor currency units.
    pub unit_price: Money,
    /// Quantity in the cart.
    pub quantity: i64,
}

/// The shopper's local cart, stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCart {
    /// Line items, one per SKU.
    pub items: Vec<LocalCartItem>,
}

impl LocalCart {
    /// Find an item by SKU.
    #[must_use]
    pub fn item(&self, sku: &str) -> Option<&LocalCartItem> {
        self.items.iter().find(|item| item.sku == sku)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Add an item, merging quantities when the SKU is already present.
    ///
    /// Returns the external mutation to mirror: an add for a new SKU, a
    /// replace with the merged total for an existing one.
    pub fn add(
        &mut self,
        sku: String,
        name: String,
        unit_price: Money,
        quantity: i64,
    ) -> LineItemMutation {
        if let Some(existing) = self.items.iter_mut().find(|item| item.sku == sku) {
            existing.quantity += quantity;
            return LineItemMutation::Replace {
                slug: sku,
                name: existing.name.clone(),
                unit_amount: existing.unit_price.cent_amount,
                quantity: existing.quantity,
            };
        }

        self.items.push(LocalCartItem {
            sku: sku.clone(),
            name: name.clone(),
            unit_price,
            quantity,
        });
        LineItemMutation::Add {
            name,
            slug: sku,
            unit_amount: unit_price.cent_amount,
            quantity,
        }
    }

    /// Set an item's quantity. Quantity zero removes the item; an update
    /// for a SKU not in the cart is ignored.
    pub fn update(&mut self, sku: &str, quantity: i64) -> Option<LineItemMutation> {
        let position = self.items.iter().position(|item| item.sku == sku)?;

        if quantity == 0 {
            self.items.remove(position);
            return Some(LineItemMutation::Remove {
                slug: sku.to_owned(),
            });
        }

        let item = self.items.get_mut(position)?;
        item.quantity = quantity;
        Some(LineItemMutation::Replace {
            slug: sku.to_owned(),
            name: item.name.clone(),
            unit_amount: item.unit_price.cent_amount,
            quantity,
        })
    }

    /// Remove an item by SKU. Removing a SKU not in the cart is ignored.
    pub fn remove(&mut self, sku: &str) -> Option<LineItemMutation> {
        let position = self.items.iter().position(|item| item.sku == sku)?;
        self.items.remove(position);
        Some(LineItemMutation::Remove {
            slug: sku.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openkart_core::CurrencyCode;

    fn money(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    #[test]
    fn test_add_new_item_mirrors_add() {
        let mut cart = LocalCart::default();
        let mutation = cart.add("W1".to_string(), "Widget".to_string(), money(500), 2);

        assert_eq!(
            mutation,
            LineItemMutation::Add {
                name: "Widget".to_string(),
                slug: "W1".to_string(),
                unit_amount: 500,
                quantity: 2,
            }
        );
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_add_existing_item_merges_and_mirrors_replace() {
        let mut cart = LocalCart::default();
        cart.add("W1".to_string(), "Widget".to_string(), money(500), 2);
        let mutation = cart.add("W1".to_string(), "Widget".to_string(), money(500), 3);

        assert_eq!(
            mutation,
            LineItemMutation::Replace {
                slug: "W1".to_string(),
                name: "Widget".to_string(),
                unit_amount: 500,
                quantity: 5,
            }
        );
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_update_sets_quantity() {
        let mut cart = LocalCart::default();
        cart.add("W1".to_string(), "Widget".to_string(), money(500), 2);
        let mutation = cart.update("W1", 7);

        assert_eq!(
            mutation,
            Some(LineItemMutation::Replace {
                slug: "W1".to_string(),
                name: "Widget".to_string(),
                unit_amount: 500,
                quantity: 7,
            })
        );
        assert_eq!(cart.item("W1").map(|i| i.quantity), Some(7));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = LocalCart::default();
        cart.add("W1".to_string(), "Widget".to_string(), money(500), 2);
        let mutation = cart.update("W1", 0);

        assert_eq!(
            mutation,
            Some(LineItemMutation::Remove {
                slug: "W1".to_string(),
            })
        );
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_update_absent_item_is_ignored() {
        let mut cart = LocalCart::default();
        assert_eq!(cart.update("NOPE", 3), None);
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_remove_absent_item_is_ignored() {
        let mut cart = LocalCart::default();
        assert_eq!(cart.remove("NOPE"), None);
    }
}
