//! Cart state machine.
//!
//! [`Cart`] holds the ordered entries and enforces the two invariants every
//! other layer relies on: at most one entry per product, and no entry with a
//! quantity below 1. It does no I/O; [`CartStore`](crate::CartStore) wraps it
//! with persistence and change notification.

use std::collections::HashSet;

use gomarket_core::{CartItem, NewCartItem, ProductId};
use tracing::warn;

use crate::error::{CartError, Result};

/// What `add` did with the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was appended with quantity 1.
    Added,
    /// The product was already present; its quantity was incremented.
    Incremented { quantity: u32 },
}

/// What `decrement` did with the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The entry remains with the new quantity.
    Decremented { quantity: u32 },
    /// The quantity reached zero and the entry was removed.
    Removed,
}

/// Ordered collection of cart entries, unique by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from previously stored entries.
    ///
    /// Entries with quantity 0 and repeated IDs (after the first occurrence)
    /// are dropped with a warning, so the result always satisfies the cart
    /// invariants.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            if item.quantity == 0 {
                warn!(product_id = %item.id, "Dropping stored cart entry with zero quantity");
                continue;
            }
            if !seen.insert(item.id.clone()) {
                warn!(product_id = %item.id, "Dropping duplicate stored cart entry");
                continue;
            }
            kept.push(item);
        }

        Self { items: kept }
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Consume the cart and return its entries.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Look up the entry for a product.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Returns `true` if the product has an entry.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Add a product.
    ///
    /// If the product is already present this is exactly `increment`: the
    /// stored title, image and price are kept and the candidate's are ignored.
    pub fn add(&mut self, item: NewCartItem) -> AddOutcome {
        if let Some(existing) = self.items.iter_mut().find(|entry| entry.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return AddOutcome::Incremented {
                quantity: existing.quantity,
            };
        }

        self.items.push(item.with_quantity(1));
        AddOutcome::Added
    }

    /// Increase a product's quantity by one and return the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownId` and leaves the cart untouched if the
    /// product has no entry.
    pub fn increment(&mut self, id: &str) -> Result<u32> {
        let entry = self
            .items
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| CartError::UnknownId(ProductId::new(id)))?;

        entry.quantity = entry.quantity.saturating_add(1);
        Ok(entry.quantity)
    }

    /// Decrease a product's quantity by one, removing the entry at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownId` and leaves the cart untouched if the
    /// product has no entry.
    pub fn decrement(&mut self, id: &str) -> Result<DecrementOutcome> {
        let position = self
            .items
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| CartError::UnknownId(ProductId::new(id)))?;

        let remaining = match self.items.get_mut(position) {
            Some(entry) if entry.quantity > 1 => {
                entry.quantity -= 1;
                Some(entry.quantity)
            }
            _ => None,
        };

        match remaining {
            Some(quantity) => Ok(DecrementOutcome::Decremented { quantity }),
            None => {
                self.items.remove(position);
                Ok(DecrementOutcome::Removed)
            }
        }
    }

    /// Fold `pending` into this cart.
    ///
    /// Entries of `self` keep their order and fields. A product present in
    /// both gets the sum of the two quantities; products only in `pending`
    /// are appended in their order.
    #[must_use]
    pub fn merge(mut self, pending: Self) -> Self {
        for item in pending.items {
            match self.items.iter_mut().find(|entry| entry.id == item.id) {
                Some(entry) => entry.quantity = entry.quantity.saturating_add(item.quantity),
                None => self.items.push(item),
            }
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use gomarket_core::Price;

    use super::*;

    fn widget(id: &str) -> NewCartItem {
        NewCartItem::new(id, "Widget", "u", Price::from_units(10))
    }

    fn cart_with(id: &str, quantity: u32) -> Cart {
        Cart::from_items(vec![widget(id).with_quantity(quantity)])
    }

    #[test]
    fn test_add_to_empty_cart() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(widget("A")), AddOutcome::Added);

        assert_eq!(cart.len(), 1);
        let item = &cart.items()[0];
        assert_eq!(item.id, "A");
        assert_eq!(item.title, "Widget");
        assert_eq!(item.image_url, "u");
        assert_eq!(item.price, Price::from_units(10));
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_add_existing_increments() {
        let mut cart = cart_with("A", 1);
        assert_eq!(
            cart.add(widget("A")),
            AddOutcome::Incremented { quantity: 2 }
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_add_existing_keeps_first_seen_fields() {
        let mut cart = cart_with("A", 1);
        cart.add(NewCartItem::new("A", "Renamed", "other", Price::from_units(99)));

        let item = cart.get("A").unwrap();
        assert_eq!(item.title, "Widget");
        assert_eq!(item.image_url, "u");
        assert_eq!(item.price, Price::from_units(10));
    }

    #[test]
    fn test_add_existing_matches_increment() {
        let mut via_add = cart_with("A", 1);
        let mut via_increment = via_add.clone();

        via_add.add(widget("A"));
        via_increment.increment("A").unwrap();

        assert_eq!(via_add, via_increment);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::new();
        cart.add(widget("B"));
        cart.add(widget("A"));
        cart.add(widget("C"));
        cart.add(widget("A"));

        let ids: Vec<&str> = cart.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["B", "A", "C"]);
    }

    #[test]
    fn test_decrement_to_zero_removes() {
        let mut cart = cart_with("A", 1);
        assert_eq!(cart.decrement("A").unwrap(), DecrementOutcome::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_keeps_entry_above_zero() {
        let mut cart = cart_with("A", 3);
        assert_eq!(
            cart.decrement("A").unwrap(),
            DecrementOutcome::Decremented { quantity: 2 }
        );
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_decrement_removes_only_target() {
        let mut cart = Cart::new();
        cart.add(widget("A"));
        cart.add(widget("B"));
        cart.add(widget("C"));

        cart.decrement("B").unwrap();

        let ids: Vec<&str> = cart.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["A", "C"]);
    }

    #[test]
    fn test_unknown_id_is_rejected_without_change() {
        let mut cart = cart_with("A", 2);
        let before = cart.clone();

        assert!(matches!(
            cart.increment("missing"),
            Err(CartError::UnknownId(ref id)) if id == "missing"
        ));
        assert!(matches!(
            cart.decrement("missing"),
            Err(CartError::UnknownId(_))
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_from_items_drops_invalid_entries() {
        let cart = Cart::from_items(vec![
            widget("A").with_quantity(2),
            widget("B").with_quantity(0),
            NewCartItem::new("A", "Duplicate", "x", Price::from_units(1)).with_quantity(5),
            widget("C").with_quantity(1),
        ]);

        let ids: Vec<&str> = cart.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["A", "C"]);
        assert_eq!(cart.get("A").unwrap().title, "Widget");
        assert_eq!(cart.get("A").unwrap().quantity, 2);
    }

    #[test]
    fn test_merge_sums_shared_products() {
        let stored = Cart::from_items(vec![
            widget("Z").with_quantity(9),
            NewCartItem::new("A", "Stored", "s", Price::from_units(3)).with_quantity(1),
        ]);
        let mut pending = Cart::new();
        pending.add(widget("A"));
        pending.add(widget("B"));

        let merged = stored.merge(pending);

        let summary: Vec<(&str, u32)> = merged
            .items()
            .iter()
            .map(|item| (item.id.as_str(), item.quantity))
            .collect();
        assert_eq!(summary, [("Z", 9), ("A", 2), ("B", 1)]);
        assert_eq!(merged.get("A").unwrap().title, "Stored");
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let stored = cart_with("A", 2);
        assert_eq!(stored.clone().merge(Cart::new()), stored);
        assert_eq!(Cart::new().merge(stored.clone()), stored);
    }

    #[test]
    fn test_merge_saturates_quantity() {
        let merged = cart_with("A", u32::MAX).merge(cart_with("A", 3));
        assert_eq!(merged.get("A").unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_total_quantity() {
        let mut cart = cart_with("A", 3);
        cart.add(widget("B"));
        assert_eq!(cart.total_quantity(), 4);
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(String),
            Increment(String),
            Decrement(String),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            let id = prop::sample::select(vec!["A", "B", "C", "D"]).prop_map(String::from);
            prop_oneof![
                id.clone().prop_map(Op::Add),
                id.clone().prop_map(Op::Increment),
                id.prop_map(Op::Decrement),
            ]
        }

        proptest! {
            /// Property: no sequence of operations produces two entries for one ID.
            #[test]
            fn ids_stay_unique(ops in prop::collection::vec(op_strategy(), 0..64)) {
                let mut cart = Cart::new();
                for op in ops {
                    match op {
                        Op::Add(id) => { cart.add(widget(&id)); }
                        Op::Increment(id) => { let _ = cart.increment(&id); }
                        Op::Decrement(id) => { let _ = cart.decrement(&id); }
                    }
                    let ids: HashSet<&str> = cart.items().iter().map(|item| item.id.as_str()).collect();
                    prop_assert_eq!(ids.len(), cart.len());
                }
            }

            /// Property: every entry present has quantity of at least 1.
            #[test]
            fn quantities_stay_positive(ops in prop::collection::vec(op_strategy(), 0..64)) {
                let mut cart = Cart::new();
                for op in ops {
                    match op {
                        Op::Add(id) => { cart.add(widget(&id)); }
                        Op::Increment(id) => { let _ = cart.increment(&id); }
                        Op::Decrement(id) => { let _ = cart.decrement(&id); }
                    }
                    prop_assert!(cart.items().iter().all(|item| item.quantity >= 1));
                }
            }

            /// Property: adding N copies then decrementing N times empties the cart.
            #[test]
            fn adds_and_decrements_cancel(count in 1u32..20) {
                let mut cart = Cart::new();
                for _ in 0..count {
                    cart.add(widget("A"));
                }
                prop_assert_eq!(cart.get("A").map(|item| item.quantity), Some(count));
                for _ in 0..count {
                    cart.decrement("A").unwrap();
                }
                prop_assert!(cart.is_empty());
            }
        }
    }
}
