//! Shopping cart aggregate.

use common::{CartId, CartItemId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::product::Product;

/// One product line within a cart.
///
/// `price_per_item` is snapshotted from the product at the time the line
/// was first added and is deliberately never re-synced with later product
/// price changes: checkout charges the price the customer saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_per_item: Money,
}

impl CartItem {
    /// Creates a new cart line, snapshotting the product's current price.
    pub fn new(product: &Product, quantity: u32) -> Self {
        Self {
            id: CartItemId::new(),
            product_id: product.id,
            quantity,
            price_per_item: product.price,
        }
    }

    /// Returns the line total (price_per_item * quantity).
    pub fn total_price(&self) -> Money {
        self.price_per_item.multiply(self.quantity)
    }

    /// Sets the quantity, rejecting zero.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity: 0 });
        }
        self.quantity = quantity;
        Ok(())
    }
}

/// Per-user mutable collection of prospective purchases.
///
/// Holds at most one line per product (merge-on-add) and keeps
/// `total_price` equal to the sum of line totals after every mutation.
/// Cart mutations never touch product stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub total_price: Money,
    /// Version for optimistic concurrency on whole-cart writes.
    pub version: u64,
}

impl Cart {
    /// Creates a new empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            total_price: Money::zero(),
            version: 0,
        }
    }

    /// Adds `quantity` units of a product.
    ///
    /// If a line for the product already exists its quantity is
    /// incremented and the original snapshot price is preserved;
    /// otherwise a new line is created at the product's current price.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<CartItemId, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity: 0 });
        }

        let item_id = if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            item.quantity += quantity;
            item.id
        } else {
            let item = CartItem::new(product, quantity);
            let id = item.id;
            self.items.push(item);
            id
        };

        self.recalculate_total();
        Ok(item_id)
    }

    /// Sets the quantity of the line identified by `item_id`.
    ///
    /// The caller is expected to have rejected zero already; this is the
    /// direct line-item path, where removal must be explicit.
    pub fn set_item_quantity(
        &mut self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| DomainError::ItemNotFound {
                product_id: item_id.to_string(),
            })?;
        item.set_quantity(quantity)?;
        self.recalculate_total();
        Ok(())
    }

    /// Updates a line's quantity by product, removing the line when the
    /// new quantity is zero.
    pub fn update_item_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item_by_product(product_id);
            return;
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = quantity;
            self.recalculate_total();
        }
    }

    /// Removes the line identified by `item_id`.
    pub fn remove_item(&mut self, item_id: CartItemId) -> Result<CartItem, DomainError> {
        let idx = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| DomainError::ItemNotFound {
                product_id: item_id.to_string(),
            })?;
        let removed = self.items.remove(idx);
        self.recalculate_total();
        Ok(removed)
    }

    /// Removes any line for the given product.
    pub fn remove_item_by_product(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product_id != product_id);
        self.recalculate_total();
    }

    /// Removes all lines and resets the total; the cart itself survives.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total_price = Money::zero();
    }

    /// Recomputes `total_price` from the current lines.
    pub fn recalculate_total(&mut self) {
        self.total_price = self.items.iter().map(CartItem::total_price).sum();
    }

    /// Returns the line for a product, if present.
    pub fn find_item_by_product(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Returns the line with the given ID, if present.
    pub fn find_item(&self, item_id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Returns the total unit count across all lines.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(price_cents: i64) -> Product {
        Product::new("Widget", Money::from_cents(price_cents), 10)
    }

    #[test]
    fn test_add_item_sets_snapshot_price() {
        let product = widget(1000);
        let mut cart = Cart::new(UserId::new());

        cart.add_item(&product, 2).unwrap();

        let item = cart.find_item_by_product(product.id).unwrap();
        assert_eq!(item.price_per_item.cents(), 1000);
        assert_eq!(cart.total_price.cents(), 2000);
    }

    #[test]
    fn test_add_same_product_merges_and_keeps_price() {
        let mut product = widget(1000);
        let mut cart = Cart::new(UserId::new());

        cart.add_item(&product, 2).unwrap();

        // Price change after the line exists must not leak into the cart.
        product.price = Money::from_cents(1200);
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.items.len(), 1);
        let item = cart.find_item_by_product(product.id).unwrap();
        assert_eq!(item.quantity, 5);
        assert_eq!(item.price_per_item.cents(), 1000);
        assert_eq!(cart.total_price.cents(), 5000);
    }

    #[test]
    fn test_add_zero_quantity_fails() {
        let product = widget(1000);
        let mut cart = Cart::new(UserId::new());
        assert_eq!(
            cart.add_item(&product, 0),
            Err(DomainError::InvalidQuantity { quantity: 0 })
        );
    }

    #[test]
    fn test_set_item_quantity_recomputes_total() {
        let product = widget(500);
        let mut cart = Cart::new(UserId::new());
        let item_id = cart.add_item(&product, 1).unwrap();

        cart.set_item_quantity(item_id, 4).unwrap();
        assert_eq!(cart.total_price.cents(), 2000);
    }

    #[test]
    fn test_set_item_quantity_zero_fails() {
        let product = widget(500);
        let mut cart = Cart::new(UserId::new());
        let item_id = cart.add_item(&product, 1).unwrap();

        assert!(cart.set_item_quantity(item_id, 0).is_err());
        assert_eq!(cart.total_price.cents(), 500);
    }

    #[test]
    fn test_update_by_product_zero_removes_line() {
        let product = widget(500);
        let mut cart = Cart::new(UserId::new());
        cart.add_item(&product, 2).unwrap();

        cart.update_item_quantity(product.id, 0);
        assert!(cart.is_empty());
        assert_eq!(cart.total_price.cents(), 0);
    }

    #[test]
    fn test_remove_item() {
        let a = widget(1000);
        let b = Product::new("Gadget", Money::from_cents(500), 10);
        let mut cart = Cart::new(UserId::new());
        let item_a = cart.add_item(&a, 2).unwrap();
        cart.add_item(&b, 1).unwrap();

        cart.remove_item(item_a).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_price.cents(), 500);
    }

    #[test]
    fn test_remove_missing_item_fails() {
        let mut cart = Cart::new(UserId::new());
        assert!(cart.remove_item(CartItemId::new()).is_err());
    }

    #[test]
    fn test_clear_keeps_cart() {
        let product = widget(1000);
        let mut cart = Cart::new(UserId::new());
        cart.add_item(&product, 3).unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
    }

    #[test]
    fn test_total_items() {
        let a = widget(1000);
        let b = Product::new("Gadget", Money::from_cents(500), 10);
        let mut cart = Cart::new(UserId::new());
        cart.add_item(&a, 2).unwrap();
        cart.add_item(&b, 3).unwrap();

        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let product = widget(1000);
        let mut cart = Cart::new(UserId::new());
        cart.add_item(&product, 2).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let deserialized: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart, deserialized);
    }
}
