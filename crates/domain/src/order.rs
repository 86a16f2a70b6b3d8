//! Order aggregate.

use chrono::{DateTime, Utc};
use common::{AddressId, Money, OrderId, OrderItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::status::OrderStatus;

/// One product line within an order.
///
/// `price` is locked when the line is created and never changes, even if
/// the product's catalog price moves later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    /// Creates a new order line at the given locked price.
    pub fn new(product_id: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            id: OrderItemId::new(),
            product_id,
            quantity,
            price,
        }
    }

    /// Returns the line total (price * quantity).
    pub fn total_price(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// An immutable-once-committed record of a purchase.
///
/// Lines are kept in insertion order and `total_amount` always equals the
/// sum of live line totals. Mutation is only legal while the status is
/// `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Unique human-readable order number, generated at creation.
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address_id: AddressId,
    /// Set at creation, immutable.
    pub order_date: DateTime<Utc>,
    /// Version for optimistic concurrency on whole-order writes.
    pub version: u64,
}

impl Order {
    /// Creates a new empty pending order.
    pub fn new(user_id: UserId, shipping_address_id: AddressId) -> Self {
        Self {
            id: OrderId::new(),
            order_number: generate_order_number(),
            user_id,
            items: Vec::new(),
            total_amount: Money::zero(),
            status: OrderStatus::Pending,
            shipping_address_id,
            order_date: Utc::now(),
            version: 0,
        }
    }

    /// Appends a line and recomputes the total.
    pub fn push_item(&mut self, item: OrderItem) {
        self.items.push(item);
        self.recalculate_total();
    }

    /// Returns the line for a product, if present.
    pub fn find_item_by_product(&self, product_id: ProductId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Returns a mutable reference to the line for a product.
    pub fn find_item_by_product_mut(&mut self, product_id: ProductId) -> Option<&mut OrderItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }

    /// Removes the line for a product, recomputing the total.
    pub fn remove_item_by_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<OrderItem, DomainError> {
        let idx = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| DomainError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;
        let removed = self.items.remove(idx);
        self.recalculate_total();
        Ok(removed)
    }

    /// Recomputes `total_amount` from the current lines.
    pub fn recalculate_total(&mut self) {
        self.total_amount = self.items.iter().map(OrderItem::total_price).sum();
    }

    /// Fails unless the order is still pending.
    pub fn ensure_modifiable(&self) -> Result<(), DomainError> {
        if !self.status.can_modify_items() {
            return Err(DomainError::OrderNotModifiable {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Moves the order to `to`, enforcing the transition matrix.
    pub fn transition_to(&mut self, to: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Returns true if the order has at least one line.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

/// Generates a fresh unique order number.
fn generate_order_number() -> String {
    format!("ORD-{}", Uuid::new_v4())
}
