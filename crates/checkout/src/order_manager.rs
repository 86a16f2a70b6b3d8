//! Order service.
//!
//! Pending-order line mutation, the status state machine, cancellation
//! with stock restore, and the payment boundary. Every stock movement is
//! paired with a persisted order write; the ordering of the two depends
//! on the direction of the movement, so a failure in between never
//! oversells.

use std::sync::Arc;

use common::{Money, OrderId, ProductId, UserId};
use domain::{Order, OrderItem, OrderStatus, Payment};
use store::Store;
use tracing::{error, info, instrument};

use crate::error::{CheckoutError, Result};

/// Manages orders after checkout has created them.
pub struct OrderManager<S: Store> {
    store: Arc<S>,
}

impl<S: Store> OrderManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Looks up an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Order", order_id))
    }

    /// Returns all orders, oldest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_orders().await?)
    }

    /// Returns a user's orders, oldest first.
    pub async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_by_user(user_id).await?)
    }

    /// Adds `quantity` units of a product to a pending order.
    ///
    /// New lines are priced at the product's current price; merging into
    /// an existing line keeps that line's locked price. Stock is reserved
    /// up front and released again if the order write fails.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Order> {
        if quantity == 0 {
            return Err(CheckoutError::Validation(
                "Quantity must be greater than 0".into(),
            ));
        }

        let mut order = self.get_order(order_id).await?;
        order.ensure_modifiable()?;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Product", product_id))?;
        if !product.status.can_be_purchased() {
            return Err(CheckoutError::ProductNotAvailable {
                product: product_id.to_string(),
            });
        }

        self.reserve(product_id, quantity).await?;

        if let Some(item) = order.find_item_by_product_mut(product_id) {
            item.quantity += quantity;
            order.recalculate_total();
        } else {
            order.push_item(OrderItem::new(product_id, quantity, product.price));
        }

        match self.store.update_order(order).await {
            Ok(order) => Ok(order),
            Err(e) => {
                self.release(product_id, quantity).await;
                Err(e.into())
            }
        }
    }

    /// Sets the quantity of a pending order's line for a product.
    ///
    /// Zero removes the line. Increases reserve the extra units before
    /// the write; decreases return the surplus after it.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        new_quantity: u32,
    ) -> Result<Order> {
        if new_quantity == 0 {
            return self.remove_item(order_id, product_id).await;
        }

        let mut order = self.get_order(order_id).await?;
        order.ensure_modifiable()?;

        let current = order
            .find_item_by_product(product_id)
            .ok_or_else(|| CheckoutError::not_found("Item", product_id))?
            .quantity;

        if new_quantity == current {
            return Ok(order);
        }

        if new_quantity > current {
            let delta = new_quantity - current;
            self.reserve(product_id, delta).await?;

            set_line_quantity(&mut order, product_id, new_quantity);
            match self.store.update_order(order).await {
                Ok(order) => Ok(order),
                Err(e) => {
                    self.release(product_id, delta).await;
                    Err(e.into())
                }
            }
        } else {
            let delta = current - new_quantity;
            set_line_quantity(&mut order, product_id, new_quantity);

            let order = self.store.update_order(order).await?;
            self.release(product_id, delta).await;
            Ok(order)
        }
    }

    /// Removes a line from a pending order, restoring its stock.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, order_id: OrderId, product_id: ProductId) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        order.ensure_modifiable()?;

        let removed = order.remove_item_by_product(product_id)?;

        let order = self.store.update_order(order).await?;
        self.release(product_id, removed.quantity).await;
        Ok(order)
    }

    /// Moves an order along the status state machine.
    ///
    /// The Pending -> Cancelled edge is the only one with a side effect
    /// (stock restore) and is routed through [`cancel_order`].
    ///
    /// [`cancel_order`]: OrderManager::cancel_order
    #[instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, new_status: OrderStatus) -> Result<Order> {
        if new_status == OrderStatus::Cancelled {
            return self.cancel_order(order_id).await;
        }

        let mut order = self.get_order(order_id).await?;
        order.transition_to(new_status)?;
        let order = self.store.update_order(order).await?;
        info!(order_id = %order.id, status = %order.status, "order status updated");
        Ok(order)
    }

    /// Cancels a pending order and restores every line's stock.
    ///
    /// The Cancelled write goes through the version check first, so two
    /// racing cancellations restore stock exactly once.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        if !order.status.can_cancel() {
            return Err(CheckoutError::OrderNotModifiable {
                status: order.status,
            });
        }

        order.transition_to(OrderStatus::Cancelled)?;
        let order = self.store.update_order(order).await?;

        for item in &order.items {
            self.release(item.product_id, item.quantity).await;
        }

        info!(order_id = %order.id, "order cancelled, stock restored");
        Ok(order)
    }

    /// Records the payment for an order; at most one per order.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        order_id: OrderId,
        amount: Money,
        transaction_ref: Option<String>,
    ) -> Result<Payment> {
        if !amount.is_positive() {
            return Err(CheckoutError::Validation(format!(
                "Invalid payment amount: {amount}"
            )));
        }

        self.get_order(order_id).await?;
        let payment = Payment::new(order_id, amount, transaction_ref);
        Ok(self.store.insert_payment(payment).await?)
    }

    /// Looks up the payment for an order.
    pub async fn get_payment(&self, order_id: OrderId) -> Result<Payment> {
        self.store
            .get_payment_by_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Payment", order_id))
    }

    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if !self.store.decrease_stock(product_id, quantity).await? {
            let available = self
                .store
                .get_product(product_id)
                .await?
                .map(|p| p.stock)
                .unwrap_or(0);
            return Err(CheckoutError::InsufficientStock {
                product: product_id.to_string(),
                available,
                requested: quantity,
            });
        }
        Ok(())
    }

    async fn release(&self, product_id: ProductId, quantity: u32) {
        if let Err(e) = self.store.increase_stock(product_id, quantity).await {
            error!(%product_id, quantity, error = %e, "failed to restore stock");
        }
    }
}

fn set_line_quantity(order: &mut Order, product_id: ProductId, quantity: u32) {
    if let Some(item) = order.find_item_by_product_mut(product_id) {
        item.quantity = quantity;
    }
    order.recalculate_total();
}
