//! Checkout orchestrator.
//!
//! Converts a cart into an order as a single all-or-nothing unit. Stock
//! reservation is the conditional decrement in the store; everything
//! applied before a failure is compensated with a matching increment, so
//! an aborted checkout leaves stock, cart, and orders exactly as found.

use std::sync::Arc;

use common::{AddressId, ProductId, UserId};
use domain::{Cart, Order, OrderItem};
use store::Store;
use tracing::{error, info, instrument, warn};

use crate::error::{CheckoutError, Result};

/// Drives the cart-to-order conversion.
pub struct CheckoutOrchestrator<S: Store> {
    store: Arc<S>,
}

impl<S: Store> CheckoutOrchestrator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Checks out the user's cart into a new pending order.
    ///
    /// Order lines carry the cart-snapshot price, not the current catalog
    /// price. Two concurrent checkouts of the last unit of a product
    /// cannot both succeed: each line is reserved via the store's
    /// conditional decrement.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId, address_id: AddressId) -> Result<Order> {
        metrics::counter!("checkout_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(user_id, address_id).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                info!(order_id = %order.id, order_number = %order.order_number, "checkout completed");
            }
            Err(e) => {
                metrics::counter!("checkout_failures_total").increment(1);
                warn!(error = %e, "checkout aborted");
            }
        }
        result
    }

    async fn run(&self, user_id: UserId, address_id: AddressId) -> Result<Order> {
        // Preconditions: user, address ownership, non-empty cart.
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("User", user_id))?;

        let address = self
            .store
            .get_address(address_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Address", address_id))?;
        if address.user_id != user_id {
            return Err(CheckoutError::Unauthorized(format!(
                "Address {address_id} does not belong to user {user_id}"
            )));
        }

        let cart = self
            .store
            .get_cart_by_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Cart", user_id))?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 1. Validate every line against live stock before touching anything.
        for item in &cart.items {
            let product = self
                .store
                .get_product(item.product_id)
                .await?
                .ok_or_else(|| CheckoutError::not_found("Product", item.product_id))?;

            if !product.status.can_be_purchased() {
                return Err(CheckoutError::ProductNotAvailable {
                    product: item.product_id.to_string(),
                });
            }
            if product.stock < item.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product: item.product_id.to_string(),
                    available: product.stock,
                    requested: item.quantity,
                });
            }
        }

        // 2. Build the order from the cart snapshot.
        let mut order = Order::new(user_id, address_id);
        for item in &cart.items {
            order.push_item(OrderItem::new(
                item.product_id,
                item.quantity,
                item.price_per_item,
            ));
        }

        // 3. Reserve stock line by line, tracking what applied so a failed
        // line can undo the rest.
        let mut applied: Vec<(ProductId, u32)> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let reserved = match self.store.decrease_stock(item.product_id, item.quantity).await {
                Ok(reserved) => reserved,
                Err(e) => {
                    self.release_stock(&applied).await;
                    return Err(e.into());
                }
            };

            if !reserved {
                self.release_stock(&applied).await;
                let available = self
                    .store
                    .get_product(item.product_id)
                    .await?
                    .map(|p| p.stock)
                    .unwrap_or(0);
                return Err(CheckoutError::InsufficientStock {
                    product: item.product_id.to_string(),
                    available,
                    requested: item.quantity,
                });
            }
            applied.push((item.product_id, item.quantity));
        }

        // 4. Clear the cart under the version check. A concurrent cart
        // mutation means the snapshot we reserved against is stale, so
        // abort rather than silently dropping the customer's change.
        let mut cleared = cart.clone();
        cleared.clear();
        if let Err(e) = self.store.update_cart(cleared).await {
            self.release_stock(&applied).await;
            return Err(e.into());
        }

        // 5. Persist the order last. Failure here is exceptional: undo the
        // reservation and put the cart contents back.
        match self.store.insert_order(order).await {
            Ok(order) => Ok(order),
            Err(e) => {
                self.release_stock(&applied).await;
                self.restore_cart(cart).await;
                Err(CheckoutError::OperationFailed {
                    operation: "persist order",
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Undoes already-applied stock decrements.
    async fn release_stock(&self, applied: &[(ProductId, u32)]) {
        for &(product_id, quantity) in applied {
            if let Err(e) = self.store.increase_stock(product_id, quantity).await {
                error!(%product_id, quantity, error = %e, "failed to release reserved stock");
            }
        }
    }

    /// Best-effort restore of the cart contents after a late failure.
    async fn restore_cart(&self, cart: Cart) {
        let cart_id = cart.id;
        let current = match self.store.get_cart(cart_id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                error!(%cart_id, "cart vanished during checkout rollback");
                return;
            }
            Err(e) => {
                error!(%cart_id, error = %e, "failed to reload cart for rollback");
                return;
            }
        };

        let mut restored = current;
        restored.items = cart.items;
        restored.recalculate_total();
        if let Err(e) = self.store.update_cart(restored).await {
            error!(%cart_id, error = %e, "failed to restore cart after aborted checkout");
        }
    }
}
