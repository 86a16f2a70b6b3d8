//! Cart service.
//!
//! All cart mutations go through here: load the aggregate, mutate it in
//! memory, write it back with the version check. Cart operations never
//! touch product stock; reservation happens at checkout only.

use std::sync::Arc;

use common::{CartId, CartItemId, ProductId, UserId};
use domain::{Cart, Product};
use store::{Store, StoreError};
use tracing::{debug, instrument};

use crate::error::{CheckoutError, Result};

/// Manages per-user cart aggregates.
pub struct CartManager<S: Store> {
    store: Arc<S>,
}

impl<S: Store> CartManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        if let Some(cart) = self.store.get_cart_by_user(user_id).await? {
            return Ok(cart);
        }

        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("User", user_id))?;

        match self.store.insert_cart(Cart::new(user_id)).await {
            Ok(cart) => {
                debug!(cart_id = %cart.id, %user_id, "created cart");
                Ok(cart)
            }
            // A concurrent first access can win the insert; hand back its cart.
            Err(StoreError::AlreadyExists(_)) => self.get_cart_by_user(user_id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a cart explicitly; fails if the user already has one.
    #[instrument(skip(self))]
    pub async fn create_cart(&self, user_id: UserId) -> Result<Cart> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("User", user_id))?;
        Ok(self.store.insert_cart(Cart::new(user_id)).await?)
    }

    /// Looks up a user's cart without creating one.
    pub async fn get_cart_by_user(&self, user_id: UserId) -> Result<Cart> {
        self.store
            .get_cart_by_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Cart", user_id))
    }

    /// Looks up a cart by ID.
    pub async fn get_cart(&self, cart_id: CartId) -> Result<Cart> {
        self.store
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Cart", cart_id))
    }

    /// Adds `quantity` units of a product to a cart.
    ///
    /// The line price is snapshotted from the product's current price when
    /// the line is first created; merging into an existing line keeps the
    /// original snapshot. Stock is not checked here.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let product = self.purchasable_product(product_id).await?;

        let mut cart = self.get_cart(cart_id).await?;
        cart.add_item(&product, quantity)?;

        let cart = self.store.update_cart(cart).await?;
        debug!(cart_id = %cart.id, %product_id, quantity, "added cart item");
        Ok(cart)
    }

    /// Sets the quantity of an existing cart line.
    ///
    /// Zero is rejected on this path; removal is a separate, explicit
    /// operation.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(CheckoutError::Validation(
                "Quantity must be greater than 0; use remove to delete the item".into(),
            ));
        }

        let mut cart = self.cart_with_item(item_id).await?;
        cart.set_item_quantity(item_id, quantity)?;
        Ok(self.store.update_cart(cart).await?)
    }

    /// Sets the quantity of the line for a product in the user's cart,
    /// removing the line when `quantity` is zero.
    #[instrument(skip(self))]
    pub async fn update_product_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut cart = self
            .store
            .get_cart_by_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Cart", user_id))?;

        if quantity > 0 && cart.find_item_by_product(product_id).is_none() {
            return Err(CheckoutError::not_found("Item", product_id));
        }

        cart.update_item_quantity(product_id, quantity);
        Ok(self.store.update_cart(cart).await?)
    }

    /// Removes a cart line.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<Cart> {
        let mut cart = self.cart_with_item(item_id).await?;
        cart.remove_item(item_id)?;
        Ok(self.store.update_cart(cart).await?)
    }

    /// Removes every line from the cart; the cart itself survives.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, cart_id: CartId) -> Result<Cart> {
        let mut cart = self.get_cart(cart_id).await?;
        cart.clear();
        Ok(self.store.update_cart(cart).await?)
    }

    /// Deletes a cart and its lines.
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, cart_id: CartId) -> Result<()> {
        Ok(self.store.delete_cart(cart_id).await?)
    }

    async fn cart_with_item(&self, item_id: CartItemId) -> Result<Cart> {
        self.store
            .find_cart_with_item(item_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Cart item", item_id))
    }

    async fn purchasable_product(&self, product_id: ProductId) -> Result<Product> {
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
        Ok(product)
    }
}
