//! In-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AddressId, CartId, CartItemId, OrderId, PaymentId, ProductId, UserId};
use domain::{Address, Cart, Order, Payment, Product, User};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::Store;

/// In-memory store used by tests and the default server.
///
/// Each table is guarded by its own `RwLock`; the conditional stock
/// decrement performs its check and write under a single write-lock
/// acquisition, which makes it atomic with respect to concurrent sales.
#[derive(Clone, Default)]
pub struct MemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
    addresses: Arc<RwLock<HashMap<AddressId, Address>>>,
    carts: Arc<RwLock<HashMap<CartId, Cart>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_product(&self, product: Product) -> Result<Product> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(StoreError::AlreadyExists(format!(
                "Product already exists: {}",
                product.id
            )));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        let mut products = self.products.write().await;
        let stored = products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::not_found("Product", product.id))?;

        let mut updated = product;
        updated.stock = stored.stock;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;

        if product.stock < quantity {
            return Ok(false);
        }
        product.stock -= quantity;
        Ok(true)
    }

    async fn increase_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.stock += quantity;
        Ok(())
    }

    async fn create_user(&self, user: User) -> Result<User> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_address(&self, address: Address) -> Result<Address> {
        self.addresses
            .write()
            .await
            .insert(address.id, address.clone());
        Ok(address)
    }

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>> {
        Ok(self.addresses.read().await.get(&id).cloned())
    }

    async fn insert_cart(&self, cart: Cart) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        if carts.values().any(|c| c.user_id == cart.user_id) {
            return Err(StoreError::AlreadyExists(format!(
                "User {} already has a cart",
                cart.user_id
            )));
        }
        carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&id).cloned())
    }

    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let carts = self.carts.read().await;
        Ok(carts.values().find(|c| c.user_id == user_id).cloned())
    }

    async fn find_cart_with_item(&self, item_id: CartItemId) -> Result<Option<Cart>> {
        let carts = self.carts.read().await;
        Ok(carts
            .values()
            .find(|c| c.items.iter().any(|item| item.id == item_id))
            .cloned())
    }

    async fn update_cart(&self, cart: Cart) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let stored = carts
            .get_mut(&cart.id)
            .ok_or_else(|| StoreError::not_found("Cart", cart.id))?;

        if stored.version != cart.version {
            return Err(StoreError::VersionConflict {
                entity: "Cart",
                id: cart.id.to_string(),
                expected: cart.version,
                actual: stored.version,
            });
        }

        let mut updated = cart;
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_cart(&self, id: CartId) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("Cart", id))?;
        Ok(())
    }

    async fn insert_order(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::AlreadyExists(format!(
                "Order number already exists: {}",
                order.order_number
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.order_date);
        Ok(all)
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut mine: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by_key(|o| o.order_date);
        Ok(mine)
    }

    async fn update_order(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::not_found("Order", order.id))?;

        if stored.version != order.version {
            return Err(StoreError::VersionConflict {
                entity: "Order",
                id: order.id.to_string(),
                expected: order.version,
                actual: stored.version,
            });
        }

        let mut updated = order;
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self.payments.write().await;
        if payments.values().any(|p| p.order_id == payment.order_id) {
            return Err(StoreError::AlreadyExists(format!(
                "Order {} already has a payment",
                payment.order_id
            )));
        }
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.values().find(|p| p.order_id == order_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn product(stock: u32) -> Product {
        Product::new("Widget", Money::from_cents(1000), stock)
    }

    #[tokio::test]
    async fn test_decrease_stock_applies_when_sufficient() {
        let store = MemoryStore::new();
        let p = store.create_product(product(5)).await.unwrap();

        assert!(store.decrease_stock(p.id, 3).await.unwrap());
        assert_eq!(store.get_product(p.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_decrease_stock_refuses_when_insufficient() {
        let store = MemoryStore::new();
        let p = store.create_product(product(2)).await.unwrap();

        assert!(!store.decrease_stock(p.id, 3).await.unwrap());
        assert_eq!(store.get_product(p.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_decrease_stock_missing_product() {
        let store = MemoryStore::new();
        let result = store.decrease_stock(ProductId::new(), 1).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_decrement_of_last_unit() {
        let store = MemoryStore::new();
        let p = store.create_product(product(1)).await.unwrap();

        let s1 = store.clone();
        let s2 = store.clone();
        let id = p.id;
        let (a, b) = tokio::join!(
            tokio::spawn(async move { s1.decrease_stock(id, 1).await.unwrap() }),
            tokio::spawn(async move { s2.decrease_stock(id, 1).await.unwrap() }),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a ^ b, "exactly one decrement must win");
        assert_eq!(store.get_product(p.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_update_product_keeps_stock() {
        let store = MemoryStore::new();
        let p = store.create_product(product(5)).await.unwrap();
        store.decrease_stock(p.id, 2).await.unwrap();

        let mut repriced = p.clone();
        repriced.price = Money::from_cents(1500);
        repriced.stock = 999;
        let updated = store.update_product(repriced).await.unwrap();

        assert_eq!(updated.price.cents(), 1500);
        assert_eq!(updated.stock, 3);
    }

    #[tokio::test]
    async fn test_increase_stock() {
        let store = MemoryStore::new();
        let p = store.create_product(product(1)).await.unwrap();

        store.increase_stock(p.id, 4).await.unwrap();
        assert_eq!(store.get_product(p.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_one_cart_per_user() {
        let store = MemoryStore::new();
        let user_id = UserId::new();

        store.insert_cart(Cart::new(user_id)).await.unwrap();
        let result = store.insert_cart(Cart::new(user_id)).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_cart_version_check() {
        let store = MemoryStore::new();
        let cart = store.insert_cart(Cart::new(UserId::new())).await.unwrap();

        let updated = store.update_cart(cart.clone()).await.unwrap();
        assert_eq!(updated.version, 1);

        // Writing from the stale copy must fail.
        let result = store.update_cart(cart).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn test_find_cart_with_item() {
        let store = MemoryStore::new();
        let p = store.create_product(product(5)).await.unwrap();
        let mut cart = Cart::new(UserId::new());
        let item_id = cart.add_item(&p, 2).unwrap();
        store.insert_cart(cart.clone()).await.unwrap();

        let found = store.find_cart_with_item(item_id).await.unwrap().unwrap();
        assert_eq!(found.id, cart.id);
        assert!(
            store
                .find_cart_with_item(CartItemId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_cart() {
        let store = MemoryStore::new();
        let cart = store.insert_cart(Cart::new(UserId::new())).await.unwrap();

        store.delete_cart(cart.id).await.unwrap();
        assert!(store.get_cart(cart.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_cart(cart.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_order_number_unique() {
        let store = MemoryStore::new();
        let order = Order::new(UserId::new(), AddressId::new());
        let mut dup = Order::new(UserId::new(), AddressId::new());
        dup.order_number = order.order_number.clone();

        store.insert_order(order).await.unwrap();
        assert!(matches!(
            store.insert_order(dup).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_user() {
        let store = MemoryStore::new();
        let user_id = UserId::new();
        store
            .insert_order(Order::new(user_id, AddressId::new()))
            .await
            .unwrap();
        store
            .insert_order(Order::new(UserId::new(), AddressId::new()))
            .await
            .unwrap();

        assert_eq!(store.list_orders().await.unwrap().len(), 2);
        assert_eq!(store.list_orders_by_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_payment_per_order() {
        let store = MemoryStore::new();
        let order_id = OrderId::new();

        store
            .insert_payment(Payment::new(order_id, Money::from_cents(100), None))
            .await
            .unwrap();
        let result = store
            .insert_payment(Payment::new(order_id, Money::from_cents(100), None))
            .await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert!(
            store
                .get_payment_by_order(order_id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
