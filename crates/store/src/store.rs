//! The storage trait.

use async_trait::async_trait;
use common::{AddressId, CartId, CartItemId, OrderId, ProductId, UserId};
use domain::{Address, Cart, Order, Payment, Product, User};

use crate::error::Result;

/// Storage seam for all persisted storefront records.
///
/// Ownership edges (cart -> items, order -> items) are stored as whole
/// aggregates: deleting an owner deletes its children in the same unit.
/// Weak references (item -> product, order -> address) are plain
/// identifiers resolved through lookups.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Products / Stock Ledger --

    /// Inserts a new product.
    async fn create_product(&self, product: Product) -> Result<Product>;

    /// Looks up a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Returns all products.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Replaces a product's catalog fields (name, price, status).
    ///
    /// The stored stock counter is kept as-is: stock only moves through
    /// the decrement/increment primitives below.
    async fn update_product(&self, product: Product) -> Result<Product>;

    /// Atomically decrements stock iff at least `quantity` units remain.
    ///
    /// Returns whether the decrement applied. This is the single
    /// correctness mechanism against overselling: callers must check the
    /// result rather than assuming success.
    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<bool>;

    /// Atomically increments stock (cancellations and line removals).
    async fn increase_stock(&self, id: ProductId, quantity: u32) -> Result<()>;

    // -- Users & addresses (collaborator records) --

    /// Inserts a new user.
    async fn create_user(&self, user: User) -> Result<User>;

    /// Looks up a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Inserts a new address.
    async fn create_address(&self, address: Address) -> Result<Address>;

    /// Looks up an address by ID.
    async fn get_address(&self, id: AddressId) -> Result<Option<Address>>;

    // -- Carts --

    /// Inserts a new cart; fails with `AlreadyExists` if the user has one.
    async fn insert_cart(&self, cart: Cart) -> Result<Cart>;

    /// Looks up a cart by ID.
    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>>;

    /// Looks up a user's cart.
    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Finds the cart owning the given line item.
    async fn find_cart_with_item(&self, item_id: CartItemId) -> Result<Option<Cart>>;

    /// Replaces a cart and its items, enforcing the version check.
    ///
    /// The incoming cart's `version` must match the stored one; the
    /// persisted copy (returned) carries `version + 1`.
    async fn update_cart(&self, cart: Cart) -> Result<Cart>;

    /// Deletes a cart and, cascading, its items.
    async fn delete_cart(&self, id: CartId) -> Result<()>;

    // -- Orders --

    /// Inserts a new order with its items.
    async fn insert_order(&self, order: Order) -> Result<Order>;

    /// Looks up an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns all orders, oldest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Returns a user's orders, oldest first.
    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Replaces an order and its items, enforcing the version check.
    async fn update_order(&self, order: Order) -> Result<Order>;

    // -- Payments --

    /// Inserts a payment; fails with `AlreadyExists` if the order has one.
    async fn insert_payment(&self, payment: Payment) -> Result<Payment>;

    /// Looks up the payment for an order.
    async fn get_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>>;
}
