//! End-to-end checkout pipeline tests over the in-memory store.

use std::sync::Arc;

use checkout::{CartManager, CheckoutError, CheckoutOrchestrator, OrderManager};
use common::{Money, ProductId, UserId};
use domain::{Address, Cart, OrderStatus, Product, User};
use store::{MemoryStore, Store};

struct Fixture {
    store: Arc<MemoryStore>,
    carts: CartManager<MemoryStore>,
    checkout: CheckoutOrchestrator<MemoryStore>,
    orders: OrderManager<MemoryStore>,
    user: User,
    address: Address,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::default());
    let user = store.create_user(User::new("Ada")).await.unwrap();
    let address = store
        .create_address(Address::new(user.id, "1 Analytical Way"))
        .await
        .unwrap();

    Fixture {
        carts: CartManager::new(Arc::clone(&store)),
        checkout: CheckoutOrchestrator::new(Arc::clone(&store)),
        orders: OrderManager::new(Arc::clone(&store)),
        store,
        user,
        address,
    }
}

impl Fixture {
    async fn product(&self, name: &str, cents: i64, stock: u32) -> Product {
        self.store
            .create_product(Product::new(name, Money::from_cents(cents), stock))
            .await
            .unwrap()
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> checkout::Result<Cart> {
        let cart = self.carts.get_or_create_cart(user_id).await?;
        self.carts.add_item(cart.id, product_id, quantity).await
    }

    async fn stock_of(&self, product: &Product) -> u32 {
        self.store
            .get_product(product.id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }
}

#[tokio::test]
async fn test_checkout_converts_cart_into_order() {
    let fx = fixture().await;
    let a = fx.product("Product A", 1000, 10).await;
    let b = fx.product("Product B", 500, 10).await;

    fx.add_to_cart(fx.user.id, a.id, 2).await.unwrap();
    fx.add_to_cart(fx.user.id, b.id, 1).await.unwrap();

    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount.cents(), 2500);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.find_item_by_product(a.id).unwrap().price.cents(), 1000);
    assert_eq!(order.find_item_by_product(b.id).unwrap().price.cents(), 500);

    assert_eq!(fx.stock_of(&a).await, 8);
    assert_eq!(fx.stock_of(&b).await, 9);

    let cart = fx.carts.get_or_create_cart(fx.user.id).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total_price, Money::zero());
}

#[tokio::test]
async fn test_checkout_charges_cart_snapshot_price() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;

    fx.add_to_cart(fx.user.id, product.id, 2).await.unwrap();

    // Catalog price moves after the item is in the cart.
    let mut repriced = product.clone();
    repriced.price = Money::from_cents(1200);
    fx.store.update_product(repriced).await.unwrap();

    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();
    assert_eq!(
        order.find_item_by_product(product.id).unwrap().price.cents(),
        1000
    );
    assert_eq!(order.total_amount.cents(), 2000);
}

#[tokio::test]
async fn test_concurrent_checkout_of_last_unit() {
    let fx = fixture().await;
    let product = fx.product("Product C", 1000, 1).await;

    let other_user = fx.store.create_user(User::new("Grace")).await.unwrap();
    let other_address = fx
        .store
        .create_address(Address::new(other_user.id, "2 Compiler Court"))
        .await
        .unwrap();

    fx.add_to_cart(fx.user.id, product.id, 1).await.unwrap();
    fx.add_to_cart(other_user.id, product.id, 1).await.unwrap();

    let store_a = Arc::clone(&fx.store);
    let store_b = Arc::clone(&fx.store);
    let (user_a, addr_a) = (fx.user.id, fx.address.id);
    let (user_b, addr_b) = (other_user.id, other_address.id);

    let first = tokio::spawn(async move {
        CheckoutOrchestrator::new(store_a).checkout(user_a, addr_a).await
    });
    let second = tokio::spawn(async move {
        CheckoutOrchestrator::new(store_b).checkout(user_b, addr_b).await
    });

    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(
        first.is_ok() ^ second.is_ok(),
        "exactly one checkout must win the last unit"
    );
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser,
        Err(CheckoutError::InsufficientStock { .. })
    ));

    assert_eq!(fx.stock_of(&product).await, 0);
    assert_eq!(fx.store.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_explicit_cart_creation_is_unique_per_user() {
    let fx = fixture().await;

    let cart = fx.carts.create_cart(fx.user.id).await.unwrap();
    let again = fx.carts.create_cart(fx.user.id).await;
    assert!(matches!(again, Err(CheckoutError::AlreadyExists(_))));

    // The lazy path hands back the existing cart instead of failing.
    let same = fx.carts.get_or_create_cart(fx.user.id).await.unwrap();
    assert_eq!(same.id, cart.id);
}

#[tokio::test]
async fn test_concurrent_first_cart_access_lands_on_one_cart() {
    let fx = fixture().await;
    let user_id = fx.user.id;

    let carts_a = CartManager::new(Arc::clone(&fx.store));
    let carts_b = CartManager::new(Arc::clone(&fx.store));

    let (a, b) = tokio::join!(
        tokio::spawn(async move { carts_a.get_or_create_cart(user_id).await }),
        tokio::spawn(async move { carts_b.get_or_create_cart(user_id).await }),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Neither caller may see the insert race as an error.
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);
}

#[tokio::test]
async fn test_checkout_empty_cart_fails() {
    let fx = fixture().await;
    fx.carts.get_or_create_cart(fx.user.id).await.unwrap();

    let result = fx.checkout.checkout(fx.user.id, fx.address.id).await;
    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    assert!(fx.store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insufficient_stock_aborts_whole_checkout() {
    let fx = fixture().await;
    let a = fx.product("Product A", 1000, 10).await;
    let scarce = fx.product("Scarce", 500, 1).await;

    fx.add_to_cart(fx.user.id, a.id, 2).await.unwrap();
    fx.add_to_cart(fx.user.id, scarce.id, 3).await.unwrap();

    let result = fx.checkout.checkout(fx.user.id, fx.address.id).await;
    assert!(matches!(
        result,
        Err(CheckoutError::InsufficientStock { .. })
    ));

    // Nothing committed: stock untouched, cart intact, no order.
    assert_eq!(fx.stock_of(&a).await, 10);
    assert_eq!(fx.stock_of(&scarce).await, 1);
    let cart = fx.carts.get_or_create_cart(fx.user.id).await.unwrap();
    assert_eq!(cart.items.len(), 2);
    assert!(fx.store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unowned_address_is_rejected() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;
    fx.add_to_cart(fx.user.id, product.id, 1).await.unwrap();

    let stranger = fx.store.create_user(User::new("Mallory")).await.unwrap();
    let foreign = fx
        .store
        .create_address(Address::new(stranger.id, "13 Elsewhere"))
        .await
        .unwrap();

    let result = fx.checkout.checkout(fx.user.id, foreign.id).await;
    assert!(matches!(result, Err(CheckoutError::Unauthorized(_))));
}

#[tokio::test]
async fn test_reducing_order_line_restores_stock() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;

    fx.add_to_cart(fx.user.id, product.id, 3).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();
    assert_eq!(fx.stock_of(&product).await, 7);
    assert_eq!(order.total_amount.cents(), 3000);

    let order = fx.orders.update_item(order.id, product.id, 1).await.unwrap();

    assert_eq!(fx.stock_of(&product).await, 9);
    assert_eq!(order.total_amount.cents(), 1000);
    assert_eq!(order.find_item_by_product(product.id).unwrap().quantity, 1);
}

#[tokio::test]
async fn test_increasing_order_line_reserves_stock() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 5).await;

    fx.add_to_cart(fx.user.id, product.id, 2).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();
    assert_eq!(fx.stock_of(&product).await, 3);

    let order = fx.orders.update_item(order.id, product.id, 4).await.unwrap();
    assert_eq!(fx.stock_of(&product).await, 1);
    assert_eq!(order.total_amount.cents(), 4000);

    // Asking for more than remains must fail without partial effects.
    let result = fx.orders.update_item(order.id, product.id, 10).await;
    assert!(matches!(
        result,
        Err(CheckoutError::InsufficientStock { .. })
    ));
    assert_eq!(fx.stock_of(&product).await, 1);
}

#[tokio::test]
async fn test_order_add_item_uses_current_price() {
    let fx = fixture().await;
    let a = fx.product("Product A", 1000, 10).await;
    let b = fx.product("Product B", 700, 10).await;

    fx.add_to_cart(fx.user.id, a.id, 1).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();

    let order = fx.orders.add_item(order.id, b.id, 2).await.unwrap();

    assert_eq!(order.find_item_by_product(b.id).unwrap().price.cents(), 700);
    assert_eq!(order.total_amount.cents(), 2400);
    assert_eq!(fx.stock_of(&b).await, 8);
}

#[tokio::test]
async fn test_order_merge_keeps_line_locked_price() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;

    fx.add_to_cart(fx.user.id, product.id, 1).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();

    // Catalog price moves after the order locked its line at 1000.
    let mut repriced = product.clone();
    repriced.price = Money::from_cents(1200);
    fx.store.update_product(repriced).await.unwrap();

    let order = fx.orders.add_item(order.id, product.id, 2).await.unwrap();

    // Units merged into an existing line keep that line's locked price.
    let line = order.find_item_by_product(product.id).unwrap();
    assert_eq!(line.quantity, 3);
    assert_eq!(line.price.cents(), 1000);
    assert_eq!(order.total_amount.cents(), 3000);
    assert_eq!(fx.stock_of(&product).await, 7);
}

#[tokio::test]
async fn test_cancel_restores_stock_exactly_once() {
    let fx = fixture().await;
    let a = fx.product("Product A", 1000, 10).await;
    let b = fx.product("Product B", 500, 10).await;

    fx.add_to_cart(fx.user.id, a.id, 2).await.unwrap();
    fx.add_to_cart(fx.user.id, b.id, 3).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();
    assert_eq!(fx.stock_of(&a).await, 8);
    assert_eq!(fx.stock_of(&b).await, 7);

    let order = fx.orders.cancel_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(fx.stock_of(&a).await, 10);
    assert_eq!(fx.stock_of(&b).await, 10);

    let repeat = fx.orders.cancel_order(order.id).await;
    assert!(matches!(
        repeat,
        Err(CheckoutError::OrderNotModifiable {
            status: OrderStatus::Cancelled
        })
    ));
    assert_eq!(fx.stock_of(&a).await, 10);
    assert_eq!(fx.stock_of(&b).await, 10);
}

#[tokio::test]
async fn test_status_walk_and_illegal_jump() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;
    fx.add_to_cart(fx.user.id, product.id, 1).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();

    let order = fx
        .orders
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();

    // Confirmed orders are frozen: no cancellation, no item edits.
    assert!(matches!(
        fx.orders.cancel_order(order.id).await,
        Err(CheckoutError::OrderNotModifiable { .. })
    ));
    assert!(matches!(
        fx.orders.add_item(order.id, product.id, 1).await,
        Err(CheckoutError::OrderNotModifiable { .. })
    ));

    let order = fx
        .orders
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    let order = fx
        .orders
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    let jump = fx.orders.update_status(order.id, OrderStatus::Confirmed).await;
    assert!(matches!(
        jump,
        Err(CheckoutError::InvalidStatusTransition { .. })
    ));
}

#[tokio::test]
async fn test_payment_is_one_to_one_with_order() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;
    fx.add_to_cart(fx.user.id, product.id, 2).await.unwrap();
    let order = fx.checkout.checkout(fx.user.id, fx.address.id).await.unwrap();

    let payment = fx
        .orders
        .record_payment(order.id, order.total_amount, Some("txn-1".into()))
        .await
        .unwrap();
    assert_eq!(payment.amount.cents(), 2000);

    let duplicate = fx
        .orders
        .record_payment(order.id, order.total_amount, Some("txn-2".into()))
        .await;
    assert!(matches!(duplicate, Err(CheckoutError::AlreadyExists(_))));

    let fetched = fx.orders.get_payment(order.id).await.unwrap();
    assert_eq!(fetched.id, payment.id);
}

#[tokio::test]
async fn test_cart_quantity_zero_rejected_on_direct_path() {
    let fx = fixture().await;
    let product = fx.product("Product A", 1000, 10).await;

    let cart = fx.add_to_cart(fx.user.id, product.id, 2).await.unwrap();
    let item_id = cart.items[0].id;

    let result = fx.carts.update_item_quantity(item_id, 0).await;
    assert!(matches!(result, Err(CheckoutError::Validation(_))));

    // The by-product path removes on zero instead.
    let cart = fx
        .carts
        .update_product_quantity(fx.user.id, product.id, 0)
        .await
        .unwrap();
    assert!(cart.is_empty());
}
