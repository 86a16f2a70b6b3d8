//! PostgreSQL-backed store implementation.

use async_trait::async_trait;
use common::{
    AddressId, CartId, CartItemId, Money, OrderId, OrderItemId, PaymentId, ProductId, UserId,
};
use domain::{Address, Cart, CartItem, Order, OrderItem, Payment, Product, User};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::Store;

/// PostgreSQL store.
///
/// Stock mutation is pushed down to conditional `UPDATE` statements so
/// the check and the write are one atomic operation in the database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        tracing::debug!("connected to postgres");
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the schema if it does not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../schema.sql"))
            .execute(&self.pool)
            .await?;
        tracing::info!("database schema ready");
        Ok(())
    }

    async fn load_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(
            "SELECT id, product_id, quantity, price_per_item_cents \
             FROM cart_items WHERE cart_id = $1",
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CartItem {
                    id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    quantity: row.try_get::<i64, _>("quantity")? as u32,
                    price_per_item: Money::from_cents(row.try_get("price_per_item_cents")?),
                })
            })
            .collect()
    }

    async fn load_cart(&self, row: PgRow) -> Result<Cart> {
        let id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);
        Ok(Cart {
            id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items: self.load_cart_items(id).await?,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            version: row.try_get::<i64, _>("version")? as u64,
        })
    }

    async fn load_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT id, product_id, quantity, price_cents \
             FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderItem {
                    id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    quantity: row.try_get::<i64, _>("quantity")? as u32,
                    price: Money::from_cents(row.try_get("price_cents")?),
                })
            })
            .collect()
    }

    async fn load_order(&self, row: PgRow) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        Ok(Order {
            id,
            order_number: row.try_get("order_number")?,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items: self.load_order_items(id).await?,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: parse_enum(row.try_get::<String, _>("status")?)?,
            shipping_address_id: AddressId::from_uuid(
                row.try_get::<Uuid, _>("shipping_address_id")?,
            ),
            order_date: row.try_get("order_date")?,
            version: row.try_get::<i64, _>("version")? as u64,
        })
    }
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: row.try_get::<i64, _>("stock")? as u32,
        status: parse_enum(row.try_get::<String, _>("status")?)?,
    })
}

fn row_to_payment(row: PgRow) -> Result<Payment> {
    Ok(Payment {
        id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        amount: Money::from_cents(row.try_get("amount_cents")?),
        status: parse_enum(row.try_get::<String, _>("status")?)?,
        transaction_ref: row.try_get("transaction_ref")?,
    })
}

fn parse_enum<T: std::str::FromStr<Err = String>>(s: String) -> Result<T> {
    s.parse()
        .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_product(&self, product: Product) -> Result<Product> {
        sqlx::query(
            "INSERT INTO products (id, name, price_cents, stock, status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .bind(product.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, stock, status FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows =
            sqlx::query("SELECT id, name, price_cents, stock, status FROM products ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        // Stock is deliberately not part of this statement; it only moves
        // through decrease_stock/increase_stock.
        let row = sqlx::query(
            "UPDATE products SET name = $2, price_cents = $3, status = $4 \
             WHERE id = $1 RETURNING stock",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", product.id))?;

        let mut updated = product;
        updated.stock = row.try_get::<i64, _>("stock")? as u32;
        Ok(updated)
    }

    async fn decrease_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        // Check-and-decrement as one conditional statement.
        let result =
            sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                .bind(id.as_uuid())
                .bind(i64::from(quantity))
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(false)
    }

    async fn increase_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    async fn create_user(&self, user: User) -> Result<User> {
        sqlx::query("INSERT INTO users (id, full_name) VALUES ($1, $2)")
            .bind(user.id.as_uuid())
            .bind(&user.full_name)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, full_name FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| {
            Ok(User {
                id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
                full_name: row.try_get("full_name")?,
            })
        })
        .transpose()
    }

    async fn create_address(&self, address: Address) -> Result<Address> {
        sqlx::query("INSERT INTO addresses (id, user_id, line) VALUES ($1, $2, $3)")
            .bind(address.id.as_uuid())
            .bind(address.user_id.as_uuid())
            .bind(&address.line)
            .execute(&self.pool)
            .await?;
        Ok(address)
    }

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>> {
        let row = sqlx::query("SELECT id, user_id, line FROM addresses WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| {
            Ok(Address {
                id: AddressId::from_uuid(row.try_get::<Uuid, _>("id")?),
                user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
                line: row.try_get("line")?,
            })
        })
        .transpose()
    }

    async fn insert_cart(&self, cart: Cart) -> Result<Cart> {
        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1")
            .bind(cart.user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(StoreError::AlreadyExists(format!(
                "User {} already has a cart",
                cart.user_id
            )));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO carts (id, user_id, total_price_cents, version) VALUES ($1, $2, $3, $4)",
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.total_price.cents())
        .bind(cart.version as i64)
        .execute(&mut *tx)
        .await?;

        for item in &cart.items {
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity, price_per_item_cents) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id.as_uuid())
            .bind(cart.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.price_per_item.cents())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(cart)
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, total_price_cents, version FROM carts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.load_cart(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, total_price_cents, version FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.load_cart(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_cart_with_item(&self, item_id: CartItemId) -> Result<Option<Cart>> {
        let cart_id: Option<Uuid> =
            sqlx::query_scalar("SELECT cart_id FROM cart_items WHERE id = $1")
                .bind(item_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        match cart_id {
            Some(id) => self.get_cart(CartId::from_uuid(id)).await,
            None => Ok(None),
        }
    }

    async fn update_cart(&self, cart: Cart) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE carts SET total_price_cents = $2, version = version + 1 \
             WHERE id = $1 AND version = $3",
        )
        .bind(cart.id.as_uuid())
        .bind(cart.total_price.cents())
        .bind(cart.version as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM carts WHERE id = $1")
                .bind(cart.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
            return match actual {
                None => Err(StoreError::not_found("Cart", cart.id)),
                Some(actual) => Err(StoreError::VersionConflict {
                    entity: "Cart",
                    id: cart.id.to_string(),
                    expected: cart.version,
                    actual: actual as u64,
                }),
            };
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await?;
        for item in &cart.items {
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity, price_per_item_cents) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id.as_uuid())
            .bind(cart.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.price_per_item.cents())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let mut updated = cart;
        updated.version += 1;
        Ok(updated)
    }

    async fn delete_cart(&self, id: CartId) -> Result<()> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cart", id));
        }
        Ok(())
    }

    async fn insert_order(&self, order: Order) -> Result<Order> {
        let existing: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE order_number = $1")
            .bind(&order.order_number)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(StoreError::AlreadyExists(format!(
                "Order number already exists: {}",
                order.order_number
            )));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO orders \
             (id, order_number, user_id, total_amount_cents, status, shipping_address_id, order_date, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.user_id.as_uuid())
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.shipping_address_id.as_uuid())
        .bind(order.order_date)
        .bind(order.version as i64)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price_cents, position) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.price.cents())
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, order_number, user_id, total_amount_cents, status, \
             shipping_address_id, order_date, version FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, order_number, user_id, total_amount_cents, status, \
             shipping_address_id, order_date, version FROM orders ORDER BY order_date",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.load_order(row).await?);
        }
        Ok(orders)
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, order_number, user_id, total_amount_cents, status, \
             shipping_address_id, order_date, version \
             FROM orders WHERE user_id = $1 ORDER BY order_date",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.load_order(row).await?);
        }
        Ok(orders)
    }

    async fn update_order(&self, order: Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET total_amount_cents = $2, status = $3, version = version + 1 \
             WHERE id = $1 AND version = $4",
        )
        .bind(order.id.as_uuid())
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.version as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                    .bind(order.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
            return match actual {
                None => Err(StoreError::not_found("Order", order.id)),
                Some(actual) => Err(StoreError::VersionConflict {
                    entity: "Order",
                    id: order.id.to_string(),
                    expected: order.version,
                    actual: actual as u64,
                }),
            };
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id.as_uuid())
            .execute(&mut *tx)
            .await?;
        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price_cents, position) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.price.cents())
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let mut updated = order;
        updated.version += 1;
        Ok(updated)
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment> {
        let existing: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM payments WHERE order_id = $1")
                .bind(payment.order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(StoreError::AlreadyExists(format!(
                "Order {} already has a payment",
                payment.order_id
            )));
        }

        sqlx::query(
            "INSERT INTO payments (id, order_id, amount_cents, status, transaction_ref) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.amount.cents())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_ref)
        .execute(&self.pool)
        .await?;
        Ok(payment)
    }

    async fn get_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let row = sqlx::query(
            "SELECT id, order_id, amount_cents, status, transaction_ref \
             FROM payments WHERE order_id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_payment).transpose()
    }
}
