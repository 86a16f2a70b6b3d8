//! Route handlers and shared application state.

pub mod cart;
pub mod cart_items;
pub mod health;
pub mod metrics;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod users;

use std::sync::Arc;

use checkout::{CartManager, CheckoutOrchestrator, OrderManager};
use store::Store;
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: Arc<S>,
    pub carts: CartManager<S>,
    pub checkout: CheckoutOrchestrator<S>,
    pub orders: OrderManager<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            carts: CartManager::new(Arc::clone(&store)),
            checkout: CheckoutOrchestrator::new(Arc::clone(&store)),
            orders: OrderManager::new(Arc::clone(&store)),
            store,
        }
    }
}

fn parse_id<T: From<Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
