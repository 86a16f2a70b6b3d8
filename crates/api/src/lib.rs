//! HTTP API server for the storefront.
//!
//! Exposes the cart, checkout, and order services over REST with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryStore, Store};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/users", post(routes::users::create::<S>))
        .route(
            "/users/{id}/addresses",
            post(routes::users::create_address::<S>),
        )
        .route("/cart/user/{user_id}", get(routes::cart::get_or_create::<S>))
        .route("/cart/{cart_id}/clear", post(routes::cart::clear::<S>))
        .route("/cart/{cart_id}", delete(routes::cart::delete::<S>))
        .route("/cart_items", post(routes::cart_items::add::<S>))
        .route(
            "/cart_items/{id}/quantity",
            patch(routes::cart_items::update_quantity::<S>),
        )
        .route("/cart_items/{id}", delete(routes::cart_items::remove::<S>))
        .route("/orders/checkout", post(routes::orders::checkout::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/user/{user_id}",
            get(routes::orders::list_by_user::<S>),
        )
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/payment",
            post(routes::orders::record_payment::<S>).get(routes::orders::get_payment::<S>),
        )
        .route("/order_items/{order_id}", post(routes::order_items::add::<S>))
        .route("/order_items/{order_id}", put(routes::order_items::update::<S>))
        .route(
            "/order_items/{order_id}/{product_id}",
            delete(routes::order_items::remove::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(error::attach_error_path))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given store.
pub fn create_state<S: Store>(store: Arc<S>) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}

/// Creates application state backed by the in-memory store.
pub fn create_default_state() -> Arc<AppState<MemoryStore>> {
    create_state(Arc::new(MemoryStore::new()))
}
