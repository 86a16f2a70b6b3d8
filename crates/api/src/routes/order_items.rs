//! Pending-order line-item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, ProductId};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::OrderResponse;
use crate::routes::{AppState, parse_id};

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// POST /order_items/:order_id — add a product line to a pending order.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
    Json(req): Json<OrderItemRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order_id: OrderId = parse_id(&order_id)?;
    let product_id: ProductId = parse_id(&req.product_id)?;

    let order = state.orders.add_item(order_id, product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// PUT /order_items/:order_id — set a line's quantity (zero removes it).
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
    Json(req): Json<OrderItemRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&order_id)?;
    let product_id: ProductId = parse_id(&req.product_id)?;

    let order = state
        .orders
        .update_item(order_id, product_id, req.quantity)
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /order_items/:order_id/:product_id — remove a line, restore stock.
#[tracing::instrument(skip(state))]
pub async fn remove<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, product_id)): Path<(String, String)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&order_id)?;
    let product_id: ProductId = parse_id(&product_id)?;

    let order = state.orders.remove_item(order_id, product_id).await?;
    Ok(Json(order.into()))
}
