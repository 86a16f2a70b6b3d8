//! Cart line-item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CartId, CartItemId, ProductId};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::routes::cart::CartResponse;
use crate::routes::{AppState, parse_id};

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuantityParams {
    pub quantity: u32,
}

/// POST /cart_items — add a product to a cart.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let cart_id: CartId = parse_id(&req.cart_id)?;
    let product_id: ProductId = parse_id(&req.product_id)?;

    let cart = state.carts.add_item(cart_id, product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(cart.into())))
}

/// PATCH /cart_items/:id/quantity?quantity=N — set a line's quantity.
#[tracing::instrument(skip(state))]
pub async fn update_quantity<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<QuantityParams>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id: CartItemId = parse_id(&id)?;
    let cart = state
        .carts
        .update_item_quantity(item_id, params.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart_items/:id — remove a line from its cart.
#[tracing::instrument(skip(state))]
pub async fn remove<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id: CartItemId = parse_id(&id)?;
    let cart = state.carts.remove_item(item_id).await?;
    Ok(Json(cart.into()))
}
