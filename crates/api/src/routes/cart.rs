//! Cart-level endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartId, UserId};
use domain::Cart;
use serde::Serialize;
use store::Store;

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price_per_item_cents: i64,
    pub total_price_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_price_cents: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id.to_string(),
            user_id: cart.user_id.to_string(),
            items: cart
                .items
                .iter()
                .map(|item| CartItemResponse {
                    id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    price_per_item_cents: item.price_per_item.cents(),
                    total_price_cents: item.total_price().cents(),
                })
                .collect(),
            total_price_cents: cart.total_price.cents(),
        }
    }
}

/// GET /cart/user/:user_id — the user's cart, created on first access.
#[tracing::instrument(skip(state))]
pub async fn get_or_create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id: UserId = parse_id(&user_id)?;
    let cart = state.carts.get_or_create_cart(user_id).await?;
    Ok(Json(cart.into()))
}

/// POST /cart/:cart_id/clear — remove all items, keep the cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id: CartId = parse_id(&cart_id)?;
    let cart = state.carts.clear_cart(cart_id).await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart/:cart_id — delete the cart and its items.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(cart_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let cart_id: CartId = parse_id(&cart_id)?;
    state.carts.delete_cart(cart_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
