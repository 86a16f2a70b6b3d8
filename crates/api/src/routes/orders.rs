//! Checkout, order lifecycle, and payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{AddressId, Money, OrderId, UserId};
use domain::{Order, OrderStatus, Payment};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price_cents: i64,
    pub total_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount_cents: i64,
    pub status: String,
    pub shipping_address_id: String,
    pub order_date: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.clone(),
            user_id: order.user_id.to_string(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    price_cents: item.price.cents(),
                    total_price_cents: item.total_price().cents(),
                })
                .collect(),
            total_amount_cents: order.total_amount.cents(),
            status: order.status.to_string(),
            shipping_address_id: order.shipping_address_id.to_string(),
            order_date: order.order_date.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub status: String,
    pub transaction_ref: Option<String>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            order_id: payment.order_id.to_string(),
            amount_cents: payment.amount.cents(),
            status: payment.status.to_string(),
            transaction_ref: payment.transaction_ref,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutParams {
    pub user_id: String,
    pub address_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: String,
}

#[derive(Deserialize)]
pub struct RecordPaymentRequest {
    pub amount_cents: i64,
    pub transaction_ref: Option<String>,
}

/// POST /orders/checkout?user_id=&address_id= — convert the cart into an order.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<CheckoutParams>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id: UserId = parse_id(&params.user_id)?;
    let address_id: AddressId = parse_id(&params.address_id)?;

    let order = state.checkout.checkout(user_id, address_id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list all orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/:id — look up a single order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /orders/user/:user_id — list a user's orders.
#[tracing::instrument(skip(state))]
pub async fn list_by_user<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id: UserId = parse_id(&user_id)?;
    let orders = state.orders.list_orders_by_user(user_id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// PUT /orders/:id/status?status= — move an order along its lifecycle.
#[tracing::instrument(skip(state))]
pub async fn update_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<StatusParams>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let status = params
        .status
        .parse::<OrderStatus>()
        .map_err(ApiError::BadRequest)?;

    let order = state.orders.update_status(order_id, status).await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/cancel — cancel a pending order, restoring stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state.orders.cancel_order(order_id).await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/payment — record the order's payment.
#[tracing::instrument(skip(state, req))]
pub async fn record_payment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let payment = state
        .orders
        .record_payment(order_id, Money::from_cents(req.amount_cents), req.transaction_ref)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// GET /orders/:id/payment — look up the order's payment.
#[tracing::instrument(skip(state))]
pub async fn get_payment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let payment = state.orders.get_payment(order_id).await?;
    Ok(Json(payment.into()))
}
