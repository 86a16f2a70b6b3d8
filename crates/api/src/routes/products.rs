//! Product catalog endpoints (collaborator glue for the checkout flow).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::CheckoutError;
use common::{Money, ProductId};
use domain::{Product, ProductStatus};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    pub status: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price_cents: product.price.cents(),
            stock: product.stock,
            status: product.status.to_string(),
        }
    }
}

/// POST /products — register a new catalog product.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.price_cents <= 0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid price: {} cents (must be greater than 0)",
            req.price_cents
        )));
    }

    let mut product = Product::new(req.name, Money::from_cents(req.price_cents), req.stock);
    if let Some(status) = req.status {
        product.status = status
            .parse::<ProductStatus>()
            .map_err(ApiError::BadRequest)?;
    }

    let product = state
        .store
        .create_product(product)
        .await
        .map_err(CheckoutError::from)?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.store.list_products().await.map_err(CheckoutError::from)?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — look up a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let product = state
        .store
        .get_product(product_id)
        .await
        .map_err(CheckoutError::from)?
        .ok_or(CheckoutError::NotFound {
            entity: "Product",
            id,
        })?;
    Ok(Json(product.into()))
}
