//! User and address endpoints (collaborator glue for checkout preconditions).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::CheckoutError;
use common::UserId;
use domain::{Address, User};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::{AppState, parse_id};

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct CreateAddressRequest {
    pub line: String,
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub id: String,
    pub user_id: String,
    pub line: String,
}

/// POST /users — register a user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .store
        .create_user(User::new(req.full_name))
        .await
        .map_err(CheckoutError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id.to_string(),
            full_name: user.full_name,
        }),
    ))
}

/// POST /users/:id/addresses — add a shipping address to a user.
#[tracing::instrument(skip(state, req))]
pub async fn create_address<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>), ApiError> {
    let user_id: UserId = parse_id(&id)?;
    state
        .store
        .get_user(user_id)
        .await
        .map_err(CheckoutError::from)?
        .ok_or(CheckoutError::NotFound {
            entity: "User",
            id,
        })?;

    let address = state
        .store
        .create_address(Address::new(user_id, req.line))
        .await
        .map_err(CheckoutError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(AddressResponse {
            id: address.id.to_string(),
            user_id: address.user_id.to_string(),
            line: address.line,
        }),
    ))
}
