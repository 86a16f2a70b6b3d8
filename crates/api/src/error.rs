//! API error types with HTTP response mapping.
//!
//! Every service error maps to exactly one status code through a single
//! exhaustive match. The response body is a structured envelope:
//! `timestamp`, `status`, `error`, `message`, `path`. The `path` field is
//! filled in by [`attach_error_path`], since handlers do not see the
//! request URI at error-construction time.

use axum::Json;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (unparseable ID, unknown status name).
    BadRequest(String),
    /// Service-layer failure.
    Checkout(CheckoutError),
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

/// Structured error body rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Checkout(err) => match err {
                CheckoutError::NotFound { .. } => StatusCode::NOT_FOUND,
                CheckoutError::Validation(_) | CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
                CheckoutError::AlreadyExists(_) => StatusCode::CONFLICT,
                CheckoutError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                CheckoutError::Forbidden(_) => StatusCode::FORBIDDEN,
                CheckoutError::InsufficientStock { .. }
                | CheckoutError::ProductNotAvailable { .. }
                | CheckoutError::OrderNotModifiable { .. }
                | CheckoutError::InvalidStatusTransition { .. }
                | CheckoutError::Conflict(_) => StatusCode::CONFLICT,
                CheckoutError::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Checkout(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %message, "internal server error");
        }

        let body = ErrorBody {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message,
            path: String::new(),
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Middleware that rewrites error bodies with the request path.
pub async fn attach_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(body) = response.extensions().get::<ErrorBody>() else {
        return response;
    };

    let mut body = body.clone();
    body.path = path;
    let status = response.status();
    (status, Json(body)).into_response()
}
