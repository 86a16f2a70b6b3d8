//! Checkout-layer error taxonomy.
//!
//! Every failure a service can surface maps to exactly one variant here,
//! so callers (the HTTP layer in particular) can match exhaustively.

use domain::{DomainError, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the cart, checkout, and order services.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The request is structurally invalid (bad quantity, bad price).
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint would be violated.
    #[error("{0}")]
    AlreadyExists(String),

    /// The caller does not own the referenced record.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller's role does not permit the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The cart to be checked out has no items.
    #[error("Cannot checkout an empty cart")]
    EmptyCart,

    /// A stock decrement could not be applied in full.
    #[error("Insufficient stock for product {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },

    /// The product exists but is not in a purchasable state.
    #[error("Product {product} is not available for purchase")]
    ProductNotAvailable { product: String },

    /// The order is not in a state that permits item modification.
    #[error("Cannot modify order with status: {status}")]
    OrderNotModifiable { status: OrderStatus },

    /// The order status does not permit the attempted transition.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// A concurrent writer invalidated this operation; the caller may retry.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// An internal step failed after validation passed.
    #[error("Operation {operation} failed: {reason}")]
    OperationFailed {
        operation: &'static str,
        reason: String,
    },
}

impl CheckoutError {
    /// Convenience constructor for [`CheckoutError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CheckoutError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CheckoutError::NotFound { entity, id },
            StoreError::AlreadyExists(msg) => CheckoutError::AlreadyExists(msg),
            StoreError::VersionConflict { .. } => CheckoutError::Conflict(err.to_string()),
            StoreError::Database(e) => CheckoutError::OperationFailed {
                operation: "database",
                reason: e.to_string(),
            },
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidQuantity { .. } | DomainError::InvalidPrice { .. } => {
                CheckoutError::Validation(err.to_string())
            }
            DomainError::ItemNotFound { product_id } => CheckoutError::NotFound {
                entity: "Item",
                id: product_id,
            },
            DomainError::InvalidStatusTransition { from, to } => {
                CheckoutError::InvalidStatusTransition { from, to }
            }
            DomainError::OrderNotModifiable { status } => {
                CheckoutError::OrderNotModifiable { status }
            }
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_maps_to_conflict() {
        let err = StoreError::VersionConflict {
            entity: "Cart",
            id: "x".into(),
            expected: 1,
            actual: 2,
        };
        assert!(matches!(
            CheckoutError::from(err),
            CheckoutError::Conflict(_)
        ));
    }

    #[test]
    fn test_domain_quantity_maps_to_validation() {
        let err = DomainError::InvalidQuantity { quantity: 0 };
        assert!(matches!(
            CheckoutError::from(err),
            CheckoutError::Validation(_)
        ));
    }

    #[test]
    fn test_not_modifiable_is_preserved() {
        let err = DomainError::OrderNotModifiable {
            status: OrderStatus::Shipped,
        };
        assert!(matches!(
            CheckoutError::from(err),
            CheckoutError::OrderNotModifiable {
                status: OrderStatus::Shipped
            }
        ));
    }
}
