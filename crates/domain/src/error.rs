//! Domain error types.

use thiserror::Error;

use crate::status::OrderStatus;

/// Errors raised by domain entity invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A quantity was zero or negative where a positive value is required.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// A price was not positive.
    #[error("Invalid price: {cents} cents (must be greater than 0)")]
    InvalidPrice { cents: i64 },

    /// The referenced line item does not exist in the aggregate.
    #[error("Item not found for product {product_id}")]
    ItemNotFound { product_id: String },

    /// The order status does not permit the attempted transition.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The order is not in a modifiable state.
    #[error("Cannot modify order with status: {status}")]
    OrderNotModifiable { status: OrderStatus },
}
