//! Application services for the storefront.
//!
//! [`CartManager`] mutates per-user carts (never touching stock),
//! [`CheckoutOrchestrator`] converts a cart into an order as one
//! all-or-nothing unit, and [`OrderManager`] handles pending-order line
//! mutation, status transitions, cancellation, and the payment linkage.

mod cart_manager;
mod error;
mod order_manager;
mod orchestrator;

pub use cart_manager::CartManager;
pub use error::{CheckoutError, Result};
pub use order_manager::OrderManager;
pub use orchestrator::CheckoutOrchestrator;
