//! Domain model for the storefront.
//!
//! Pure data and invariants: no storage, no HTTP. The cart and order
//! aggregates own their line items and keep their denormalized totals
//! consistent on every mutation; the order status state machine governs
//! which transitions are legal.

mod cart;
mod error;
mod order;
mod payment;
mod product;
mod status;
mod user;

pub use cart::{Cart, CartItem};
pub use error::DomainError;
pub use order::{Order, OrderItem};
pub use payment::{Payment, PaymentStatus};
pub use product::{Product, ProductStatus};
pub use status::OrderStatus;
pub use user::{Address, User};
