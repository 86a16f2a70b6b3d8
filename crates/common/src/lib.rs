//! Shared types used across the storefront crates.

mod money;
mod types;

pub use money::Money;
pub use types::{AddressId, CartId, CartItemId, OrderId, OrderItemId, PaymentId, ProductId, UserId};
