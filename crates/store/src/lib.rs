//! Persistence layer for the storefront.
//!
//! The [`Store`] trait is the seam between the application services and
//! storage. Two implementations are provided: [`MemoryStore`] for tests
//! and the default server, and [`PostgresStore`] backed by sqlx.
//!
//! The Stock Ledger discipline lives here: product stock is only ever
//! mutated through [`Store::decrease_stock`] (an atomic "decrement iff
//! enough stock" primitive) and [`Store::increase_stock`]. Whole-cart and
//! whole-order writes are version-checked so concurrent read-modify-write
//! cycles fail with [`StoreError::VersionConflict`] instead of silently
//! losing updates.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;
