//! Catalog product record and lifecycle status.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a catalog product.
///
/// An explicit state rather than a soft-delete flag; every query that
/// cares about purchasability must check it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    /// Awaiting approval, not yet visible.
    Pending,

    /// Listed and purchasable.
    #[default]
    Active,

    /// Temporarily delisted by the vendor.
    Inactive,

    /// Visible but with no purchasable units.
    OutOfStock,

    /// Retired permanently.
    Discontinued,
}

impl ProductStatus {
    /// Returns true if the product may be purchased in this state.
    pub fn can_be_purchased(&self) -> bool {
        matches!(self, ProductStatus::Active)
    }

    /// Returns true if the product is shown in the catalog.
    pub fn is_visible(&self) -> bool {
        matches!(self, ProductStatus::Active | ProductStatus::OutOfStock)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "Pending",
            ProductStatus::Active => "Active",
            ProductStatus::Inactive => "Inactive",
            ProductStatus::OutOfStock => "OutOfStock",
            ProductStatus::Discontinued => "Discontinued",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ProductStatus::Pending),
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "outofstock" => Ok(ProductStatus::OutOfStock),
            "discontinued" => Ok(ProductStatus::Discontinued),
            other => Err(format!("Unknown product status: {other}")),
        }
    }
}

/// A catalog product.
///
/// `stock` is the Stock Ledger: a non-negative counter of purchasable
/// units. It is unsigned, so the stock >= 0 invariant holds by
/// construction; all mutation goes through the store's conditional
/// decrement/increment primitives, never through direct field writes in
/// service code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub status: ProductStatus,
}

impl Product {
    /// Creates a new active product.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            stock,
            status: ProductStatus::Active,
        }
    }

    /// Returns true if `quantity` units can currently be sold.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.status.can_be_purchased() && self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_is_purchasable() {
        assert!(ProductStatus::Active.can_be_purchased());
        assert!(!ProductStatus::Pending.can_be_purchased());
        assert!(!ProductStatus::Inactive.can_be_purchased());
        assert!(!ProductStatus::OutOfStock.can_be_purchased());
        assert!(!ProductStatus::Discontinued.can_be_purchased());
    }

    #[test]
    fn test_visibility() {
        assert!(ProductStatus::Active.is_visible());
        assert!(ProductStatus::OutOfStock.is_visible());
        assert!(!ProductStatus::Inactive.is_visible());
        assert!(!ProductStatus::Discontinued.is_visible());
    }

    #[test]
    fn test_can_fulfill_checks_stock_and_status() {
        let mut product = Product::new("Widget", Money::from_cents(1000), 5);
        assert!(product.can_fulfill(5));
        assert!(!product.can_fulfill(6));

        product.status = ProductStatus::Inactive;
        assert!(!product.can_fulfill(1));
    }
}
