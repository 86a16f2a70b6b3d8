//! Payment boundary records.
//!
//! The gateway protocol itself is out of scope; only the contract that an
//! order has at most one payment is modeled here.

use common::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

/// Status reported back from the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("Unknown payment status: {other}")),
        }
    }
}

/// A payment record, 1:1 with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
}

impl Payment {
    /// Creates a new pending payment for an order.
    pub fn new(order_id: OrderId, amount: Money, transaction_ref: Option<String>) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            amount,
            status: PaymentStatus::Pending,
            transaction_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_payment_is_pending() {
        let payment = Payment::new(OrderId::new(), Money::from_cents(2500), None);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount.cents(), 2500);
    }
}
