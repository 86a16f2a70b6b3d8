//! User and address collaborator records.
//!
//! These belong to out-of-scope services; only the minimal shape needed
//! to enforce checkout preconditions (user exists, address exists and is
//! owned by the user) is modeled.

use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
}

impl User {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            full_name: full_name.into(),
        }
    }
}

/// A shipping address owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub line: String,
}

impl Address {
    pub fn new(user_id: UserId, line: impl Into<String>) -> Self {
        Self {
            id: AddressId::new(),
            user_id,
            line: line.into(),
        }
    }
}
