//! Shared primitive types used across the listing engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of a payment record in the store.
pub type RecordId = i64;

/// A registered user's identifier.
pub type UserId = i64;

/// Who a payment belongs to: a registered user, or a guest known only by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OwnerRef {
    User(UserId),
    Guest(String),
}

impl OwnerRef {
    /// Parse the `user` request parameter: numeric values are user ids,
    /// anything else is a guest email.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<UserId>() {
            Ok(id) => Some(Self::User(id)),
            Err(_) => Some(Self::Guest(raw.to_string())),
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::Guest(email) => f.write_str(email),
        }
    }
}
