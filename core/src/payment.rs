//! Payment records as the listing reads them from the store.

use crate::types::{OwnerRef, RecordId};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a payment.
///
/// The five fixed buckets map onto the store's status names; completed
/// payments are stored as `publish`. Anything else is carried verbatim
/// as a custom status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Refunded,
    Failed,
    Revoked,
    Other(String),
}

impl PaymentStatus {
    pub const KNOWN: [PaymentStatus; 5] = [
        Self::Completed,
        Self::Pending,
        Self::Refunded,
        Self::Failed,
        Self::Revoked,
    ];

    /// Parse a status name. Accepts both the store name (`publish`) and the
    /// public name (`completed`) for completed payments.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "publish" | "completed" | "complete" => Self::Completed,
            "pending" => Self::Pending,
            "refunded" => Self::Refunded,
            "failed" => Self::Failed,
            "revoked" => Self::Revoked,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Map a value read from the status column. Only the exact store names
    /// land in the fixed buckets; anything else, aliases and other casings
    /// included, stays a custom status so it matches `status = ?` lookups.
    pub fn from_store_name(name: &str) -> Self {
        match name {
            "publish" => Self::Completed,
            "pending" => Self::Pending,
            "refunded" => Self::Refunded,
            "failed" => Self::Failed,
            "revoked" => Self::Revoked,
            other => Self::Other(other.to_string()),
        }
    }

    /// Name used in the store's status column.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "publish",
            Self::Pending => "pending",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
            Self::Revoked => "revoked",
            Self::Other(s) => s,
        }
    }

    /// Human-readable label shown in the status column.
    pub fn label(&self) -> String {
        match self {
            Self::Completed => "Complete".into(),
            Self::Pending => "Pending".into(),
            Self::Refunded => "Refunded".into(),
            Self::Failed => "Failed".into(),
            Self::Revoked => "Revoked".into(),
            Self::Other(s) => {
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Whether a purchase went through the live gateway or a test sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Live,
    Test,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "live" => Some(Self::Live),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

/// Buyer details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub first_name: String,
    pub last_name: String,
    pub discount: Option<String>,
}

impl BuyerInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// One purchased item inside a payment's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: i64,
    pub name: String,
    /// Price paid when it differs from the item's list price.
    #[serde(default)]
    pub price_override: Option<Decimal>,
    /// Selected variable-price option, if the item has several.
    #[serde(default)]
    pub variant: Option<u32>,
}

/// A stored payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: RecordId,
    pub status: PaymentStatus,
    pub mode: PaymentMode,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
    pub owner: OwnerRef,
    pub email: String,
    pub buyer: BuyerInfo,
    pub purchase_key: String,
    pub gateway: Option<String>,
    pub line_items: Vec<LineItem>,
}

/// A payment to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub status: PaymentStatus,
    pub mode: PaymentMode,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
    pub owner: OwnerRef,
    pub email: String,
    pub buyer: BuyerInfo,
    pub purchase_key: String,
    pub gateway: Option<String>,
    pub line_items: Vec<LineItem>,
}
