//! Events emitted by listing operations.
//!
//! Reads emit nothing. Bulk actions report every per-record outcome as an
//! event so callers can log or audit them without re-querying the store.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingEvent {
    RecordDeleted {
        id: RecordId,
    },
    RecordDeleteFailed {
        id: RecordId,
        reason: String,
    },
    /// Fired once per id for every bulk action, known or not.
    BulkActionPerformed {
        id: RecordId,
        action: String,
    },
    BulkHookFailed {
        id: RecordId,
        hook: String,
        reason: String,
    },
}

impl ListingEvent {
    /// Stable name of the variant, for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RecordDeleted { .. } => "record_deleted",
            Self::RecordDeleteFailed { .. } => "record_delete_failed",
            Self::BulkActionPerformed { .. } => "bulk_action_performed",
            Self::BulkHookFailed { .. } => "bulk_hook_failed",
        }
    }
}
