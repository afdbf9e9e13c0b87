//! Bulk actions over selected records.
//!
//! RULE: `delete` is the only action the engine performs itself.
//! Every action name, known or not, is handed to the registered hooks
//! once per id, in registration order.

use crate::{error::ListingResult, event::ListingEvent, types::RecordId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Delete,
    Custom(String),
}

impl BulkAction {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "delete" => Self::Delete,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Delete => "delete",
            Self::Custom(name) => name,
        }
    }
}

/// An observer of bulk actions. Hooks see every id of every batch after the
/// engine has applied its own part of the action to that id.
pub trait BulkActionHook {
    /// Stable name, used in failure reports.
    fn name(&self) -> &'static str;

    fn on_bulk_action(&mut self, id: RecordId, action: &BulkAction) -> ListingResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: RecordId,
    pub reason: String,
}

/// Outcome of one bulk action batch. Successful deletions stay applied
/// even when later ids in the batch fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkActionReport {
    pub action: BulkAction,
    pub succeeded: Vec<RecordId>,
    pub failed: Vec<BulkFailure>,
    pub events: Vec<ListingEvent>,
}

impl BulkActionReport {
    pub fn new(action: BulkAction) -> Self {
        Self {
            action,
            succeeded: Vec::new(),
            failed: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<RecordId> {
        self.failed.iter().map(|f| f.id).collect()
    }
}
