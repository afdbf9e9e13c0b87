//! Count aggregator — per-status totals for the listing.
//!
//! Counts are a value returned per request. Nothing here holds them between
//! calls: the store can change under us (new purchases, refunds) and a kept
//! snapshot would go stale.

use crate::{
    error::ListingResult,
    filter::StatusFilter,
    payment::PaymentStatus,
    store::RecordStore,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: u64,
    pub pending: u64,
    pub refunded: u64,
    pub failed: u64,
    pub revoked: u64,
    /// Custom statuses, keyed by their store name.
    pub other: BTreeMap<String, u64>,
    /// Every stored record, custom statuses included.
    pub total: u64,
}

impl StatusCounts {
    /// Fold `(status name, count)` groups into a snapshot.
    /// Repeated names accumulate; absent buckets stay at 0.
    pub fn from_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut counts = Self::default();
        for (name, n) in groups {
            match PaymentStatus::from_store_name(name.as_ref()) {
                PaymentStatus::Completed => counts.completed += n,
                PaymentStatus::Pending => counts.pending += n,
                PaymentStatus::Refunded => counts.refunded += n,
                PaymentStatus::Failed => counts.failed += n,
                PaymentStatus::Revoked => counts.revoked += n,
                PaymentStatus::Other(custom) => *counts.other.entry(custom).or_insert(0) += n,
            }
            counts.total += n;
        }
        counts
    }

    /// Count for one of the fixed buckets.
    /// Returns None for custom statuses, which need their own count query.
    pub fn get(&self, filter: &StatusFilter) -> Option<u64> {
        match filter {
            StatusFilter::Any => Some(self.total),
            StatusFilter::Only(status) => match status {
                PaymentStatus::Completed => Some(self.completed),
                PaymentStatus::Pending => Some(self.pending),
                PaymentStatus::Refunded => Some(self.refunded),
                PaymentStatus::Failed => Some(self.failed),
                PaymentStatus::Revoked => Some(self.revoked),
                PaymentStatus::Other(_) => None,
            },
        }
    }
}

/// Read a fresh status snapshot from the store.
pub fn compute_counts<S: RecordStore + ?Sized>(store: &S) -> ListingResult<StatusCounts> {
    let counts = store.count_by_status_group()?;
    log::debug!(
        "status counts: total={} completed={} pending={} refunded={} failed={} revoked={} custom={}",
        counts.total,
        counts.completed,
        counts.pending,
        counts.refunded,
        counts.failed,
        counts.revoked,
        counts.other.len()
    );
    Ok(counts)
}

/// One status tab above the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    /// Value for the `status` request parameter.
    pub key: &'static str,
    pub label: &'static str,
    pub count: u64,
    pub current: bool,
}

/// Status tabs in display order: All, Completed, Pending, Refunded,
/// Revoked, Failed.
pub fn status_views(counts: &StatusCounts, current: &StatusFilter) -> Vec<StatusView> {
    let tabs: [(&'static str, &'static str, StatusFilter); 6] = [
        ("all", "All", StatusFilter::Any),
        ("publish", "Completed", StatusFilter::Only(PaymentStatus::Completed)),
        ("pending", "Pending", StatusFilter::Only(PaymentStatus::Pending)),
        ("refunded", "Refunded", StatusFilter::Only(PaymentStatus::Refunded)),
        ("revoked", "Revoked", StatusFilter::Only(PaymentStatus::Revoked)),
        ("failed", "Failed", StatusFilter::Only(PaymentStatus::Failed)),
    ];

    tabs.into_iter()
        .map(|(key, label, filter)| StatusView {
            key,
            label,
            count: counts.get(&filter).unwrap_or(0),
            current: &filter == current,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_fold_into_buckets() {
        let counts = StatusCounts::from_groups([
            ("publish", 20),
            ("pending", 10),
            ("failed", 5),
            ("abandoned", 2),
        ]);
        assert_eq!(counts.completed, 20);
        assert_eq!(counts.pending, 10);
        assert_eq!(counts.failed, 5);
        assert_eq!(counts.refunded, 0);
        assert_eq!(counts.revoked, 0);
        assert_eq!(counts.other.get("abandoned"), Some(&2));
        assert_eq!(counts.total, 37);
    }

    #[test]
    fn only_exact_store_names_fill_buckets() {
        let counts = StatusCounts::from_groups([
            ("publish", 2),
            ("completed", 3),
            ("PENDING", 4),
        ]);
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.other.get("completed"), Some(&3));
        assert_eq!(counts.other.get("PENDING"), Some(&4));
        assert_eq!(counts.total, 9);
    }

    #[test]
    fn custom_status_has_no_fast_path() {
        let counts = StatusCounts::from_groups([("abandoned", 3)]);
        let custom = StatusFilter::Only(PaymentStatus::Other("abandoned".into()));
        assert_eq!(counts.get(&custom), None);
        assert_eq!(counts.get(&StatusFilter::Any), Some(3));
    }

    #[test]
    fn views_mark_current_tab() {
        let counts = StatusCounts::from_groups([("publish", 4), ("refunded", 1)]);
        let views = status_views(&counts, &StatusFilter::Only(PaymentStatus::Refunded));

        let keys: Vec<_> = views.iter().map(|v| v.key).collect();
        assert_eq!(keys, ["all", "publish", "pending", "refunded", "revoked", "failed"]);

        let current: Vec<_> = views.iter().filter(|v| v.current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].key, "refunded");
        assert_eq!(current[0].count, 1);
        assert_eq!(views[0].count, 5);
    }
}
