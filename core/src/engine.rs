//! The listing engine — filtered, paginated, sortable payment listing.
//!
//! REQUEST FLOW (every call is independent):
//!   1. Validate the FilterSpec.
//!   2. Resolve the total count: a fresh status snapshot when the filter is
//!      a known bucket and nothing else narrows it, a dedicated count query
//!      otherwise.
//!   3. Fetch one bounded page from the store.
//!   4. Derive the page count (never below 1).
//!
//! RULES:
//!   - No counts or pages are kept between calls.
//!   - Store failures propagate unchanged; nothing is retried here.
//!   - Display formatting happens outside the engine (see format.rs).

use crate::{
    bulk::{BulkAction, BulkActionHook, BulkActionReport, BulkFailure},
    counts::{compute_counts, StatusCounts},
    error::ListingResult,
    event::ListingEvent,
    filter::FilterSpec,
    payment::PaymentRecord,
    store::RecordStore,
    types::RecordId,
};
use serde::Serialize;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub rows: Vec<PaymentRecord>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl PageResult {
    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// Number of pages needed for `total_count` rows. An empty listing still
/// has one (empty) page.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    total_count.div_ceil(u64::from(page_size.max(1))).max(1)
}

pub struct ListingEngine<S: RecordStore> {
    store: S,
    hooks: Vec<Box<dyn BulkActionHook>>,
}

impl<S: RecordStore> ListingEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a bulk action observer. Hooks run in registration order.
    pub fn register_hook(&mut self, hook: Box<dyn BulkActionHook>) {
        self.hooks.push(hook);
    }

    /// Fresh per-status totals.
    pub fn compute_counts(&self) -> ListingResult<StatusCounts> {
        compute_counts(&self.store)
    }

    pub fn fetch_page(&self, spec: FilterSpec) -> ListingResult<PageResult> {
        spec.validate()?;

        let total_count = self.resolve_total(&spec)?;
        let rows = self
            .store
            .fetch(&spec, spec.page_size, spec.offset()?)?;
        let total_pages = total_pages(total_count, spec.page_size);

        log::debug!(
            "listing: status={:?} sort={} {} page {}/{} -> {} rows of {}",
            spec.status,
            spec.sort_key.as_str(),
            spec.sort_direction.as_sql(),
            spec.page,
            total_pages,
            rows.len(),
            total_count
        );

        Ok(PageResult {
            rows,
            total_count,
            total_pages,
            current_page: spec.page,
            page_size: spec.page_size,
        })
    }

    fn resolve_total(&self, spec: &FilterSpec) -> ListingResult<u64> {
        if spec.status.is_known_bucket() && spec.narrows_by_status_only() {
            let counts = self.compute_counts()?;
            if let Some(n) = counts.get(&spec.status) {
                return Ok(n);
            }
        }
        self.store.count(spec)
    }

    /// Run a bulk action over `ids`.
    ///
    /// For `delete`, each id is removed on its own; a failure leaves earlier
    /// deletions applied and is reported against that id. Hooks are notified
    /// for every id whatever the action.
    pub fn delete_records(&mut self, ids: &[RecordId], action_name: &str) -> BulkActionReport {
        let action = BulkAction::parse(action_name);
        let mut report = BulkActionReport::new(action.clone());

        for &id in ids {
            let mut failure: Option<String> = None;

            if action == BulkAction::Delete {
                match self.store.delete_by_id(id) {
                    Ok(true) => report.events.push(ListingEvent::RecordDeleted { id }),
                    Ok(false) => failure = Some(format!("record {id} not found")),
                    Err(e) => failure = Some(e.to_string()),
                }
                if let Some(reason) = &failure {
                    log::warn!("bulk delete: record {id} not deleted: {reason}");
                    report.events.push(ListingEvent::RecordDeleteFailed {
                        id,
                        reason: reason.clone(),
                    });
                }
            }

            report.events.push(ListingEvent::BulkActionPerformed {
                id,
                action: action.name().to_string(),
            });

            for hook in &mut self.hooks {
                if let Err(e) = hook.on_bulk_action(id, &action) {
                    let reason = format!("hook '{}' failed: {e}", hook.name());
                    log::warn!("bulk {}: record {id}: {reason}", action.name());
                    report.events.push(ListingEvent::BulkHookFailed {
                        id,
                        hook: hook.name().to_string(),
                        reason: e.to_string(),
                    });
                    failure.get_or_insert(reason);
                }
            }

            match failure {
                Some(reason) => report.failed.push(BulkFailure { id, reason }),
                None => report.succeeded.push(id),
            }
        }

        log::info!(
            "bulk {}: {} succeeded, {} failed",
            action.name(),
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }
}
