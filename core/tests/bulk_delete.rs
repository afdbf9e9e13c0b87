//! Bulk action tests.
//!
//! Tests cover: best-effort delete with a failing id, missing ids,
//! hooks seeing every id for known and custom actions, hook failures,
//! and store failures propagating out of reads.

use paylist_core::{
    bulk::{BulkAction, BulkActionHook},
    counts::StatusCounts,
    engine::ListingEngine,
    error::{ListingError, ListingResult},
    event::ListingEvent,
    filter::FilterSpec,
    fixtures::{seed_store, PaymentGenerator},
    payment::PaymentRecord,
    store::{RecordStore, SqliteStore},
    types::RecordId,
};
use std::{cell::RefCell, collections::HashSet, rc::Rc};

/// Wraps a real store and fails chosen calls the way a locked database would.
struct FlakyStore {
    inner: SqliteStore,
    fail_deletes: HashSet<RecordId>,
    fail_reads: bool,
}

fn busy() -> ListingError {
    ListingError::StoreUnavailable(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        Some("database is locked".into()),
    ))
}

impl RecordStore for FlakyStore {
    fn count(&self, filter: &FilterSpec) -> ListingResult<u64> {
        if self.fail_reads {
            return Err(busy());
        }
        self.inner.count(filter)
    }

    fn fetch(
        &self,
        filter: &FilterSpec,
        limit: u32,
        offset: i64,
    ) -> ListingResult<Vec<PaymentRecord>> {
        if self.fail_reads {
            return Err(busy());
        }
        self.inner.fetch(filter, limit, offset)
    }

    fn delete_by_id(&self, id: RecordId) -> ListingResult<bool> {
        if self.fail_deletes.contains(&id) {
            return Err(busy());
        }
        self.inner.delete_by_id(id)
    }

    fn count_by_status_group(&self) -> ListingResult<StatusCounts> {
        if self.fail_reads {
            return Err(busy());
        }
        self.inner.count_by_status_group()
    }
}

fn build(fail_deletes: &[RecordId], fail_reads: bool) -> ListingEngine<FlakyStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let inner = SqliteStore::in_memory().expect("in-memory store");
    inner.migrate().expect("migration");
    seed_store(&inner, &PaymentGenerator::new(11).generate(10)).expect("seed");
    ListingEngine::new(FlakyStore {
        inner,
        fail_deletes: fail_deletes.iter().copied().collect(),
        fail_reads,
    })
}

#[derive(Clone, Default)]
struct RecordingHook {
    seen: Rc<RefCell<Vec<(RecordId, String)>>>,
}

impl BulkActionHook for RecordingHook {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn on_bulk_action(&mut self, id: RecordId, action: &BulkAction) -> ListingResult<()> {
        self.seen.borrow_mut().push((id, action.name().to_string()));
        Ok(())
    }
}

struct RejectingHook;

impl BulkActionHook for RejectingHook {
    fn name(&self) -> &'static str {
        "rejecting"
    }

    fn on_bulk_action(&mut self, id: RecordId, _action: &BulkAction) -> ListingResult<()> {
        if id == 2 {
            return Err(ListingError::Other(anyhow::anyhow!("refund gateway offline")));
        }
        Ok(())
    }
}

#[test]
fn failed_delete_keeps_earlier_and_later_deletions() {
    let mut engine = build(&[6], false);

    let report = engine.delete_records(&[5, 6, 7], "delete");

    assert_eq!(report.action, BulkAction::Delete);
    assert_eq!(report.succeeded, vec![5, 7]);
    assert_eq!(report.failed_ids(), vec![6]);
    assert!(report.failed[0].reason.contains("database is locked"));
    assert!(!report.is_complete());

    let store = &engine.store().inner;
    assert!(store.get_payment(5).unwrap().is_none());
    assert!(store.get_payment(6).unwrap().is_some());
    assert!(store.get_payment(7).unwrap().is_none());

    assert!(report
        .events
        .contains(&ListingEvent::RecordDeleted { id: 5 }));
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, ListingEvent::RecordDeleteFailed { id: 6, .. })));

    let counts = engine.compute_counts().unwrap();
    assert_eq!(counts.total, 8);
}

#[test]
fn missing_id_is_reported() {
    let mut engine = build(&[], false);
    let report = engine.delete_records(&[1, 404], "delete");
    assert_eq!(report.succeeded, vec![1]);
    assert_eq!(report.failed_ids(), vec![404]);
    assert!(report.failed[0].reason.contains("not found"));
}

#[test]
fn hooks_see_every_id_for_every_action() {
    let mut engine = build(&[2], false);
    let hook = RecordingHook::default();
    engine.register_hook(Box::new(hook.clone()));

    engine.delete_records(&[1, 2], "delete");
    let report = engine.delete_records(&[3, 4], "mark_reviewed");

    assert_eq!(
        *hook.seen.borrow(),
        vec![
            (1, "delete".to_string()),
            (2, "delete".to_string()),
            (3, "mark_reviewed".to_string()),
            (4, "mark_reviewed".to_string()),
        ]
    );

    // Custom actions never touch the store.
    assert_eq!(report.action, BulkAction::Custom("mark_reviewed".into()));
    assert_eq!(report.succeeded, vec![3, 4]);
    assert!(engine.store().inner.get_payment(3).unwrap().is_some());
    let performed = report
        .events
        .iter()
        .filter(|e| e.type_name() == "bulk_action_performed")
        .count();
    assert_eq!(performed, 2);
}

#[test]
fn hook_failure_is_reported_not_swallowed() {
    let mut engine = build(&[], false);
    engine.register_hook(Box::new(RejectingHook));

    let report = engine.delete_records(&[1, 2, 3], "delete");

    assert_eq!(report.succeeded, vec![1, 3]);
    assert_eq!(report.failed_ids(), vec![2]);
    assert!(report.failed[0].reason.contains("rejecting"));
    assert!(report.events.iter().any(|e| matches!(
        e,
        ListingEvent::BulkHookFailed { id: 2, hook, .. } if hook == "rejecting"
    )));
    // The delete itself went through before the hook ran.
    assert!(engine.store().inner.get_payment(2).unwrap().is_none());
}

#[test]
fn store_failures_propagate_from_reads() {
    let engine = build(&[], true);

    let err = engine.fetch_page(FilterSpec::new()).unwrap_err();
    assert!(matches!(err, ListingError::StoreUnavailable(_)), "got {err:?}");

    let err = engine.compute_counts().unwrap_err();
    assert!(matches!(err, ListingError::StoreUnavailable(_)), "got {err:?}");

    let err = engine
        .fetch_page(FilterSpec::new().with_search("smith"))
        .unwrap_err();
    assert!(matches!(err, ListingError::StoreUnavailable(_)), "got {err:?}");
}

#[test]
fn invalid_filter_is_reported_before_touching_the_store() {
    let engine = build(&[], true);
    let err = engine.fetch_page(FilterSpec::new().with_page(0, 30)).unwrap_err();
    assert!(matches!(err, ListingError::InvalidFilter { .. }), "got {err:?}");
}
