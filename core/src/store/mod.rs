//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine reaches records through the RecordStore trait — it never
//! executes SQL directly.

use crate::{
    counts::StatusCounts,
    error::ListingResult,
    filter::FilterSpec,
    payment::PaymentRecord,
    types::RecordId,
};
use rusqlite::{functions::FunctionFlags, Connection};
use rust_decimal::Decimal;
use std::{cmp::Ordering, str::FromStr};

mod payment;
mod query;

pub use payment::CREATED_AT_FORMAT;

/// The record store the listing engine reads from.
///
/// Implementations own their own consistency; the engine takes no locks
/// and never retries a failed call.
pub trait RecordStore {
    /// Number of records matching every present field of `filter`.
    /// Paging and sort fields are ignored.
    fn count(&self, filter: &FilterSpec) -> ListingResult<u64>;

    /// One bounded slice of matching records, ordered by the filter's sort
    /// key and direction with ties broken by id.
    fn fetch(&self, filter: &FilterSpec, limit: u32, offset: i64)
        -> ListingResult<Vec<PaymentRecord>>;

    /// Remove one record. Ok(false) when no record had that id.
    fn delete_by_id(&self, id: RecordId) -> ListingResult<bool>;

    /// Record counts grouped by status.
    fn count_by_status_group(&self) -> ListingResult<StatusCounts>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn count(&self, filter: &FilterSpec) -> ListingResult<u64> {
        (**self).count(filter)
    }

    fn fetch(
        &self,
        filter: &FilterSpec,
        limit: u32,
        offset: i64,
    ) -> ListingResult<Vec<PaymentRecord>> {
        (**self).fetch(filter, limit, offset)
    }

    fn delete_by_id(&self, id: RecordId) -> ListingResult<bool> {
        (**self).delete_by_id(id)
    }

    fn count_by_status_group(&self) -> ListingResult<StatusCounts> {
        (**self).count_by_status_group()
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> ListingResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        register_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ListingResult<Self> {
        let conn = Connection::open(":memory:")?;
        register_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ListingResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_payments.sql"))?;
        Ok(())
    }
}

/// SQL helpers the listing queries depend on:
///   - `unicode_lower(text)` folds case with Unicode rules. SQLite's own
///     LOWER() and LIKE only fold ASCII.
///   - `COLLATE decimal` orders amount text by exact decimal value.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )?;
    conn.create_collation("decimal", compare_decimal)
}

/// Numeric order for decimal text. Unparseable values sort after every
/// number, by their raw text.
fn compare_decimal(a: &str, b: &str) -> Ordering {
    match (Decimal::from_str(a), Decimal::from_str(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
