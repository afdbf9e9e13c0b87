use super::{
    query::{order_by, WhereClause},
    RecordStore, SqliteStore,
};
use crate::{
    counts::StatusCounts,
    error::{ListingError, ListingResult},
    filter::FilterSpec,
    payment::{BuyerInfo, NewPayment, PaymentMode, PaymentRecord, PaymentStatus},
    types::{OwnerRef, RecordId},
};
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Timestamp layout of the `created_at` column. SQLite's date functions
/// understand it, which the year/month/day narrowing relies on.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PAYMENT_COLUMNS: &str = "id, status, mode, amount, created_at, user_id, email,
    first_name, last_name, discount, purchase_key, gateway, line_items";

/// Column values as stored, before parsing into a PaymentRecord.
struct PaymentRow {
    id: RecordId,
    status: String,
    mode: String,
    amount: String,
    created_at: String,
    user_id: Option<i64>,
    email: String,
    first_name: String,
    last_name: String,
    discount: Option<String>,
    purchase_key: String,
    gateway: Option<String>,
    line_items: String,
}

impl PaymentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            status: row.get(1)?,
            mode: row.get(2)?,
            amount: row.get(3)?,
            created_at: row.get(4)?,
            user_id: row.get(5)?,
            email: row.get(6)?,
            first_name: row.get(7)?,
            last_name: row.get(8)?,
            discount: row.get(9)?,
            purchase_key: row.get(10)?,
            gateway: row.get(11)?,
            line_items: row.get(12)?,
        })
    }

    fn into_record(self) -> ListingResult<PaymentRecord> {
        let id = self.id;
        let malformed = |reason: String| ListingError::MalformedRecord { id, reason };

        let amount = Decimal::from_str(&self.amount)
            .map_err(|e| malformed(format!("amount '{}': {e}", self.amount)))?;
        let created_at = NaiveDateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)
            .map_err(|e| malformed(format!("created_at '{}': {e}", self.created_at)))?;
        let mode = PaymentMode::parse(&self.mode)
            .ok_or_else(|| malformed(format!("mode '{}'", self.mode)))?;
        let owner = match self.user_id {
            Some(user_id) => OwnerRef::User(user_id),
            None => OwnerRef::Guest(self.email.clone()),
        };

        Ok(PaymentRecord {
            id,
            status: PaymentStatus::from_store_name(&self.status),
            mode,
            amount,
            created_at,
            owner,
            email: self.email,
            buyer: BuyerInfo {
                first_name: self.first_name,
                last_name: self.last_name,
                discount: self.discount,
            },
            purchase_key: self.purchase_key,
            gateway: self.gateway,
            line_items: serde_json::from_str(&self.line_items)?,
        })
    }
}

impl SqliteStore {
    // ── Payments ──────────────────────────────────────────────────

    pub fn insert_payment(&self, p: &NewPayment) -> ListingResult<RecordId> {
        let user_id = match &p.owner {
            OwnerRef::User(id) => Some(*id),
            OwnerRef::Guest(_) => None,
        };
        self.conn.execute(
            "INSERT INTO payment (
                status, mode, amount, created_at, user_id, email,
                first_name, last_name, discount, purchase_key, gateway, line_items
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                p.status.as_str(),
                p.mode.as_str(),
                p.amount.to_string(),
                p.created_at.format(CREATED_AT_FORMAT).to_string(),
                user_id,
                &p.email,
                &p.buyer.first_name,
                &p.buyer.last_name,
                &p.buyer.discount,
                &p.purchase_key,
                &p.gateway,
                serde_json::to_string(&p.line_items)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_payment(&self, id: RecordId) -> ListingResult<Option<PaymentRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PAYMENT_COLUMNS} FROM payment WHERE id = ?1"),
                params![id],
                PaymentRow::from_row,
            )
            .optional()?;
        row.map(PaymentRow::into_record).transpose()
    }

    pub fn update_payment_status(&self, id: RecordId, status: &PaymentStatus) -> ListingResult<bool> {
        let changed = self.conn.execute(
            "UPDATE payment SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }
}

impl RecordStore for SqliteStore {
    fn count(&self, filter: &FilterSpec) -> ListingResult<u64> {
        let clause = WhereClause::for_filter(filter);
        let sql = format!("SELECT COUNT(*) FROM payment {}", clause.sql);
        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))?;
        Ok(n as u64)
    }

    fn fetch(
        &self,
        filter: &FilterSpec,
        limit: u32,
        offset: i64,
    ) -> ListingResult<Vec<PaymentRecord>> {
        let clause = WhereClause::for_filter(filter);
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment {} {} LIMIT ? OFFSET ?",
            clause.sql,
            order_by(filter),
        );
        let mut values = clause.params;
        values.push(Value::Integer(i64::from(limit)));
        values.push(Value::Integer(offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), PaymentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(PaymentRow::into_record).collect()
    }

    fn delete_by_id(&self, id: RecordId) -> ListingResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM payment WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn count_by_status_group(&self) -> ListingResult<StatusCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM payment GROUP BY status")?;
        let groups = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StatusCounts::from_groups(groups))
    }
}
