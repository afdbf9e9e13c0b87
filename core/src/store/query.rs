//! WHERE / ORDER BY construction for listing queries.

use crate::{
    filter::{FilterSpec, SortKey, StatusFilter},
    types::OwnerRef,
};
use rusqlite::types::Value;

/// A WHERE clause with its positional parameters, in order.
pub(super) struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    pub fn for_filter(filter: &FilterSpec) -> Self {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let StatusFilter::Only(status) = &filter.status {
            conditions.push("status = ?".into());
            params.push(Value::Text(status.as_str().to_string()));
        }

        match &filter.owner {
            Some(OwnerRef::User(id)) => {
                conditions.push("user_id = ?".into());
                params.push(Value::Integer(*id));
            }
            Some(OwnerRef::Guest(email)) => {
                conditions
                    .push("user_id IS NULL AND unicode_lower(email) = unicode_lower(?)".into());
                params.push(Value::Text(email.clone()));
            }
            None => {}
        }

        if let Some(text) = filter.search_text() {
            let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
            conditions.push(
                "(unicode_lower(email) LIKE ? ESCAPE '\\' \
                  OR unicode_lower(first_name || ' ' || last_name) LIKE ? ESCAPE '\\')"
                    .into(),
            );
            params.push(Value::Text(pattern.clone()));
            params.push(Value::Text(pattern));
        }

        if let Some(year) = filter.year {
            conditions.push("CAST(strftime('%Y', created_at) AS INTEGER) = ?".into());
            params.push(Value::Integer(i64::from(year)));
        }
        if let Some(month) = filter.month {
            conditions.push("CAST(strftime('%m', created_at) AS INTEGER) = ?".into());
            params.push(Value::Integer(i64::from(month)));
        }
        if let Some(day) = filter.day {
            conditions.push("CAST(strftime('%d', created_at) AS INTEGER) = ?".into());
            params.push(Value::Integer(i64::from(day)));
        }

        if let Some(mode) = filter.mode {
            conditions.push("mode = ?".into());
            params.push(Value::Text(mode.as_str().to_string()));
        }

        let sql = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        Self { sql, params }
    }
}

/// ORDER BY for the filter's sort key. Ties fall back to id in the same
/// direction, so equal dates or amounts list newest-inserted first when
/// descending and the order is stable across repeated requests.
pub(super) fn order_by(filter: &FilterSpec) -> String {
    let dir = filter.sort_direction.as_sql();
    match filter.sort_key {
        SortKey::Id => format!("ORDER BY id {dir}"),
        SortKey::Amount => format!("ORDER BY amount COLLATE decimal {dir}, id {dir}"),
        SortKey::Date => format!("ORDER BY created_at {dir}, id {dir}"),
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
