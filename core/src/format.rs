//! Display formatting for listing rows.
//!
//! RULE: nothing here feeds back into filtering, sorting or counting.
//! Rows are formatted only when a caller asks for them.

use crate::{
    config::{CurrencyPosition, DisplayConfig},
    engine::PageResult,
    payment::{LineItem, PaymentRecord},
    store::CREATED_AT_FORMAT,
    types::{OwnerRef, RecordId, UserId},
};
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::{collections::HashMap, fmt::Write};

/// Presentation collaborator for a listing page.
pub trait Formatter {
    fn format_currency(&self, amount: Decimal) -> String;
    fn format_date(&self, timestamp: NaiveDateTime) -> String;
    fn resolve_display_name(&self, owner: &OwnerRef) -> String;

    /// Date and time together, for the details panel.
    fn format_date_time(&self, timestamp: NaiveDateTime) -> String {
        self.format_date(timestamp)
    }
}

/// Formatter driven by `DisplayConfig` and a directory of registered users.
pub struct DefaultFormatter {
    display: DisplayConfig,
    users: HashMap<UserId, String>,
}

impl DefaultFormatter {
    pub fn new(display: DisplayConfig) -> Self {
        Self {
            display,
            users: HashMap::new(),
        }
    }

    pub fn with_user(mut self, id: UserId, display_name: impl Into<String>) -> Self {
        self.users.insert(id, display_name.into());
        self
    }

    pub fn register_user(&mut self, id: UserId, display_name: impl Into<String>) {
        self.users.insert(id, display_name.into());
    }

    pub fn format_time(&self, timestamp: NaiveDateTime) -> String {
        format_timestamp(timestamp, &self.display.time_format)
    }
}

/// Render `timestamp` with a chrono format string. A format chrono cannot
/// render (unknown specifier, timezone fields) falls back to the store
/// layout instead of panicking inside `to_string()`.
fn format_timestamp(timestamp: NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", timestamp.format(format)).is_err() {
        log::warn!("format: cannot render timestamp with '{format}'");
        return timestamp.format(CREATED_AT_FORMAT).to_string();
    }
    out
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}

impl Formatter for DefaultFormatter {
    fn format_currency(&self, amount: Decimal) -> String {
        let dp = self.display.decimal_places;
        let rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        let fixed = format!("{:.*}", dp as usize, rounded.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut number = group_thousands(int_part, &self.display.thousands_separator);
        if let Some(frac) = frac_part {
            number.push_str(&self.display.decimal_separator);
            number.push_str(frac);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        let symbol = &self.display.currency_symbol;
        match self.display.currency_position {
            CurrencyPosition::Before => format!("{sign}{symbol}{number}"),
            CurrencyPosition::After => format!("{sign}{number}{symbol}"),
        }
    }

    fn format_date(&self, timestamp: NaiveDateTime) -> String {
        format_timestamp(timestamp, &self.display.date_format)
    }

    fn format_date_time(&self, timestamp: NaiveDateTime) -> String {
        format!("{} {}", self.format_date(timestamp), self.format_time(timestamp))
    }

    fn resolve_display_name(&self, owner: &OwnerRef) -> String {
        match owner {
            OwnerRef::User(id) => self
                .users
                .get(id)
                .cloned()
                .unwrap_or_else(|| self.display.guest_label.clone()),
            OwnerRef::Guest(_) => self.display.guest_label.clone(),
        }
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Display columns for one payment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: RecordId,
    pub email: String,
    pub details: PaymentDetails,
    pub amount: String,
    pub date: String,
    pub user: String,
    /// Value for the `user` request parameter that lists this buyer's payments.
    pub user_filter: String,
    pub status: String,
}

impl RowView {
    pub fn build<F: Formatter + ?Sized>(record: &PaymentRecord, formatter: &F) -> Self {
        Self {
            id: record.id,
            email: record.email.clone(),
            details: PaymentDetails::build(record, formatter),
            amount: formatter.format_currency(record.amount),
            date: formatter.format_date(record.created_at),
            user: formatter.resolve_display_name(&record.owner),
            user_filter: record.owner.to_string(),
            status: record.status.label(),
        }
    }
}

/// The order details panel behind each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentDetails {
    /// One line per purchased item.
    pub items: Vec<String>,
    pub date_time: String,
    /// Discount code, or "none".
    pub discount: String,
    pub total: String,
    pub buyer_name: String,
    pub buyer_email: String,
    /// Gateway name; absent when the payment records none.
    pub payment_method: Option<String>,
    pub purchase_key: String,
}

impl PaymentDetails {
    pub fn build<F: Formatter + ?Sized>(record: &PaymentRecord, formatter: &F) -> Self {
        let discount = record
            .buyer
            .discount
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty() && *code != "none")
            .unwrap_or("none")
            .to_string();

        Self {
            items: record
                .line_items
                .iter()
                .map(|item| describe_line_item(item, formatter))
                .collect(),
            date_time: formatter.format_date_time(record.created_at),
            discount,
            total: formatter.format_currency(record.amount),
            buyer_name: record.buyer.full_name(),
            buyer_email: record.email.clone(),
            payment_method: record.gateway.clone().filter(|g| !g.is_empty()),
            purchase_key: record.purchase_key.clone(),
        }
    }
}

/// `name - Option N - price`, leaving out the parts the item does not have.
pub fn describe_line_item<F: Formatter + ?Sized>(item: &LineItem, formatter: &F) -> String {
    let mut parts = vec![item.name.clone()];
    if let Some(variant) = item.variant {
        parts.push(format!("Option {variant}"));
    }
    if let Some(price) = item.price_override {
        parts.push(formatter.format_currency(price));
    }
    parts.join(" - ")
}

impl PageResult {
    /// Format every row on the page.
    pub fn render<F: Formatter + ?Sized>(&self, formatter: &F) -> Vec<RowView> {
        self.rows
            .iter()
            .map(|record| RowView::build(record, formatter))
            .collect()
    }
}
