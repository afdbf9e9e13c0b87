//! FilterSpec — the caller's declarative description of one listing page.
//!
//! Built once at the request boundary and passed by value into the engine.
//! The engine never reads request state on its own.

use crate::{
    error::{ListingError, ListingResult},
    payment::{PaymentMode, PaymentStatus},
    types::OwnerRef,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Which status bucket to list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Any,
    Only(PaymentStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "all" => Self::Any,
            _ => Self::Only(PaymentStatus::parse(raw)),
        }
    }

    /// True for `any` and the five fixed buckets.
    pub fn is_known_bucket(&self) -> bool {
        match self {
            Self::Any => true,
            Self::Only(status) => status.is_known(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    Amount,
    Date,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Amount => "amount",
            Self::Date => "date",
        }
    }
}

impl FromStr for SortKey {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "amount" => Ok(Self::Amount),
            "date" => Ok(Self::Date),
            other => Err(ListingError::invalid_filter(format!(
                "unknown sort key '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(ListingError::invalid_filter(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub status: StatusFilter,
    pub owner: Option<OwnerRef>,
    pub search: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub mode: Option<PaymentMode>,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            status: StatusFilter::Any,
            owner: None,
            search: None,
            year: None,
            month: None,
            day: None,
            mode: None,
            sort_key: SortKey::Id,
            sort_direction: SortDirection::Descending,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn with_date(mut self, year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self
    }

    pub fn with_mode(mut self, mode: PaymentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.sort_direction = direction;
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Build a spec from raw request parameters.
    ///
    /// Recognised keys: `paged`, `per_page`, `orderby`, `order`, `status`,
    /// `user`, `s`, `year`, `m`, `day`, `mode`. Empty values count as absent;
    /// unknown keys are ignored. The result is validated before returning.
    pub fn from_query<I, K, V>(pairs: I, default_page_size: u32) -> ListingResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = Self {
            page_size: default_page_size,
            ..Self::default()
        };

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "paged" => spec.page = parse_positive(value, "paged")?,
                "per_page" => spec.page_size = parse_positive(value, "per_page")?,
                "orderby" => spec.sort_key = value.parse()?,
                "order" => spec.sort_direction = value.parse()?,
                "status" => spec.status = StatusFilter::parse(value),
                "user" => spec.owner = OwnerRef::parse(value),
                "s" => spec.search = Some(value.to_string()),
                "year" => spec.year = Some(parse_number(value, "year")?),
                "m" => spec.month = Some(parse_number(value, "m")?),
                "day" => spec.day = Some(parse_number(value, "day")?),
                "mode" => {
                    spec.mode = Some(PaymentMode::parse(value).ok_or_else(|| {
                        ListingError::invalid_filter(format!("unknown mode '{value}'"))
                    })?)
                }
                _ => {}
            }
        }

        spec.validate()?;
        Ok(spec)
    }

    /// Check every caller-supplied bound.
    pub fn validate(&self) -> ListingResult<()> {
        if self.page < 1 {
            return Err(ListingError::invalid_filter("page must be at least 1"));
        }
        if self.page_size < 1 {
            return Err(ListingError::invalid_filter("page size must be at least 1"));
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ListingError::invalid_filter(format!(
                    "month {month} is out of range 1-12"
                )));
            }
        }
        if let Some(day) = self.day {
            if !(1..=31).contains(&day) {
                return Err(ListingError::invalid_filter(format!(
                    "day {day} is out of range 1-31"
                )));
            }
        }
        if let StatusFilter::Only(PaymentStatus::Other(name)) = &self.status {
            if name.is_empty() {
                return Err(ListingError::invalid_filter("status name is empty"));
            }
        }
        self.offset()?;
        Ok(())
    }

    /// Row offset of the first record on the requested page.
    pub fn offset(&self) -> ListingResult<i64> {
        (i64::from(self.page) - 1)
            .checked_mul(i64::from(self.page_size))
            .ok_or_else(|| ListingError::invalid_filter("page offset overflows"))
    }

    /// Search text, trimmed, or None when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// True when nothing but the status narrows the result set, which is
    /// when a grouped status count equals the number of matching rows.
    pub fn narrows_by_status_only(&self) -> bool {
        self.owner.is_none()
            && self.search_text().is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.mode.is_none()
    }
}

fn parse_positive(raw: &str, name: &str) -> ListingResult<u32> {
    let n: i64 = parse_number(raw, name)?;
    if n < 1 {
        return Err(ListingError::invalid_filter(format!(
            "{name} must be at least 1, got {n}"
        )));
    }
    u32::try_from(n)
        .map_err(|_| ListingError::invalid_filter(format!("{name} {n} is too large")))
}

fn parse_number<T: FromStr>(raw: &str, name: &str) -> ListingResult<T> {
    raw.parse()
        .map_err(|_| ListingError::invalid_filter(format!("{name} '{raw}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_listing_conventions() {
        let spec = FilterSpec::default();
        assert_eq!(spec.status, StatusFilter::Any);
        assert_eq!(spec.sort_key, SortKey::Id);
        assert_eq!(spec.sort_direction, SortDirection::Descending);
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, 30);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn parses_request_parameters() {
        let spec = FilterSpec::from_query(
            [
                ("paged", "3"),
                ("orderby", "amount"),
                ("order", "ASC"),
                ("status", "publish"),
                ("user", "42"),
                ("s", "  smith "),
                ("year", "2024"),
                ("m", "2"),
                ("ignored", "x"),
            ],
            20,
        )
        .unwrap();

        assert_eq!(spec.page, 3);
        assert_eq!(spec.page_size, 20);
        assert_eq!(spec.sort_key, SortKey::Amount);
        assert_eq!(spec.sort_direction, SortDirection::Ascending);
        assert_eq!(spec.status, StatusFilter::Only(PaymentStatus::Completed));
        assert_eq!(spec.owner, Some(OwnerRef::User(42)));
        assert_eq!(spec.search_text(), Some("smith"));
        assert_eq!(spec.year, Some(2024));
        assert_eq!(spec.month, Some(2));
        assert_eq!(spec.day, None);
        assert_eq!(spec.offset().unwrap(), 40);
    }

    #[test]
    fn guest_owner_and_custom_status() {
        let spec = FilterSpec::from_query(
            [("user", "guest@example.com"), ("status", "abandoned")],
            30,
        )
        .unwrap();
        assert_eq!(spec.owner, Some(OwnerRef::Guest("guest@example.com".into())));
        assert_eq!(
            spec.status,
            StatusFilter::Only(PaymentStatus::Other("abandoned".into()))
        );
        assert!(!spec.status.is_known_bucket());
    }

    #[test]
    fn empty_values_are_absent() {
        let spec = FilterSpec::from_query([("status", ""), ("s", "   "), ("paged", "")], 30).unwrap();
        assert_eq!(spec, FilterSpec::default());
    }

    #[test]
    fn rejects_zero_and_negative_pages() {
        for (key, value) in [("paged", "0"), ("paged", "-2"), ("per_page", "0"), ("per_page", "-1")] {
            let err = FilterSpec::from_query([(key, value)], 30).unwrap_err();
            assert!(
                matches!(err, ListingError::InvalidFilter { .. }),
                "{key}={value} should be rejected, got {err:?}"
            );
        }
        assert!(FilterSpec::new().with_page(0, 10).validate().is_err());
        assert!(FilterSpec::new().with_page(1, 0).validate().is_err());
    }

    #[test]
    fn rejects_unknown_sort_key_and_bad_dates() {
        assert!(FilterSpec::from_query([("orderby", "email")], 30).is_err());
        assert!(FilterSpec::from_query([("order", "sideways")], 30).is_err());
        assert!(FilterSpec::from_query([("m", "13")], 30).is_err());
        assert!(FilterSpec::from_query([("day", "0")], 30).is_err());
        assert!(FilterSpec::from_query([("year", "twenty")], 30).is_err());
        assert!(FilterSpec::from_query([("mode", "staging")], 30).is_err());
    }

    #[test]
    fn status_only_detection() {
        let spec = FilterSpec::new().with_status(StatusFilter::Only(PaymentStatus::Pending));
        assert!(spec.narrows_by_status_only());
        assert!(!spec.clone().with_search("bob").narrows_by_status_only());
        assert!(!spec.with_date(Some(2024), None, None).narrows_by_status_only());
    }
}
