use crate::filter::DEFAULT_PAGE_SIZE;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyPosition {
    Before,
    After,
}

/// How amounts, dates and buyers are shown in the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub currency_position: CurrencyPosition,
    pub decimal_places: u32,
    pub thousands_separator: String,
    pub decimal_separator: String,
    /// chrono format string for the date column.
    pub date_format: String,
    /// chrono format string appended in the details view.
    pub time_format: String,
    /// Shown in the user column for purchases without a registered user.
    pub guest_label: String,
}

impl DisplayConfig {
    /// Reject date and time formats chrono cannot render for a naive
    /// timestamp (unknown specifiers, timezone fields).
    pub fn validate(&self) -> anyhow::Result<()> {
        check_timestamp_format("date_format", &self.date_format)?;
        check_timestamp_format("time_format", &self.time_format)
    }
}

fn check_timestamp_format(field: &str, format: &str) -> anyhow::Result<()> {
    let mut out = String::new();
    write!(out, "{}", NaiveDateTime::default().format(format))
        .map_err(|_| anyhow::anyhow!("{field} '{format}' is not a usable date format"))
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".into(),
            currency_position: CurrencyPosition::Before,
            decimal_places: 2,
            thousands_separator: ",".into(),
            decimal_separator: ".".into(),
            date_format: "%B %-d, %Y".into(),
            time_format: "%-I:%M %p".into(),
            guest_label: "guest".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub per_page: u32,
    pub display: DisplayConfig,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PAGE_SIZE,
            display: DisplayConfig::default(),
        }
    }
}

impl ListingConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        if config.per_page < 1 {
            anyhow::bail!("per_page must be at least 1, got {}", config.per_page);
        }
        config.display.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ListingConfig::from_json(
            r#"{ "per_page": 50, "display": { "currency_symbol": "€", "currency_position": "after" } }"#,
        )
        .unwrap();
        assert_eq!(config.per_page, 50);
        assert_eq!(config.display.currency_symbol, "€");
        assert_eq!(config.display.currency_position, CurrencyPosition::After);
        assert_eq!(config.display.decimal_places, 2);
        assert_eq!(config.display.guest_label, "guest");
    }

    #[test]
    fn zero_per_page_is_rejected() {
        assert!(ListingConfig::from_json(r#"{ "per_page": 0 }"#).is_err());
    }

    #[test]
    fn unusable_date_formats_are_rejected() {
        let err = ListingConfig::from_json(r#"{ "display": { "date_format": "%Q" } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("date_format"), "got {err}");

        let err = ListingConfig::from_json(r#"{ "display": { "time_format": "%H:%M %Z" } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("time_format"), "got {err}");

        assert!(ListingConfig::from_json(r#"{ "display": { "date_format": "%d/%m/%Y" } }"#)
            .is_ok());
        assert!(DisplayConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ListingConfig::load("/nonexistent/paylist.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/paylist.json"));
    }
}
