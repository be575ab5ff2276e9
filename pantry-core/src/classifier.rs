//! Expiry risk classification
//!
//! Pure functions of (ingredient, reference date). Nothing here is cached or
//! stored, so a result can never go stale relative to its ingredient.
//!
//! Accepted expiry grammars: `YYYY-MM-DD`, `YYYY/MM/DD`, `DD/MM/YYYY`,
//! `DD-MM-YYYY`, `DD.MM.YYYY` and RFC 3339 timestamps. Anything else,
//! including year-less forms such as `DD/MM`, classifies as `Unknown`; no year
//! is guessed.

use crate::model::Ingredient;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest `days_remaining` still counted as expiring soon
pub const EXPIRING_SOON_DAYS: i64 = 7;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Freshness category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Risk {
    Fresh,
    ExpiringSoon,
    Expired,
    Unknown,
}

impl Risk {
    fn from_days(days_remaining: i64) -> Self {
        if days_remaining < 0 {
            Risk::Expired
        } else if days_remaining <= EXPIRING_SOON_DAYS {
            Risk::ExpiringSoon
        } else {
            Risk::Fresh
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Risk::Fresh => "fresh",
            Risk::ExpiringSoon => "expiring soon",
            Risk::Expired => "expired",
            Risk::Unknown => "unknown",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub days_remaining: Option<i64>,
    pub risk: Risk,
}

impl ClassificationResult {
    pub const UNKNOWN: Self = Self {
        days_remaining: None,
        risk: Risk::Unknown,
    };

    fn from_days(days_remaining: i64) -> Self {
        Self {
            days_remaining: Some(days_remaining),
            risk: Risk::from_days(days_remaining),
        }
    }

    /// Waste tracker caption
    pub fn describe(&self) -> String {
        match self.days_remaining {
            Some(days) if days >= 0 => format!("{} day(s) left", days),
            Some(_) => "Expired".to_string(),
            None => "No expiry date".to_string(),
        }
    }
}

/// Parse an expiry string; `None` when it is not a recognizable calendar date
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(timestamp.date());
    }

    DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(text, format).ok())
        // Two-digit years parse as year 00xx; reject rather than guess a century
        .find(|date| (1000..=9999).contains(&chrono::Datelike::year(date)))
}

/// Classify against a calendar date: `days_remaining = expiry - as_of`
///
/// Callers pass the local calendar date, so an item expiring today has 0 days
/// left for the whole day.
pub fn classify(ingredient: &Ingredient, as_of: NaiveDate) -> ClassificationResult {
    match ingredient.expiry_date.as_deref().and_then(parse_expiry) {
        Some(date) => ClassificationResult::from_days((date - as_of).num_days()),
        None => ClassificationResult::UNKNOWN,
    }
}
