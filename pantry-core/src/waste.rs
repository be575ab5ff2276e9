//! Waste tracker report
//!
//! Pairs every ingredient in a store snapshot with its classification and
//! orders the result most urgent first.

use crate::classifier::{classify, ClassificationResult, Risk};
use crate::model::Ingredient;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteEntry {
    pub ingredient: Ingredient,
    pub classification: ClassificationResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCounts {
    pub expired: usize,
    pub expiring_soon: usize,
    pub fresh: usize,
    pub unknown: usize,
}

impl RiskCounts {
    fn add(&mut self, risk: Risk) {
        match risk {
            Risk::Expired => self.expired += 1,
            Risk::ExpiringSoon => self.expiring_soon += 1,
            Risk::Fresh => self.fresh += 1,
            Risk::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteReport {
    pub as_of: NaiveDate,
    pub entries: Vec<WasteEntry>,
    pub counts: RiskCounts,
}

fn urgency(risk: Risk) -> u8 {
    match risk {
        Risk::Expired => 0,
        Risk::ExpiringSoon => 1,
        Risk::Fresh => 2,
        Risk::Unknown => 3,
    }
}

impl WasteReport {
    /// Classify `snapshot` against `as_of`
    ///
    /// Order: Expired, ExpiringSoon, Fresh, Unknown; fewer days remaining
    /// first within a category; ties keep snapshot order.
    pub fn build(snapshot: &[Ingredient], as_of: NaiveDate) -> Self {
        let mut counts = RiskCounts::default();
        let mut entries: Vec<WasteEntry> = snapshot
            .iter()
            .map(|ingredient| {
                let classification = classify(ingredient, as_of);
                counts.add(classification.risk);
                WasteEntry {
                    ingredient: ingredient.clone(),
                    classification,
                }
            })
            .collect();

        // sort_by_key is stable
        entries.sort_by_key(|e| {
            (
                urgency(e.classification.risk),
                e.classification.days_remaining.unwrap_or(i64::MAX),
            )
        });

        Self {
            as_of,
            entries,
            counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that need attention (expired or expiring soon)
    pub fn at_risk(&self) -> impl Iterator<Item = &WasteEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.classification.risk, Risk::Expired | Risk::ExpiringSoon))
    }
}
