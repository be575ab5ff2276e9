//! Draft construction and validation
//!
//! Field resolution, per field:
//! - `name`: edit, else best extraction label, else empty
//! - `quantity`: edit, else the builder's default
//! - `expiry_date`: edit, else extraction candidate
//!
//! An explicit edit always wins, including an explicit empty one. Expiry text
//! is accepted as-is; a malformed date never blocks a commit.

use crate::error::{DraftField, ValidationError};
use crate::model::{Draft, ExtractionResult};
use uuid::Uuid;

/// User-entered overrides; `None` means "not touched"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftEdits {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub expiry_date: Option<String>,
}

/// Builds drafts from extraction output and edits
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    default_quantity: String,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new("1")
    }
}

impl RecordBuilder {
    pub fn new(default_quantity: impl Into<String>) -> Self {
        Self {
            default_quantity: default_quantity.into(),
        }
    }

    pub fn build(&self, extraction: Option<&ExtractionResult>, edits: DraftEdits) -> Draft {
        let name = match edits.name {
            Some(name) => clean(name),
            None => extraction
                .and_then(ExtractionResult::best_label)
                .map(|l| l.trim().to_string())
                .unwrap_or_default(),
        };

        let quantity = edits
            .quantity
            .map(clean)
            .unwrap_or_else(|| self.default_quantity.trim().to_string());

        let expiry_date = match edits.expiry_date {
            Some(expiry) => Some(clean(expiry)).filter(|e| !e.is_empty()),
            None => extraction.and_then(|x| x.candidate_expiry.clone()),
        };

        let source_labels = extraction.map(|x| x.labels.clone()).unwrap_or_default();

        Draft {
            draft_id: Uuid::new_v4(),
            name,
            quantity,
            expiry_date,
            source_labels,
        }
    }
}

/// Require non-blank `name` and `quantity`; returns the draft unchanged on success
pub fn validate(draft: Draft) -> Result<Draft, ValidationError> {
    let mut missing_fields = Vec::new();
    if draft.name.trim().is_empty() {
        missing_fields.push(DraftField::Name);
    }
    if draft.quantity.trim().is_empty() {
        missing_fields.push(DraftField::Quantity);
    }

    if missing_fields.is_empty() {
        Ok(draft)
    } else {
        Err(ValidationError { missing_fields })
    }
}

fn clean(value: String) -> String {
    value.trim().to_string()
}
