//! Ingredient records and pipeline artifacts

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A persisted ingredient with its server-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub quantity: String,
    /// Raw expiry text as entered or extracted; may not parse as a date
    pub expiry_date: Option<String>,
}

/// An ingredient not yet assigned a server identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Local identity used to reject double submission of the same draft
    pub draft_id: Uuid,
    pub name: String,
    pub quantity: String,
    pub expiry_date: Option<String>,
    /// Extraction candidates, best first; dropped once persisted
    pub source_labels: Vec<String>,
}

impl Draft {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            name: name.into(),
            quantity: quantity.into(),
            expiry_date: None,
            source_labels: Vec::new(),
        }
    }

    pub fn with_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.expiry_date = Some(expiry.into());
        self
    }

    /// Attach the server id, dropping draft-only data
    pub fn into_persisted(self, id: i64) -> Ingredient {
        Ingredient {
            id,
            name: self.name,
            quantity: self.quantity,
            expiry_date: self.expiry_date,
        }
    }
}

/// Output of one image analysis, consumed once by the record builder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionResult {
    /// Capture this result belongs to
    pub capture_id: Uuid,
    /// Candidate names, confidence-ordered (best first); may be empty
    pub labels: Vec<String>,
    /// Candidate expiry text, if the analyzer found one
    pub candidate_expiry: Option<String>,
}

impl ExtractionResult {
    pub fn best_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

/// Where an image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Gallery,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Camera => f.write_str("camera"),
            CaptureSource::Gallery => f.write_str("gallery"),
        }
    }
}

/// Image bytes handed from the capture session to the extraction client
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}
