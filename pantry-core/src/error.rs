//! Error types for pantry-core
//!
//! Transport and service failures (`RemoteError`) come from the remote
//! boundaries and are never retried there. Store-level failures
//! (`StoreError`) always leave the local collection as it was before the
//! failed operation.

use std::fmt;
use thiserror::Error;

/// Failure of a call to the remote analysis or persistence API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Request exceeded its configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("Service error {status}: {message}")]
    Service { status: u16, message: String },

    /// Endpoint answered with a body that does not match the wire contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No credential available; nothing was sent
    #[error("Missing credential")]
    MissingCredential,
}

impl RemoteError {
    /// Transport-level failures the user may retry as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Timeout | RemoteError::Network(_))
    }
}

/// Draft fields that must be non-empty before commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Name,
    Quantity,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftField::Name => f.write_str("name"),
            DraftField::Quantity => f.write_str("quantity"),
        }
    }
}

/// Local input failure; lists every missing field so the UI can mark them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required fields: {}", join_fields(.missing_fields))]
pub struct ValidationError {
    pub missing_fields: Vec<DraftField>,
}

fn join_fields(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// IngredientStore operation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Draft rejected before any request was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A commit for the same draft is still in flight
    #[error("Commit already in progress for this draft")]
    CommitInFlight,

    /// Create failed; the draft was not added
    #[error("Failed to save ingredient: {0}")]
    PersistFailure(RemoteError),

    /// Delete failed; the ingredient was restored
    #[error("Failed to delete ingredient {id}: {source}")]
    DeleteFailure { id: i64, source: RemoteError },

    /// Refresh failed; the previous snapshot was kept
    #[error("Failed to refresh ingredients: {0}")]
    RefreshFailure(RemoteError),

    /// The runtime stopped the operation before it settled
    #[error("Store operation interrupted: {0}")]
    Interrupted(String),
}

impl StoreError {
    /// Underlying remote failure, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            StoreError::PersistFailure(e) | StoreError::RefreshFailure(e) => Some(e),
            StoreError::DeleteFailure { source, .. } => Some(source),
            StoreError::Validation(_) | StoreError::CommitInFlight | StoreError::Interrupted(_) => {
                None
            }
        }
    }
}
