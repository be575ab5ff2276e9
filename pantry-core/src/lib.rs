//! pantry-core: ingredient ingestion and expiry-risk pipeline
//!
//! Capture → extraction → draft → store → classification:
//! - [`capture::CaptureSession`] acquires one image at a time and discards
//!   superseded extraction responses
//! - [`extraction::ExtractionClient`] sends the image to the remote analyzer
//! - [`builder::RecordBuilder`] merges extraction output with user edits
//! - [`store::IngredientStore`] owns the inventory and syncs it through a
//!   [`gateway::SyncGateway`]
//! - [`classifier`] derives expiry risk from an ingredient and a date
//! - [`waste`] and [`recipe`] build the waste tracker report and recipe query
//!   from a store snapshot

pub mod builder;
pub mod capture;
pub mod classifier;
pub mod credential;
pub mod error;
pub mod extraction;
pub mod gateway;
mod http;
pub mod model;
pub mod recipe;
pub mod store;
pub mod waste;

pub use crate::error::{DraftField, RemoteError, StoreError, ValidationError};
pub use crate::model::{Draft, ExtractionResult, Ingredient};
