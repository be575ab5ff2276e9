//! Remote image analysis client
//!
//! One request per call, no retry, no side effect. A failure means "fall back
//! to manual entry", never a hard stop.

use crate::credential::CredentialProvider;
use crate::error::RemoteError;
use crate::http;
use crate::model::{CapturedImage, ExtractionResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SCAN_PATH: &str = "/scan-expiry";

/// Sends a captured image to the analysis service
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Analyze one image; `capture_id` is echoed into the result
    async fn extract(
        &self,
        capture_id: Uuid,
        image: CapturedImage,
    ) -> Result<ExtractionResult, RemoteError>;
}

/// Scan response: `{ expiryDate?: string, labels?: string[] }`
#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(rename = "expiryDate", default)]
    expiry_date: Option<String>,
    #[serde(default)]
    labels: Option<Vec<String>>,
}

impl ScanResponse {
    fn into_result(self, capture_id: Uuid) -> ExtractionResult {
        let labels = self
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        let candidate_expiry = self
            .expiry_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        ExtractionResult {
            capture_id,
            labels,
            candidate_expiry,
        }
    }
}

/// HTTP implementation posting the image as multipart form data
pub struct HttpExtractionClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpExtractionClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            http_client: http::build_client(timeout)?,
            base_url: base_url.into(),
            credentials,
        })
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(
        &self,
        capture_id: Uuid,
        image: CapturedImage,
    ) -> Result<ExtractionResult, RemoteError> {
        let credential = http::require_credential(self.credentials.as_ref())?;

        tracing::debug!(
            capture_id = %capture_id,
            bytes = image.bytes.len(),
            mime = %image.mime_type,
            "Sending image for analysis"
        );

        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)
            .map_err(|e| RemoteError::Network(format!("Invalid image MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self
            .http_client
            .post(http::endpoint(&self.base_url, SCAN_PATH))
            .multipart(form);
        let response = http::send(http::authorize(request, &credential)).await?;
        let scan: ScanResponse = http::read_json(response).await?;
        let result = scan.into_result(capture_id);

        tracing::info!(
            capture_id = %capture_id,
            labels = result.labels.len(),
            has_expiry = result.candidate_expiry.is_some(),
            "Image analysis complete"
        );

        Ok(result)
    }
}
