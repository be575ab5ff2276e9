//! Image capture coordination
//!
//! A session runs at most one capture at a time. Starting a capture cancels
//! whatever extraction the previous one still has outstanding; a superseded
//! response is reported as [`CaptureOutcome::Superseded`] and its data is
//! dropped. The image itself is moved into the extraction client and never
//! kept here.

use crate::error::RemoteError;
use crate::extraction::ExtractionClient;
use crate::model::{CaptureSource, CapturedImage, ExtractionResult};
use async_trait::async_trait;
use pantry_common::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "image.jpg";

/// Platform image acquisition (camera or gallery picker)
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// `Ok(None)` when the user cancels; that is not an error
    async fn acquire(&self, source: CaptureSource) -> Result<Option<CapturedImage>>;
}

/// Result of one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// User backed out of the picker
    Cancelled,
    /// A newer capture started (or the session was cancelled) first
    Superseded { capture_id: Uuid },
    Extracted {
        capture_id: Uuid,
        result: ExtractionResult,
    },
    /// Analysis failed; continue with manual entry
    ExtractionFailed {
        capture_id: Uuid,
        error: RemoteError,
    },
}

impl CaptureOutcome {
    /// Extraction output to seed a draft with, if any
    pub fn extraction(&self) -> Option<&ExtractionResult> {
        match self {
            CaptureOutcome::Extracted { result, .. } => Some(result),
            _ => None,
        }
    }
}

struct ActiveCapture {
    capture_id: Uuid,
    token: CancellationToken,
}

pub struct CaptureSession {
    images: Arc<dyn ImageSource>,
    extractor: Arc<dyn ExtractionClient>,
    active: Mutex<Option<ActiveCapture>>,
}

impl CaptureSession {
    pub fn new(images: Arc<dyn ImageSource>, extractor: Arc<dyn ExtractionClient>) -> Self {
        Self {
            images,
            extractor,
            active: Mutex::new(None),
        }
    }

    /// Capture id of the capture currently in progress
    pub async fn current(&self) -> Option<Uuid> {
        self.active.lock().await.as_ref().map(|a| a.capture_id)
    }

    /// Supersede the capture in progress, if any
    pub async fn cancel(&self) {
        if let Some(active) = self.active.lock().await.take() {
            tracing::debug!(capture_id = %active.capture_id, "Capture cancelled");
            active.token.cancel();
        }
    }

    /// Acquire one image and run extraction on it
    ///
    /// Errors only when the image source itself fails; extraction failures are
    /// reported through [`CaptureOutcome::ExtractionFailed`].
    pub async fn capture(&self, source: CaptureSource) -> Result<CaptureOutcome> {
        let capture_id = Uuid::new_v4();
        let token = self.begin(capture_id).await;

        let image = match self.images.acquire(source).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                self.finish(capture_id).await;
                return Ok(CaptureOutcome::Cancelled);
            }
            Err(e) => {
                self.finish(capture_id).await;
                return Err(e);
            }
        };

        if token.is_cancelled() {
            return Ok(CaptureOutcome::Superseded { capture_id });
        }

        tracing::debug!(capture_id = %capture_id, %source, "Image acquired");

        let extraction = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.extractor.extract(capture_id, image) => Some(result),
        };

        // Still current? A newer capture may have started after the response arrived
        let still_current = self.finish(capture_id).await;
        let Some(result) = extraction.filter(|_| still_current) else {
            tracing::debug!(capture_id = %capture_id, "Discarding superseded extraction");
            return Ok(CaptureOutcome::Superseded { capture_id });
        };

        Ok(match result {
            Ok(result) => CaptureOutcome::Extracted { capture_id, result },
            Err(error) => {
                tracing::warn!(capture_id = %capture_id, %error, "Extraction failed, falling back to manual entry");
                CaptureOutcome::ExtractionFailed { capture_id, error }
            }
        })
    }

    async fn begin(&self, capture_id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self.active.lock().await.replace(ActiveCapture {
            capture_id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            tracing::debug!(
                superseded = %previous.capture_id,
                capture_id = %capture_id,
                "New capture supersedes previous"
            );
            previous.token.cancel();
        }
        token
    }

    /// Clear the active slot if it still belongs to `capture_id`
    async fn finish(&self, capture_id: Uuid) -> bool {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(a) if a.capture_id == capture_id && !a.token.is_cancelled() => {
                *active = None;
                true
            }
            _ => false,
        }
    }
}

/// Image source backed by a file chosen up front (e.g. on the command line)
///
/// No path means the user made no choice, reported as cancellation.
#[derive(Debug, Clone, Default)]
pub struct FileImageSource {
    path: Option<PathBuf>,
}

impl FileImageSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn acquire(&self, source: CaptureSource) -> Result<Option<CapturedImage>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(path).await?;
        let kind = infer::get(&bytes)
            .filter(|k| k.matcher_type() == infer::MatcherType::Image)
            .ok_or_else(|| {
                Error::InvalidInput(format!("{} is not a recognized image", path.display()))
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

        tracing::debug!(%source, path = %path.display(), mime = kind.mime_type(), "Read image file");

        Ok(Some(CapturedImage {
            bytes,
            file_name,
            mime_type: kind.mime_type().to_string(),
        }))
    }
}
