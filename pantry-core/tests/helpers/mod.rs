//! Shared fakes for pantry-core integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pantry_core::capture::ImageSource;
use pantry_core::error::RemoteError;
use pantry_core::extraction::ExtractionClient;
use pantry_core::gateway::SyncGateway;
use pantry_core::model::{CaptureSource, CapturedImage};
use pantry_core::{Draft, ExtractionResult, Ingredient};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchAll,
    Create,
    Delete(i64),
}

/// Holds one request in flight until the test releases it
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated request has reached the server
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// In-memory server with per-request gates and failure injection
///
/// - `fetch_all` reads server state when the request arrives, then waits at
///   its gate, so a gated fetch returns a stale snapshot
/// - `create` and `delete` wait at their gate, then apply to server state
#[derive(Default)]
pub struct GatedGateway {
    server: Mutex<Vec<Ingredient>>,
    next_id: Mutex<i64>,
    gates: Mutex<HashMap<Op, Arc<Gate>>>,
    failures: Mutex<HashMap<Op, RemoteError>>,
    calls: Mutex<Vec<Op>>,
}

impl GatedGateway {
    pub fn with_server(items: Vec<Ingredient>) -> Arc<Self> {
        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0);
        Arc::new(Self {
            server: Mutex::new(items),
            next_id: Mutex::new(next_id),
            ..Default::default()
        })
    }

    /// Next create returns `id`
    pub fn set_next_id(&self, id: i64) {
        *self.next_id.lock().unwrap() = id - 1;
    }

    pub fn set_server(&self, items: Vec<Ingredient>) {
        *self.server.lock().unwrap() = items;
    }

    pub fn server_ids(&self) -> Vec<i64> {
        self.server.lock().unwrap().iter().map(|i| i.id).collect()
    }

    /// Gate the next request of this kind
    pub fn arm(&self, op: Op) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(op, Arc::clone(&gate));
        gate
    }

    /// Fail the next request of this kind
    pub fn fail_next(&self, op: Op, error: RemoteError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    pub fn calls(&self) -> Vec<Op> {
        self.calls.lock().unwrap().clone()
    }

    async fn pass_gate(&self, op: Op) {
        self.calls.lock().unwrap().push(op);
        let gate = self.gates.lock().unwrap().remove(&op);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }

    fn take_failure(&self, op: Op) -> Option<RemoteError> {
        self.failures.lock().unwrap().remove(&op)
    }
}

#[async_trait]
impl SyncGateway for GatedGateway {
    async fn fetch_all(&self) -> Result<Vec<Ingredient>, RemoteError> {
        let snapshot = self.server.lock().unwrap().clone();
        self.pass_gate(Op::FetchAll).await;
        match self.take_failure(Op::FetchAll) {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    async fn create(&self, draft: &Draft) -> Result<i64, RemoteError> {
        self.pass_gate(Op::Create).await;
        if let Some(e) = self.take_failure(Op::Create) {
            return Err(e);
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.server
            .lock()
            .unwrap()
            .push(draft.clone().into_persisted(id));
        Ok(id)
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.pass_gate(Op::Delete(id)).await;
        if let Some(e) = self.take_failure(Op::Delete(id)) {
            return Err(e);
        }
        self.server.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }
}

pub fn ingredient(id: i64, name: &str) -> Ingredient {
    Ingredient {
        id,
        name: name.to_string(),
        quantity: "1".to_string(),
        expiry_date: None,
    }
}

pub fn ids(items: &[Ingredient]) -> Vec<i64> {
    items.iter().map(|i| i.id).collect()
}

/// Image source returning a tiny JPEG, or cancellation
pub struct FakeImageSource {
    pub cancel: bool,
}

#[async_trait]
impl ImageSource for FakeImageSource {
    async fn acquire(
        &self,
        _source: CaptureSource,
    ) -> pantry_common::Result<Option<CapturedImage>> {
        if self.cancel {
            return Ok(None);
        }
        Ok(Some(CapturedImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            file_name: "image.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }))
    }
}

/// Extraction client answering from a queue, optionally gated per call
#[derive(Default)]
pub struct FakeExtractor {
    responses: Mutex<VecDeque<(Option<Arc<Gate>>, Result<(Vec<String>, Option<String>), RemoteError>)>>,
    calls: Mutex<Vec<Uuid>>,
}

impl FakeExtractor {
    /// Queue the next response; returns a gate when `gated`
    pub fn push(
        &self,
        gated: bool,
        response: Result<(Vec<String>, Option<String>), RemoteError>,
    ) -> Option<Arc<Gate>> {
        let gate = gated.then(|| Arc::new(Gate::default()));
        self.responses
            .lock()
            .unwrap()
            .push_back((gate.clone(), response));
        gate
    }

    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionClient for FakeExtractor {
    async fn extract(
        &self,
        capture_id: Uuid,
        _image: CapturedImage,
    ) -> Result<ExtractionResult, RemoteError> {
        self.calls.lock().unwrap().push(capture_id);
        let (gate, response) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| (None, Ok((Vec::new(), None))));
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        response.map(|(labels, candidate_expiry)| ExtractionResult {
            capture_id,
            labels,
            candidate_expiry,
        })
    }
}

pub fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
