//! Remote persistence boundary
//!
//! Wire contract:
//! - List: `GET /getIngredients` → `{ ingredients: [{ id, name, quantity, expiry|null }] }`
//! - Create: `POST /ingredients` `{ name, quantity, expiry }` → `{ itemId }`
//! - Delete: `DELETE /ingredients/{id}` → acknowledgement only
//!
//! Every call carries the credential in the `Authorization` header. Errors are
//! surfaced as-is; retry policy belongs to the caller.

use crate::credential::CredentialProvider;
use crate::error::RemoteError;
use crate::http;
use crate::model::{Draft, Ingredient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const LIST_PATH: &str = "/getIngredients";
const INGREDIENTS_PATH: &str = "/ingredients";

/// List, create and delete ingredients on the server
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Full authoritative set, in server order
    async fn fetch_all(&self) -> Result<Vec<Ingredient>, RemoteError>;

    /// Persist a draft; returns the server-assigned id
    async fn create(&self, draft: &Draft) -> Result<i64, RemoteError>;

    async fn delete(&self, id: i64) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    ingredients: Vec<WireIngredient>,
}

#[derive(Debug, Deserialize)]
struct WireIngredient {
    id: i64,
    name: String,
    quantity: String,
    #[serde(default)]
    expiry: Option<String>,
}

impl From<WireIngredient> for Ingredient {
    fn from(wire: WireIngredient) -> Self {
        Ingredient {
            id: wire.id,
            name: wire.name,
            quantity: wire.quantity,
            // Absent expiry travels as "" on create
            expiry_date: wire.expiry.filter(|e| !e.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    quantity: &'a str,
    expiry: &'a str,
}

impl<'a> From<&'a Draft> for CreateRequest<'a> {
    fn from(draft: &'a Draft) -> Self {
        Self {
            name: &draft.name,
            quantity: &draft.quantity,
            expiry: draft.expiry_date.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "itemId")]
    item_id: i64,
}

/// HTTP implementation of [`SyncGateway`]
pub struct HttpSyncGateway {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpSyncGateway {
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
impl SyncGateway for HttpSyncGateway {
    async fn fetch_all(&self) -> Result<Vec<Ingredient>, RemoteError> {
        let credential = http::require_credential(self.credentials.as_ref())?;
        tracing::debug!("Fetching ingredient list");

        let request = self.http_client.get(http::endpoint(&self.base_url, LIST_PATH));
        let response = http::send(http::authorize(request, &credential)).await?;
        let list: ListResponse = http::read_json(response).await?;

        Ok(list.ingredients.into_iter().map(Ingredient::from).collect())
    }

    async fn create(&self, draft: &Draft) -> Result<i64, RemoteError> {
        let credential = http::require_credential(self.credentials.as_ref())?;
        tracing::debug!(name = %draft.name, "Creating ingredient");

        let request = self
            .http_client
            .post(http::endpoint(&self.base_url, INGREDIENTS_PATH))
            .json(&CreateRequest::from(draft));
        let response = http::send(http::authorize(request, &credential)).await?;
        let created: CreateResponse = http::read_json(response).await?;

        Ok(created.item_id)
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let credential = http::require_credential(self.credentials.as_ref())?;
        tracing::debug!(id, "Deleting ingredient");

        let url = http::endpoint(&self.base_url, &format!("{}/{}", INGREDIENTS_PATH, id));
        let request = self.http_client.delete(url);
        http::send(http::authorize(request, &credential)).await?;

        Ok(())
    }
}
