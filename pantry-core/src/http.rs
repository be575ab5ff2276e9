//! Shared reqwest plumbing for the remote clients

use crate::credential::{Credential, CredentialProvider};
use crate::error::RemoteError;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("pantry/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| RemoteError::Network(e.to_string()))
}

/// Fail fast before building a request when there is no credential
pub(crate) fn require_credential(
    provider: &dyn CredentialProvider,
) -> Result<Credential, RemoteError> {
    provider.current().ok_or(RemoteError::MissingCredential)
}

pub(crate) fn authorize(
    request: reqwest::RequestBuilder,
    credential: &Credential,
) -> reqwest::RequestBuilder {
    request.header(AUTHORIZATION, credential.expose())
}

pub(crate) fn map_transport(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Network(e.to_string())
    }
}

/// Send, then turn non-success statuses into `RemoteError::Service`
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
    let response = request.send().await.map_err(map_transport)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body
    };
    Err(RemoteError::Service {
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::InvalidResponse(e.to_string())
        } else {
            RemoteError::Network(e.to_string())
        }
    })
}

/// Join a base URL (no trailing slash) and an absolute path
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
