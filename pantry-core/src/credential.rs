//! Credential boundary
//!
//! Session storage and sign-in live outside the core. The core only asks a
//! provider for the current credential and forwards it opaquely; it never
//! inspects, validates or refreshes it.

use std::fmt;

/// Environment variable read by [`EnvCredential`]
pub const ENV_TOKEN: &str = "PANTRY_TOKEN";

/// Opaque auth credential sent verbatim in the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Blank values are treated as "no credential"
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Supplies the credential for each outgoing call
pub trait CredentialProvider: Send + Sync {
    /// `None` when the user is signed out or the session is gone
    fn current(&self) -> Option<Credential>;
}

/// Fixed credential (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn new(credential: Option<Credential>) -> Self {
        Self(credential)
    }
}

impl CredentialProvider for StaticCredential {
    fn current(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Reads [`ENV_TOKEN`] on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredential;

impl CredentialProvider for EnvCredential {
    fn current(&self) -> Option<Credential> {
        std::env::var(ENV_TOKEN).ok().and_then(Credential::new)
    }
}
