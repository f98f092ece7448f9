//! Application hooks wired around token issuance and verification.

use std::time::Duration;

use axum::http::{HeaderMap, request::Parts};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::claims::Claims;
use crate::error::AuthError;

/// Application identity resolved from verified claims. Lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Identity(pub Value);

impl Identity {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// The raw login request handed to [`AuthPolicy::authenticate`].
#[derive(Debug, Clone, Copy)]
pub struct LoginAttempt<'a> {
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

impl LoginAttempt<'_> {
    /// Decode the body as JSON. Undecodable bodies count as missing login values.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        serde_json::from_slice(self.body).map_err(|e| {
            tracing::debug!(error = %e, "Login body is not valid JSON");
            AuthError::MissingLoginValues
        })
    }
}

/// Capability interface for the pluggable parts of authentication.
///
/// Only `authenticate` is required. Every hook runs synchronously on the
/// request path and must not block.
pub trait AuthPolicy: Send + Sync + 'static {
    /// What a successful login resolves to.
    type Subject: Send;

    /// Check login credentials.
    fn authenticate(&self, attempt: &LoginAttempt<'_>) -> Result<Self::Subject, AuthError>;

    /// Extra claims to embed for `subject` at issuance.
    fn payload(&self, _subject: &Self::Subject) -> Claims {
        Claims::new()
    }

    /// Lifetime of a token carrying `claims`. Receives a snapshot taken
    /// before `exp` and `orig_iat` are set.
    fn token_lifetime(&self, _claims: &Claims, configured: Duration) -> Duration {
        configured
    }

    /// Turn verified claims into an identity. Reads `identity_key` by default.
    fn identity(&self, claims: &Claims, identity_key: &str) -> Identity {
        Identity(claims.get(identity_key).cloned().unwrap_or(Value::Null))
    }

    /// Permit or deny the request for `identity`.
    fn authorize(&self, _identity: &Identity, _request: &Parts) -> bool {
        true
    }
}
