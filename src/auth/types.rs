//! Per-request authentication results stored in request extensions.

use std::fmt;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};

use super::policy::Identity;
use super::responder::{Responder, reject_with};
use crate::claims::Claims;
use crate::error::AuthError;

/// Attached to a request that passed the gate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Identity resolved from the claims
    pub identity: Identity,
    /// Verified claims of the presented token
    pub claims: Claims,
    /// The raw token string
    pub token: String,
}

/// Attached instead of [`AuthContext`] when aborting is disabled and the
/// request failed authentication.
///
/// Carries the gate's responder and realm so a handler that still requires
/// an identity answers exactly as the middleware would have.
#[derive(Clone)]
pub struct AuthFailure {
    pub error: AuthError,
    responder: Arc<dyn Responder>,
    realm: String,
}

impl AuthFailure {
    pub(crate) fn new(error: AuthError, responder: Arc<dyn Responder>, realm: String) -> Self {
        Self {
            error,
            responder,
            realm,
        }
    }
}

impl fmt::Debug for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFailure")
            .field("error", &self.error)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        reject_with(self.responder.as_ref(), &self.realm, &self.error)
    }
}
