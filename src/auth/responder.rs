//! Shapes the response for every terminal authentication outcome.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::AuthError;

#[derive(Serialize)]
struct MessageEnvelope<'a> {
    code: u16,
    message: &'a str,
}

#[derive(Serialize)]
struct TokenEnvelope<'a> {
    code: u16,
    token: &'a str,
    expire: String,
}

#[derive(Serialize)]
struct CodeEnvelope {
    code: u16,
}

/// Response callbacks. Every method has a JSON default and can be overridden
/// individually.
pub trait Responder: Send + Sync {
    fn unauthorized(&self, code: StatusCode, message: &str) -> Response {
        (
            code,
            Json(MessageEnvelope {
                code: code.as_u16(),
                message,
            }),
        )
            .into_response()
    }

    fn login(&self, code: StatusCode, token: &str, expires_at: DateTime<Utc>) -> Response {
        token_response(code, token, expires_at)
    }

    fn logout(&self, code: StatusCode) -> Response {
        (
            code,
            Json(CodeEnvelope {
                code: code.as_u16(),
            }),
        )
            .into_response()
    }

    fn refresh(&self, code: StatusCode, token: &str, expires_at: DateTime<Utc>) -> Response {
        token_response(code, token, expires_at)
    }

    /// Client-facing message for `err`.
    fn message_for(&self, err: &AuthError) -> String {
        err.to_string()
    }
}

fn token_response(code: StatusCode, token: &str, expires_at: DateTime<Utc>) -> Response {
    (
        code,
        Json(TokenEnvelope {
            code: code.as_u16(),
            token,
            expire: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }),
    )
        .into_response()
}

/// Render a failed request through `responder`, with the realm challenge.
pub(crate) fn reject_with(responder: &dyn Responder, realm: &str, err: &AuthError) -> Response {
    tracing::debug!(error = %err, kind = ?err.kind(), "Rejecting request");

    let message = responder.message_for(err);
    let mut response = responder.unauthorized(err.status_code(), &message);

    let challenge = format!("JWT realm=\"{}\"", realm);
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

/// The stock JSON envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponder;

impl Responder for JsonResponder {}
