//! Response conversion for authentication errors raised outside the gate.

use axum::response::{IntoResponse, Response};

use super::responder::{JsonResponder, Responder};
use crate::error::AuthError;

/// Used where no gate is available to consult, such as an extractor on a
/// route without the middleware; renders the stock JSON envelope.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        JsonResponder.unauthorized(self.status_code(), &self.to_string())
    }
}
