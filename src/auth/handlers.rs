//! Entry-point handlers for the token lifecycle.
//!
//! - POST `/login` - Authenticate credentials and issue a token
//! - GET/POST `/refresh_token` - Exchange a token inside its refresh window
//! - POST `/logout` - Clear the token cookie

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::StatusCode,
    response::Response,
};

use super::cookie::CookieSettings;
use super::policy::{AuthPolicy, LoginAttempt};
use super::surface::HttpSurface;
use crate::error::AuthError;
use crate::gate::JwtGate;

/// Largest login body accepted.
pub const LOGIN_BODY_LIMIT: usize = 64 * 1024;

pub async fn login_handler<P: AuthPolicy>(
    State(gate): State<Arc<JwtGate<P>>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let Ok(body) = to_bytes(body, LOGIN_BODY_LIMIT).await else {
        return gate.reject(&AuthError::MissingLoginValues);
    };

    let attempt = LoginAttempt {
        headers: &parts.headers,
        body: &body,
    };

    let subject = match gate.policy().authenticate(&attempt) {
        Ok(subject) => subject,
        Err(err) => {
            tracing::info!(error = %err, "Login failed");
            return gate.reject(&err);
        }
    };

    let issued = match gate.issue(&subject) {
        Ok(issued) => issued,
        Err(err) => {
            tracing::error!(error = %err, "Failed to sign token");
            return gate.reject(&err);
        }
    };

    let mut response =
        gate.responder()
            .login(StatusCode::OK, &issued.token, issued.expires_at_utc());
    gate.persist_cookie(&mut response, &issued.token);
    response
}

pub async fn refresh_handler<P: AuthPolicy>(
    State(gate): State<Arc<JwtGate<P>>>,
    request: Request,
) -> Response {
    let config = gate.config();
    let refreshed = HttpSurface::capture(request, &config.token_lookup)
        .await
        .and_then(|(_, surface)| config.token_lookup.locate(&surface, &config.header_prefix))
        .and_then(|token| gate.refresh(&token));

    match refreshed {
        Ok(issued) => {
            let mut response =
                gate.responder()
                    .refresh(StatusCode::OK, &issued.token, issued.expires_at_utc());
            gate.persist_cookie(&mut response, &issued.token);
            response
        }
        Err(err) => gate.reject(&err),
    }
}

pub async fn logout_handler<P: AuthPolicy>(State(gate): State<Arc<JwtGate<P>>>) -> Response {
    let mut response = gate.responder().logout(StatusCode::OK);

    let cookie = &gate.config().cookie;
    if cookie.send {
        CookieSettings::append_to(response.headers_mut(), &cookie.clear_cookie());
    }
    response
}
