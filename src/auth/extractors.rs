//! The authentication middleware and the extractors that read its result.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::policy::AuthPolicy;
use super::surface::{HttpSurface, RequestSurface};
use super::types::{AuthContext, AuthFailure};
use crate::error::AuthError;
use crate::gate::JwtGate;

/// Core of the middleware: locate, verify, resolve identity, authorize.
pub fn authenticate_request<P, R>(
    gate: &JwtGate<P>,
    surface: &R,
    parts: &Parts,
) -> Result<AuthContext, AuthError>
where
    P: AuthPolicy,
    R: RequestSurface + ?Sized,
{
    let config = gate.config();

    let token = config
        .token_lookup
        .locate(surface, &config.header_prefix)?;

    let claims = gate.verify(&token)?;

    let identity = gate.policy().identity(&claims, &config.identity_key);

    if !gate.policy().authorize(&identity, parts) {
        tracing::info!(identity = %identity.0, path = %parts.uri.path(), "Authorization denied");
        return Err(AuthError::Forbidden);
    }

    Ok(AuthContext {
        identity,
        claims,
        token,
    })
}

/// Middleware guarding routes behind a valid token.
///
/// On success the request continues with an [`AuthContext`] extension. On
/// failure the gate's responder answers, unless aborting is disabled, in
/// which case the request continues with an [`AuthFailure`] extension.
pub async fn require_auth<P: AuthPolicy>(
    State(gate): State<Arc<JwtGate<P>>>,
    request: Request,
    next: Next,
) -> Response {
    let config = gate.config();
    let (request, surface) = match HttpSurface::capture(request, &config.token_lookup).await {
        Ok(captured) => captured,
        Err(err) => return gate.reject(&err),
    };
    let (mut parts, body) = request.into_parts();

    match authenticate_request(&gate, &surface, &parts) {
        Ok(context) => {
            let authorization = config.send_authorization.then(|| {
                if config.header_prefix.is_empty() {
                    context.token.clone()
                } else {
                    format!("{} {}", config.header_prefix, context.token)
                }
            });

            parts.extensions.insert(context);
            let mut response = next.run(Request::from_parts(parts, body)).await;

            if let Some(value) = authorization.and_then(|v| HeaderValue::from_str(&v).ok()) {
                response.headers_mut().insert(header::AUTHORIZATION, value);
            }
            response
        }
        Err(err) if config.disable_abort => {
            tracing::debug!(error = %err, "Authentication failed, continuing without identity");
            parts.extensions.insert(gate.failure(err));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => gate.reject(&err),
    }
}

/// Extractor for handlers behind [`require_auth`].
///
/// With aborting disabled, a failed request is answered here through the
/// gate's responder. Without the middleware installed it rejects with
/// [`AuthError::TokenNotFound`] in the stock JSON envelope.
pub struct Authenticated(pub AuthContext);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<AuthContext>() {
            return Ok(Authenticated(context.clone()));
        }

        Err(match parts.extensions.get::<AuthFailure>() {
            Some(failure) => failure.clone().into_response(),
            None => AuthError::TokenNotFound.into_response(),
        })
    }
}

/// Optional authentication extractor - never fails.
/// Useful with aborting disabled, for routes that serve both anonymous and
/// signed-in callers.
pub struct MaybeAuthenticated(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthenticated(parts.extensions.get::<AuthContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, LoginAttempt};
    use crate::claims::Claims;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde_json::json;

    struct OnlyAdmins;

    impl AuthPolicy for OnlyAdmins {
        type Subject = String;

        fn authenticate(&self, _attempt: &LoginAttempt<'_>) -> Result<String, AuthError> {
            Err(AuthError::FailedAuthentication)
        }

        fn payload(&self, subject: &String) -> Claims {
            [("identity", json!(subject))].into_iter().collect()
        }

        fn authorize(&self, identity: &Identity, _request: &Parts) -> bool {
            identity.as_str() == Some("admin")
        }
    }

    fn gate() -> JwtGate<OnlyAdmins> {
        JwtGate::builder(OnlyAdmins)
            .secret("extractor-secret")
            .build()
            .unwrap()
    }

    fn parts() -> Parts {
        Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0
    }

    fn surface_for(token: &str) -> HttpSurface {
        let mut surface = HttpSurface::default();
        surface.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        surface
    }

    #[test]
    fn test_authorized_identity() {
        let gate = gate();
        let issued = gate.issue(&"admin".to_string()).unwrap();

        let context = authenticate_request(&gate, &surface_for(&issued.token), &parts()).unwrap();
        assert_eq!(context.identity, Identity(json!("admin")));
        assert_eq!(context.token, issued.token);
        assert!(context.claims.contains_key("orig_iat"));
    }

    #[test]
    fn test_forbidden_identity() {
        let gate = gate();
        let issued = gate.issue(&"guest".to_string()).unwrap();

        let result = authenticate_request(&gate, &surface_for(&issued.token), &parts());
        assert_eq!(result.err(), Some(AuthError::Forbidden));
    }

    #[test]
    fn test_missing_token() {
        let result = authenticate_request(&gate(), &HttpSurface::default(), &parts());
        assert_eq!(result.err(), Some(AuthError::EmptyAuthHeader));
    }

    #[tokio::test]
    async fn test_extractor_reports_recorded_failure() {
        let gate = JwtGate::builder(OnlyAdmins)
            .secret("extractor-secret")
            .realm("inner")
            .build()
            .unwrap();
        let mut parts = parts();
        parts
            .extensions
            .insert(gate.failure(AuthError::TokenExpired));

        let response = Authenticated::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "JWT realm=\"inner\""
        );

        let MaybeAuthenticated(context) = MaybeAuthenticated::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(context.is_none());
    }

    #[tokio::test]
    async fn test_extractor_without_middleware() {
        let mut parts = parts();
        let response = Authenticated::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
