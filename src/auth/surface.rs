//! Read-only views of the places a request can carry a token.

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request},
    http::{HeaderMap, header, request::Parts},
};

use super::cookie::get_cookie;
use super::lookup::{TokenLookup, TokenSource};
use crate::error::AuthError;

/// Largest urlencoded body buffered when looking for a form token.
pub const FORM_BODY_LIMIT: usize = 64 * 1024;

/// Accessors for each surface a token lookup entry can name.
///
/// [`HttpSurface`] reads cookies from every `Cookie` header. Form fields come
/// only from `application/x-www-form-urlencoded` bodies; multipart bodies are
/// not parsed and never yield a form token.
pub trait RequestSurface {
    fn header(&self, name: &str) -> Option<&str>;
    fn query(&self, name: &str) -> Option<&str>;
    fn cookie(&self, name: &str) -> Option<&str>;
    fn param(&self, name: &str) -> Option<&str>;
    fn form(&self, name: &str) -> Option<&str>;
}

/// Owned snapshot of an HTTP request's token-bearing surfaces.
#[derive(Debug, Clone, Default)]
pub struct HttpSurface {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    params: Vec<(String, String)>,
    form: Vec<(String, String)>,
}

impl HttpSurface {
    /// Capture headers and the query string from request parts.
    pub fn from_parts(parts: &Parts) -> Self {
        let surface = Self {
            headers: parts.headers.clone(),
            ..Self::default()
        };
        match parts.uri.query() {
            Some(query) => surface.with_query(query),
            None => surface,
        }
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = parse_urlencoded(query.as_bytes());
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    pub fn with_form_body(mut self, body: &[u8]) -> Self {
        self.form = parse_urlencoded(body);
        self
    }

    /// Snapshot the surfaces `lookup` needs, handing the request back intact.
    ///
    /// Path parameters are only read when the lookup names `param`, and the
    /// body is only buffered for a urlencoded request when it names `form`.
    /// A body that cannot be buffered fails the request: it has been consumed
    /// and cannot be passed on.
    pub async fn capture(
        request: Request,
        lookup: &TokenLookup,
    ) -> Result<(Request, Self), AuthError> {
        let (mut parts, body) = request.into_parts();
        let mut surface = Self::from_parts(&parts);

        if lookup.uses(TokenSource::Param) {
            if let Ok(params) = RawPathParams::from_request_parts(&mut parts, &()).await {
                surface.params = params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
            }
        }

        let body = if lookup.uses(TokenSource::Form) && is_urlencoded(&parts.headers) {
            let bytes = axum::body::to_bytes(body, FORM_BODY_LIMIT)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, limit = FORM_BODY_LIMIT, "Failed to buffer form body");
                    AuthError::UnreadableFormBody
                })?;
            surface.form = parse_urlencoded(&bytes);
            Body::from(bytes)
        } else {
            body
        };

        Ok((Request::from_parts(parts, body), surface))
    }
}

impl RequestSurface for HttpSurface {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    fn query(&self, name: &str) -> Option<&str> {
        lookup_pair(&self.query, name)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        get_cookie(&self.headers, name)
    }

    fn param(&self, name: &str) -> Option<&str> {
        lookup_pair(&self.params, name)
    }

    fn form(&self, name: &str) -> Option<&str> {
        lookup_pair(&self.form, name)
    }
}

fn lookup_pair<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn parse_urlencoded(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input).into_owned().collect()
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}
