//! Token lookup specification and the locator that walks it.

use std::fmt;
use std::str::FromStr;

use super::surface::RequestSurface;
use crate::error::{AuthError, ConfigError};

/// Default lookup: the `Authorization` header.
pub const DEFAULT_TOKEN_LOOKUP: &str = "header:Authorization";

/// A request surface a token can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Query,
    Cookie,
    Param,
    Form,
}

impl FromStr for TokenSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(Self::Header),
            "query" => Ok(Self::Query),
            "cookie" => Ok(Self::Cookie),
            "param" => Ok(Self::Param),
            "form" => Ok(Self::Form),
            other => Err(ConfigError::InvalidTokenLookup(format!(
                "unknown source '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Query => "query",
            Self::Cookie => "cookie",
            Self::Param => "param",
            Self::Form => "form",
        };
        f.write_str(name)
    }
}

/// Ordered list of `source:name` entries, e.g. `header:Authorization,cookie:jwt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLookup {
    entries: Vec<(TokenSource, String)>,
}

impl TokenLookup {
    /// Parse a comma-separated lookup specification.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        if spec.trim().is_empty() {
            return Err(ConfigError::InvalidTokenLookup(
                "lookup specification is empty".into(),
            ));
        }

        let entries = spec
            .split(',')
            .map(|entry| {
                let (source, name) = entry.trim().split_once(':').ok_or_else(|| {
                    ConfigError::InvalidTokenLookup(format!("entry '{}' has no ':'", entry.trim()))
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::InvalidTokenLookup(format!(
                        "entry '{}' has no name",
                        entry.trim()
                    )));
                }
                Ok((source.trim().parse()?, name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(TokenSource, String)] {
        &self.entries
    }

    /// Whether any entry reads from `source`.
    pub fn uses(&self, source: TokenSource) -> bool {
        self.entries.iter().any(|(s, _)| *s == source)
    }

    /// Extract a token, trying entries in order.
    ///
    /// Stops at the first non-empty token. When nothing yields a token the
    /// error of the last failing entry is returned.
    pub fn locate<R: RequestSurface + ?Sized>(
        &self,
        surface: &R,
        header_prefix: &str,
    ) -> Result<String, AuthError> {
        let mut last_err = None;

        for (source, name) in &self.entries {
            let attempt = match source {
                TokenSource::Header => from_header(surface, name, header_prefix),
                TokenSource::Query => non_empty(surface.query(name), AuthError::EmptyQueryToken),
                TokenSource::Cookie => {
                    non_empty(surface.cookie(name), AuthError::EmptyCookieToken)
                }
                TokenSource::Param => non_empty(surface.param(name), AuthError::EmptyParamToken),
                TokenSource::Form => non_empty(surface.form(name), AuthError::EmptyFormToken),
            };

            match attempt {
                Ok(token) if !token.is_empty() => return Ok(token),
                Ok(_) => {}
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or(AuthError::TokenNotFound))
    }
}

impl Default for TokenLookup {
    fn default() -> Self {
        Self {
            entries: vec![(TokenSource::Header, "Authorization".to_string())],
        }
    }
}

fn non_empty(value: Option<&str>, err: AuthError) -> Result<String, AuthError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(err),
    }
}

fn from_header<R: RequestSurface + ?Sized>(
    surface: &R,
    name: &str,
    prefix: &str,
) -> Result<String, AuthError> {
    let value = match surface.header(name) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AuthError::EmptyAuthHeader),
    };

    match value.split_once(' ') {
        Some((head, token)) if head == prefix => Ok(token.to_string()),
        None if prefix.is_empty() => Ok(value.to_string()),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::surface::HttpSurface;
    use axum::http::{HeaderValue, header};

    fn surface_with_header(value: &'static str) -> HttpSurface {
        let mut surface = HttpSurface::default();
        surface
            .headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        surface
    }

    #[test]
    fn test_parse_lookup() {
        let lookup = TokenLookup::parse("header: Authorization, query:token,cookie:jwt").unwrap();
        assert_eq!(
            lookup.entries(),
            &[
                (TokenSource::Header, "Authorization".to_string()),
                (TokenSource::Query, "token".to_string()),
                (TokenSource::Cookie, "jwt".to_string()),
            ]
        );
        assert!(lookup.uses(TokenSource::Cookie));
        assert!(!lookup.uses(TokenSource::Form));
    }

    #[test]
    fn test_parse_rejects_bad_specs() {
        assert!(TokenLookup::parse("").is_err());
        assert!(TokenLookup::parse("   ").is_err());
        assert!(TokenLookup::parse("header").is_err());
        assert!(TokenLookup::parse("header:Authorization,cookie").is_err());
        assert!(TokenLookup::parse("body:token").is_err());
        assert!(TokenLookup::parse("query:").is_err());
    }

    #[test]
    fn test_default_matches_constant() {
        assert_eq!(
            TokenLookup::default(),
            TokenLookup::parse(DEFAULT_TOKEN_LOOKUP).unwrap()
        );
    }

    #[test]
    fn test_header_with_prefix() {
        let lookup = TokenLookup::default();
        let surface = surface_with_header("Bearer abc.def.ghi");
        assert_eq!(lookup.locate(&surface, "Bearer").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_header_prefix_is_case_sensitive() {
        let lookup = TokenLookup::default();
        let surface = surface_with_header("bearer abc.def.ghi");
        assert_eq!(
            lookup.locate(&surface, "Bearer"),
            Err(AuthError::InvalidAuthHeader)
        );
    }

    #[test]
    fn test_header_without_prefix_configured() {
        let lookup = TokenLookup::default();
        let surface = surface_with_header("abc.def.ghi");
        assert_eq!(lookup.locate(&surface, "").unwrap(), "abc.def.ghi");
        assert_eq!(
            lookup.locate(&surface, "Bearer"),
            Err(AuthError::InvalidAuthHeader)
        );
    }

    #[test]
    fn test_missing_header() {
        let lookup = TokenLookup::default();
        assert_eq!(
            lookup.locate(&HttpSurface::default(), "Bearer"),
            Err(AuthError::EmptyAuthHeader)
        );
    }

    #[test]
    fn test_first_success_wins() {
        let lookup = TokenLookup::parse("header:Authorization,query:token").unwrap();
        let surface = surface_with_header("Bearer from-header").with_query("token=from-query");
        assert_eq!(lookup.locate(&surface, "Bearer").unwrap(), "from-header");
    }

    #[test]
    fn test_later_success_supersedes_earlier_error() {
        let lookup = TokenLookup::parse("header:Authorization,query:token").unwrap();
        let surface = surface_with_header("Basic xyz").with_query("token=from-query");
        assert_eq!(lookup.locate(&surface, "Bearer").unwrap(), "from-query");
    }

    #[test]
    fn test_last_error_is_reported() {
        let lookup = TokenLookup::parse("header:Authorization,query:token,cookie:jwt").unwrap();
        let surface = surface_with_header("Basic xyz").with_query("token=");
        assert_eq!(
            lookup.locate(&surface, "Bearer"),
            Err(AuthError::EmptyCookieToken)
        );
    }

    #[test]
    fn test_cookie_param_and_form_sources() {
        let lookup = TokenLookup::parse("param:token,form:token,cookie:jwt").unwrap();

        let mut surface = HttpSurface::default();
        surface
            .headers_mut()
            .insert(header::COOKIE, HeaderValue::from_static("jwt=from-cookie"));
        assert_eq!(lookup.locate(&surface, "Bearer").unwrap(), "from-cookie");

        let surface = HttpSurface::default().with_form_body(b"token=from-form&other=1");
        assert_eq!(lookup.locate(&surface, "Bearer").unwrap(), "from-form");

        let surface =
            HttpSurface::default().with_params([("token".to_string(), "from-path".to_string())]);
        assert_eq!(lookup.locate(&surface, "Bearer").unwrap(), "from-path");
    }
}
