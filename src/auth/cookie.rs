//! Cookie parsing and token cookie construction.

use std::fmt;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header};

/// Default name of the token cookie.
pub const DEFAULT_COOKIE_NAME: &str = "jwt";

/// `SameSite` attribute of the token cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        })
    }
}

/// How the issued token is mirrored into a response cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Set the cookie on login and refresh, clear it on logout.
    pub send: bool,
    pub name: String,
    pub domain: Option<String>,
    pub max_age: Duration,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieSettings {
    /// `Set-Cookie` value carrying `token`.
    pub fn token_cookie(&self, token: &str) -> String {
        self.render(token, self.max_age.as_secs())
    }

    /// `Set-Cookie` value that removes the token cookie.
    pub fn clear_cookie(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!("{}={}; Path=/; Max-Age={}", self.name, value, max_age);
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            cookie.push_str(&format!("; SameSite={}", same_site));
        }
        cookie
    }

    /// Append `cookie` as a `Set-Cookie` header, dropping values that are not
    /// valid header text.
    pub fn append_to(headers: &mut HeaderMap, cookie: &str) {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Refusing to set malformed cookie"),
        }
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_header| cookie_header.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}
