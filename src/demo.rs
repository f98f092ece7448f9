//! Demo policy used by the bundled server binary.
//!
//! Two fixed accounts: `admin`/`admin` and `test`/`test`. Both can log in, but
//! only `admin` passes authorization on protected routes.

use axum::http::request::Parts;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AuthPolicy, Identity, LoginAttempt};
use crate::claims::Claims;
use crate::config::DEFAULT_IDENTITY_KEY;
use crate::error::AuthError;

const USERS: &[(&str, &str)] = &[("admin", "admin"), ("test", "test")];

/// Login body: `{"username": "...", "password": "..."}`.
#[derive(Debug, Deserialize)]
pub struct LoginCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DemoPolicy {
    identity_key: String,
}

impl DemoPolicy {
    pub fn new(identity_key: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
        }
    }
}

impl Default for DemoPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_KEY)
    }
}

impl AuthPolicy for DemoPolicy {
    type Subject = String;

    fn authenticate(&self, attempt: &LoginAttempt<'_>) -> Result<String, AuthError> {
        let credentials: LoginCredentials = attempt.json()?;
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingLoginValues);
        }

        let known = USERS
            .iter()
            .any(|(user, pass)| *user == credentials.username && *pass == credentials.password);
        if !known {
            return Err(AuthError::FailedAuthentication);
        }

        Ok(credentials.username)
    }

    fn payload(&self, username: &String) -> Claims {
        let mut claims = Claims::new();
        claims.insert(self.identity_key.clone(), json!(username));
        claims
    }

    fn authorize(&self, identity: &Identity, _request: &Parts) -> bool {
        identity.as_str() == Some("admin")
    }
}
