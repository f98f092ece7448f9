//! Gate configuration: user options, defaults and startup validation.
//!
//! Options are collected in [`GateOptions`] (directly or through the
//! builder in [`crate::gate`]) and resolved once into an immutable
//! [`GateConfig`]. Every problem with key material surfaces here as a
//! [`ConfigError`], never on the request path.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::Algorithm;

use crate::auth::{CookieSettings, DEFAULT_COOKIE_NAME, SameSite, TokenLookup};
use crate::claims::DEFAULT_EXP_FIELD;
use crate::error::ConfigError;
use crate::keys::{KeyFamily, KeyPair, KeyResolver, KeySource, KeyStrategy};
use crate::refresh::RefreshMode;

pub const DEFAULT_REALM: &str = "token";
pub const DEFAULT_ALGORITHM: &str = "HS256";
pub const DEFAULT_HEADER_PREFIX: &str = "Bearer";
pub const DEFAULT_IDENTITY_KEY: &str = "identity";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Source of "now" in Unix seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock time in Unix seconds.
pub fn system_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// User-supplied settings. `None` means "use the default".
#[derive(Clone)]
pub struct GateOptions {
    pub realm: Option<String>,
    pub algorithm: Option<String>,
    pub secret: Option<Vec<u8>>,
    pub private_key: KeySource,
    pub public_key: KeySource,
    pub key_resolver: Option<Arc<dyn KeyResolver>>,
    pub timeout: Option<Duration>,
    pub max_refresh: Option<Duration>,
    pub refresh_mode: RefreshMode,
    pub identity_key: Option<String>,
    pub token_lookup: Option<String>,
    pub header_prefix: Option<String>,
    pub exp_field: Option<String>,
    pub send_cookie: bool,
    pub cookie_name: Option<String>,
    pub cookie_domain: Option<String>,
    pub cookie_max_age: Option<Duration>,
    pub secure_cookie: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: Option<SameSite>,
    pub send_authorization: bool,
    pub disable_abort: bool,
    pub clock: Option<Clock>,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            realm: None,
            algorithm: None,
            secret: None,
            private_key: KeySource::default(),
            public_key: KeySource::default(),
            key_resolver: None,
            timeout: None,
            max_refresh: None,
            refresh_mode: RefreshMode::Sliding,
            identity_key: None,
            token_lookup: None,
            header_prefix: None,
            exp_field: None,
            send_cookie: false,
            cookie_name: None,
            cookie_domain: None,
            cookie_max_age: None,
            secure_cookie: false,
            cookie_http_only: true,
            cookie_same_site: None,
            send_authorization: false,
            disable_abort: false,
            clock: None,
        }
    }
}

/// Fully resolved, validated configuration. Read-only once built.
pub struct GateConfig {
    pub realm: String,
    pub algorithm: Algorithm,
    pub keys: KeyStrategy,
    pub timeout: Duration,
    /// Longest time since `orig_iat` during which a token may be refreshed.
    pub max_refresh: Duration,
    pub refresh_mode: RefreshMode,
    pub identity_key: String,
    pub token_lookup: TokenLookup,
    pub header_prefix: String,
    pub exp_field: String,
    pub cookie: CookieSettings,
    /// Echo the token back in an `Authorization` response header.
    pub send_authorization: bool,
    /// Let unauthenticated requests through instead of answering them.
    pub disable_abort: bool,
    clock: Clock,
}

impl GateConfig {
    /// Current time in Unix seconds according to the configured clock.
    pub fn now(&self) -> i64 {
        (self.clock)()
    }
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("realm", &self.realm)
            .field("algorithm", &self.algorithm)
            .field("keys", &self.keys)
            .field("timeout", &self.timeout)
            .field("max_refresh", &self.max_refresh)
            .field("refresh_mode", &self.refresh_mode)
            .field("identity_key", &self.identity_key)
            .field("token_lookup", &self.token_lookup)
            .field("header_prefix", &self.header_prefix)
            .field("exp_field", &self.exp_field)
            .field("cookie", &self.cookie)
            .field("send_authorization", &self.send_authorization)
            .field("disable_abort", &self.disable_abort)
            .finish_non_exhaustive()
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl GateOptions {
    /// Apply defaults and validate.
    pub fn resolve(self) -> Result<GateConfig, ConfigError> {
        let realm = match self.realm {
            None => DEFAULT_REALM.to_string(),
            Some(realm) if realm.trim().is_empty() => return Err(ConfigError::MissingRealm),
            Some(realm) => realm,
        };

        let algorithm_name = non_empty_or(self.algorithm, DEFAULT_ALGORITHM);
        let algorithm = Algorithm::from_str(&algorithm_name)
            .map_err(|_| ConfigError::UnsupportedAlgorithm(algorithm_name.clone()))?;

        let token_lookup = match self.token_lookup.as_deref() {
            None => TokenLookup::default(),
            Some(spec) => TokenLookup::parse(spec)?,
        };

        let keys = resolve_keys(
            algorithm,
            self.key_resolver,
            self.secret,
            &self.private_key,
            &self.public_key,
        )?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let cookie = CookieSettings {
            send: self.send_cookie,
            name: non_empty_or(self.cookie_name, DEFAULT_COOKIE_NAME),
            domain: self.cookie_domain.filter(|d| !d.is_empty()),
            max_age: self.cookie_max_age.unwrap_or(timeout),
            secure: self.secure_cookie,
            http_only: self.cookie_http_only,
            same_site: self.cookie_same_site,
        };

        let config = GateConfig {
            realm,
            algorithm,
            keys,
            timeout,
            max_refresh: self.max_refresh.unwrap_or(Duration::ZERO),
            refresh_mode: self.refresh_mode,
            identity_key: non_empty_or(self.identity_key, DEFAULT_IDENTITY_KEY),
            token_lookup,
            header_prefix: self
                .header_prefix
                .map(|p| p.trim().to_string())
                .unwrap_or_else(|| DEFAULT_HEADER_PREFIX.to_string()),
            exp_field: non_empty_or(self.exp_field, DEFAULT_EXP_FIELD),
            cookie,
            send_authorization: self.send_authorization,
            disable_abort: self.disable_abort,
            clock: self.clock.unwrap_or_else(|| Arc::new(system_now) as Clock),
        };

        tracing::debug!(
            realm = %config.realm,
            algorithm = ?config.algorithm,
            keys = ?config.keys,
            timeout_secs = config.timeout.as_secs(),
            max_refresh_secs = config.max_refresh.as_secs(),
            "Gate configuration resolved"
        );

        Ok(config)
    }
}

fn resolve_keys(
    algorithm: Algorithm,
    resolver: Option<Arc<dyn KeyResolver>>,
    secret: Option<Vec<u8>>,
    private_key: &KeySource,
    public_key: &KeySource,
) -> Result<KeyStrategy, ConfigError> {
    if let Some(resolver) = resolver {
        return Ok(KeyStrategy::Custom(resolver));
    }

    if KeyFamily::of(algorithm).is_asymmetric() {
        return KeyPair::load(algorithm, private_key, public_key).map(KeyStrategy::Asymmetric);
    }

    match secret {
        Some(secret) if !secret.is_empty() => Ok(KeyStrategy::symmetric(&secret)),
        _ => Err(ConfigError::MissingSecretKey),
    }
}
