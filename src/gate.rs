//! The shared authentication gate: resolved config, policy and responder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;

use crate::auth::{
    AuthFailure, AuthPolicy, CookieSettings, JsonResponder, Responder, SameSite, reject_with,
};
use crate::claims::Claims;
use crate::config::{Clock, GateConfig, GateOptions};
use crate::error::{AuthError, ConfigError};
use crate::jwt::{self, IssuedToken};
use crate::keys::KeyResolver;
use crate::refresh::{self, RefreshMode};

/// Everything the middleware and handlers need, built once at startup and
/// shared as `Arc<JwtGate<P>>`.
pub struct JwtGate<P> {
    config: GateConfig,
    policy: P,
    responder: Arc<dyn Responder>,
}

impl<P: AuthPolicy> JwtGate<P> {
    pub fn builder(policy: P) -> GateBuilder<P> {
        GateBuilder {
            policy,
            options: GateOptions::default(),
            responder: Arc::new(JsonResponder),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn responder(&self) -> &dyn Responder {
        self.responder.as_ref()
    }

    /// Issue a token for a logged-in subject.
    pub fn issue(&self, subject: &P::Subject) -> Result<IssuedToken, AuthError> {
        self.issue_claims(self.policy.payload(subject))
    }

    /// Issue a token for prebuilt claims. `exp` and `orig_iat` are overwritten.
    pub fn issue_claims(&self, claims: Claims) -> Result<IssuedToken, AuthError> {
        let now = self.config.now();
        let lifetime = self.policy.token_lifetime(&claims, self.config.timeout);
        jwt::issue(&self.config, claims, lifetime.as_secs(), now)
    }

    /// Verify a raw token, including expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        jwt::verify(&self.config, token)
    }

    /// Exchange a token that is still inside its refresh window for a new one.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AuthError> {
        let claims = refresh::check_refresh_window(&self.config, token)?;
        let lifetime = self.policy.token_lifetime(&claims, self.config.timeout);
        refresh::reissue(&self.config, claims, lifetime.as_secs())
    }

    /// Answer a failed request through the responder.
    pub fn reject(&self, err: &AuthError) -> Response {
        reject_with(self.responder.as_ref(), &self.config.realm, err)
    }

    /// Record a failure for handlers to answer later, as [`JwtGate::reject`] would.
    pub(crate) fn failure(&self, err: AuthError) -> AuthFailure {
        AuthFailure::new(err, self.responder.clone(), self.config.realm.clone())
    }

    /// Mirror `token` into the response cookie when cookies are enabled.
    pub(crate) fn persist_cookie(&self, response: &mut Response, token: &str) {
        let cookie = &self.config.cookie;
        if cookie.send {
            CookieSettings::append_to(response.headers_mut(), &cookie.token_cookie(token));
        }
    }
}

/// Collects options in call order; later calls win.
pub struct GateBuilder<P> {
    policy: P,
    options: GateOptions,
    responder: Arc<dyn Responder>,
}

impl<P: AuthPolicy> GateBuilder<P> {
    /// Apply an arbitrary option function.
    pub fn with(mut self, option: impl FnOnce(&mut GateOptions)) -> Self {
        option(&mut self.options);
        self
    }

    pub fn realm(self, realm: impl Into<String>) -> Self {
        let realm = realm.into();
        self.with(|o| o.realm = Some(realm))
    }

    pub fn algorithm(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(|o| o.algorithm = Some(name))
    }

    pub fn secret(self, secret: impl Into<Vec<u8>>) -> Self {
        let secret = secret.into();
        self.with(|o| o.secret = Some(secret))
    }

    pub fn private_key_file(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.with(|o| o.private_key.set_path(path))
    }

    pub fn private_key_bytes(self, pem: impl Into<Vec<u8>>) -> Self {
        let pem = pem.into();
        self.with(|o| o.private_key.set_bytes(pem))
    }

    pub fn public_key_file(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.with(|o| o.public_key.set_path(path))
    }

    pub fn public_key_bytes(self, pem: impl Into<Vec<u8>>) -> Self {
        let pem = pem.into();
        self.with(|o| o.public_key.set_bytes(pem))
    }

    pub fn key_resolver(self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.with(|o| o.key_resolver = Some(resolver))
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.with(|o| o.timeout = Some(timeout))
    }

    pub fn max_refresh(self, max_refresh: Duration) -> Self {
        self.with(|o| o.max_refresh = Some(max_refresh))
    }

    pub fn refresh_mode(self, mode: RefreshMode) -> Self {
        self.with(|o| o.refresh_mode = mode)
    }

    pub fn identity_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.with(|o| o.identity_key = Some(key))
    }

    pub fn token_lookup(self, spec: impl Into<String>) -> Self {
        let spec = spec.into();
        self.with(|o| o.token_lookup = Some(spec))
    }

    pub fn header_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.with(|o| o.header_prefix = Some(prefix))
    }

    pub fn exp_field(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.with(|o| o.exp_field = Some(field))
    }

    pub fn send_cookie(self, send: bool) -> Self {
        self.with(|o| o.send_cookie = send)
    }

    pub fn cookie_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(|o| o.cookie_name = Some(name))
    }

    pub fn cookie_domain(self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.with(|o| o.cookie_domain = Some(domain))
    }

    pub fn cookie_max_age(self, max_age: Duration) -> Self {
        self.with(|o| o.cookie_max_age = Some(max_age))
    }

    pub fn secure_cookie(self, secure: bool) -> Self {
        self.with(|o| o.secure_cookie = secure)
    }

    pub fn cookie_http_only(self, http_only: bool) -> Self {
        self.with(|o| o.cookie_http_only = http_only)
    }

    pub fn cookie_same_site(self, same_site: SameSite) -> Self {
        self.with(|o| o.cookie_same_site = Some(same_site))
    }

    pub fn send_authorization(self, send: bool) -> Self {
        self.with(|o| o.send_authorization = send)
    }

    pub fn disable_abort(self, disable: bool) -> Self {
        self.with(|o| o.disable_abort = disable)
    }

    pub fn clock(self, clock: Clock) -> Self {
        self.with(|o| o.clock = Some(clock))
    }

    pub fn responder(mut self, responder: impl Responder + 'static) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// Resolve and validate. Fails on any key or lookup misconfiguration.
    pub fn build(self) -> Result<JwtGate<P>, ConfigError> {
        Ok(JwtGate {
            config: self.options.resolve()?,
            policy: self.policy,
            responder: self.responder,
        })
    }
}
