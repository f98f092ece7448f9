//! Token refresh: window check and reissue.
//!
//! A token may be exchanged while `now - orig_iat <= max_refresh`, even after
//! its `exp` has passed. In [`RefreshMode::Sliding`] every refresh resets
//! `orig_iat`, so a client refreshing often enough stays signed in
//! indefinitely. [`RefreshMode::Fixed`] carries the first `orig_iat` forward
//! and caps the session at `max_refresh` from login.

use crate::claims::{Claims, ORIG_IAT, Timestamp};
use crate::config::GateConfig;
use crate::error::AuthError;
use crate::jwt::{self, IssuedToken};

/// How `orig_iat` evolves across refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Reset `orig_iat` to the refresh time.
    #[default]
    Sliding,
    /// Keep the `orig_iat` of the original login.
    Fixed,
}

/// Verify `token` for refresh and return its claims.
///
/// Signature and algorithm are checked as for normal verification and the
/// expiry claim must be well formed, but an elapsed expiry is tolerated.
pub fn check_refresh_window(config: &GateConfig, token: &str) -> Result<Claims, AuthError> {
    let claims = jwt::decode_claims(config, token)?;
    jwt::expiry(config, &claims)?;

    let orig_iat = match claims.timestamp(ORIG_IAT) {
        Timestamp::At(t) => t,
        Timestamp::Missing | Timestamp::NotNumeric => return Err(AuthError::MissingOrigIat),
    };

    let elapsed = config.now().saturating_sub(orig_iat);
    if elapsed > jwt::clamp_secs(config.max_refresh.as_secs()) {
        tracing::debug!(
            elapsed_secs = elapsed,
            max_refresh_secs = config.max_refresh.as_secs(),
            "Refresh window exceeded"
        );
        return Err(AuthError::RefreshWindowExceeded);
    }

    Ok(claims)
}

/// Re-sign previously verified claims with a new expiry.
pub fn reissue(
    config: &GateConfig,
    mut claims: Claims,
    lifetime_secs: u64,
) -> Result<IssuedToken, AuthError> {
    let now = config.now();
    let expires_at = now.saturating_add(jwt::clamp_secs(lifetime_secs));

    claims.insert(config.exp_field.clone(), expires_at);
    if config.refresh_mode == RefreshMode::Sliding {
        claims.insert(ORIG_IAT, now);
    }

    let token = jwt::sign(config, &claims)?;
    Ok(IssuedToken { token, expires_at })
}
