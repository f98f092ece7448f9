//! JWT signing and verification against a resolved gate configuration.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Header, Validation};

use crate::claims::{Claims, ORIG_IAT, Timestamp};
use crate::config::GateConfig;
use crate::error::AuthError;

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The compact JWS string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: i64,
}

impl IssuedToken {
    pub fn expires_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.expires_at, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Stamp `exp` and `orig_iat` onto `claims` and sign them.
pub fn issue(
    config: &GateConfig,
    mut claims: Claims,
    lifetime_secs: u64,
    now: i64,
) -> Result<IssuedToken, AuthError> {
    let expires_at = now.saturating_add(clamp_secs(lifetime_secs));
    claims.insert(config.exp_field.clone(), expires_at);
    claims.insert(ORIG_IAT, now);

    let token = sign(config, &claims)?;
    Ok(IssuedToken { token, expires_at })
}

/// Seconds as a signed timestamp offset, saturating at `i64::MAX`.
pub(crate) fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Sign `claims` as-is with the configured algorithm and key.
pub fn sign(config: &GateConfig, claims: &Claims) -> Result<String, AuthError> {
    let key = config.keys.encoding_key(config.algorithm)?;
    jsonwebtoken::encode(&Header::new(config.algorithm), claims, &key).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign token");
        AuthError::Signing(e.to_string())
    })
}

/// Verify a token's algorithm and signature and return its claims.
/// Expiry is not checked here.
pub(crate) fn decode_claims(config: &GateConfig, token: &str) -> Result<Claims, AuthError> {
    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    // Reject before touching the key so a token can never pick its own algorithm.
    if header.alg != config.algorithm {
        tracing::debug!(
            expected = ?config.algorithm,
            presented = ?header.alg,
            "Token algorithm mismatch"
        );
        return Err(AuthError::InvalidSigningAlgorithm);
    }

    let key = config.keys.decoding_key(&header)?;

    let mut validation = Validation::new(config.algorithm);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(token, &key, &validation)?;
    Ok(data.claims)
}

/// Read the expiry claim, rejecting tokens where it is absent or not a number.
pub(crate) fn expiry(config: &GateConfig, claims: &Claims) -> Result<i64, AuthError> {
    match claims.timestamp(&config.exp_field) {
        Timestamp::At(exp) => Ok(exp),
        Timestamp::Missing => Err(AuthError::MissingExpField),
        Timestamp::NotNumeric => Err(AuthError::WrongFormatOfExp),
    }
}

/// Full verification: algorithm, signature, expiry field and expiry time.
pub fn verify(config: &GateConfig, token: &str) -> Result<Claims, AuthError> {
    let claims = decode_claims(config, token)?;
    let exp = expiry(config, &claims)?;
    if config.now() > exp {
        return Err(AuthError::TokenExpired);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateOptions;
    use serde_json::json;
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000;

    fn config_at(now: i64, secret: &[u8]) -> GateConfig {
        GateOptions {
            secret: Some(secret.to_vec()),
            clock: Some(Arc::new(move || now)),
            ..GateOptions::default()
        }
        .resolve()
        .unwrap()
    }

    fn sign_raw(claims: serde_json::Value, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let config = config_at(NOW, b"test-secret-key-for-testing");
        let mut claims = Claims::new();
        claims.insert("identity", "alice");

        let issued = issue(&config, claims, 3600, NOW).unwrap();
        assert_eq!(issued.expires_at, NOW + 3600);

        let verified = verify(&config, &issued.token).unwrap();
        assert_eq!(verified.get("identity"), Some(&json!("alice")));
        assert_eq!(verified.get("exp"), Some(&json!(NOW + 3600)));
        assert_eq!(verified.get("orig_iat"), Some(&json!(NOW)));
    }

    #[test]
    fn test_invalid_token() {
        let config = config_at(NOW, b"secret");
        assert!(matches!(
            verify(&config, "invalid-token"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = config_at(NOW, b"secret-1");
        let verifier = config_at(NOW, b"secret-2");

        let issued = issue(&issuer, Claims::new(), 60, NOW).unwrap();
        assert_eq!(
            verify(&verifier, &issued.token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token() {
        let secret = b"test-secret";
        let token = sign_raw(json!({ "exp": NOW - 50, "orig_iat": NOW - 100 }), secret);

        let config = config_at(NOW, secret);
        assert_eq!(verify(&config, &token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_exp_equal_to_now_is_accepted() {
        let secret = b"test-secret";
        let token = sign_raw(json!({ "exp": NOW, "orig_iat": NOW }), secret);
        assert!(verify(&config_at(NOW, secret), &token).is_ok());
    }

    #[test]
    fn test_missing_exp() {
        let secret = b"test-secret";
        let token = sign_raw(json!({ "orig_iat": NOW }), secret);
        assert_eq!(
            verify(&config_at(NOW, secret), &token),
            Err(AuthError::MissingExpField)
        );
    }

    #[test]
    fn test_non_numeric_exp() {
        let secret = b"test-secret";
        let token = sign_raw(json!({ "exp": "soon" }), secret);
        assert_eq!(
            verify(&config_at(NOW, secret), &token),
            Err(AuthError::WrongFormatOfExp)
        );
    }

    #[test]
    fn test_custom_exp_field() {
        let config = GateOptions {
            secret: Some(b"secret".to_vec()),
            exp_field: Some("expires".into()),
            clock: Some(Arc::new(|| NOW)),
            ..GateOptions::default()
        }
        .resolve()
        .unwrap();

        let issued = issue(&config, Claims::new(), 10, NOW).unwrap();
        let claims = verify(&config, &issued.token).unwrap();
        assert_eq!(claims.get("expires"), Some(&json!(NOW + 10)));
        assert!(!claims.contains_key("exp"));
    }

    #[test]
    fn test_expires_at_utc() {
        let issued = IssuedToken {
            token: String::new(),
            expires_at: 0,
        };
        assert_eq!(issued.expires_at_utc().timestamp(), 0);
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let config = config_at(NOW, b"test-secret");
        let issued = issue(&config, Claims::new(), u64::MAX, NOW).unwrap();
        assert_eq!(issued.expires_at, i64::MAX);
        assert!(verify(&config, &issued.token).is_ok());
        assert_eq!(issued.expires_at_utc(), DateTime::<Utc>::MAX_UTC);
    }
}
