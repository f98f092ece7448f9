//! Error types for configuration and per-request authentication.

use axum::http::StatusCode;

/// Errors raised while resolving a gate configuration.
///
/// These are fatal at startup: a service should refuse to start rather than
/// serve requests with a broken key setup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("secret key is required")]
    MissingSecretKey,
    #[error("realm is required")]
    MissingRealm,
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid token lookup: {0}")]
    InvalidTokenLookup(String),
    #[error("private key is required for {0:?}")]
    NoPrivateKey(jsonwebtoken::Algorithm),
    #[error("public key is required for {0:?}")]
    NoPublicKey(jsonwebtoken::Algorithm),
    #[error("failed to read key file {path}: {source}")]
    KeyFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("private key is invalid: {0}")]
    InvalidPrivateKey(jsonwebtoken::errors::Error),
    #[error("public key is invalid: {0}")]
    InvalidPublicKey(jsonwebtoken::errors::Error),
}

/// Coarse classification of [`AuthError`], one entry per terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    TokenMissing,
    TokenMalformed,
    TokenExpired,
    RefreshWindowExceeded,
    AuthorizationDenied,
    AuthenticationFailed,
    /// The request body could not be buffered.
    BodyRejected,
    Internal,
}

/// Per-request authentication errors.
///
/// None of these escape to the host router: the middleware and handlers turn
/// every variant into a response through the configured responder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("auth header is empty")]
    EmptyAuthHeader,
    #[error("auth header is invalid")]
    InvalidAuthHeader,
    #[error("query token is empty")]
    EmptyQueryToken,
    #[error("cookie token is empty")]
    EmptyCookieToken,
    #[error("parameter token is empty")]
    EmptyParamToken,
    #[error("form token is empty")]
    EmptyFormToken,
    #[error("token is missing")]
    TokenNotFound,
    #[error("invalid signing algorithm")]
    InvalidSigningAlgorithm,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed: {0}")]
    MalformedToken(String),
    #[error("missing exp field")]
    MissingExpField,
    #[error("exp must be a numeric timestamp")]
    WrongFormatOfExp,
    #[error("missing orig_iat field")]
    MissingOrigIat,
    #[error("token is expired")]
    TokenExpired,
    #[error("token is outside its refresh window")]
    RefreshWindowExceeded,
    #[error("you don't have permission to access this resource")]
    Forbidden,
    #[error("missing username or password")]
    MissingLoginValues,
    #[error("incorrect username or password")]
    FailedAuthentication,
    #[error("form body is too large or unreadable")]
    UnreadableFormBody,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::EmptyAuthHeader
            | Self::InvalidAuthHeader
            | Self::EmptyQueryToken
            | Self::EmptyCookieToken
            | Self::EmptyParamToken
            | Self::EmptyFormToken
            | Self::TokenNotFound => AuthErrorKind::TokenMissing,
            Self::InvalidSigningAlgorithm
            | Self::InvalidSignature
            | Self::MalformedToken(_)
            | Self::MissingExpField
            | Self::WrongFormatOfExp
            | Self::MissingOrigIat => AuthErrorKind::TokenMalformed,
            Self::TokenExpired => AuthErrorKind::TokenExpired,
            Self::RefreshWindowExceeded => AuthErrorKind::RefreshWindowExceeded,
            Self::Forbidden => AuthErrorKind::AuthorizationDenied,
            Self::MissingLoginValues | Self::FailedAuthentication => {
                AuthErrorKind::AuthenticationFailed
            }
            Self::UnreadableFormBody => AuthErrorKind::BodyRejected,
            Self::Signing(_) => AuthErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            AuthErrorKind::AuthorizationDenied => StatusCode::FORBIDDEN,
            AuthErrorKind::BodyRejected => StatusCode::PAYLOAD_TOO_LARGE,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::InvalidSigningAlgorithm
            }
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::MalformedToken(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failures_are_token_missing() {
        for err in [
            AuthError::EmptyAuthHeader,
            AuthError::InvalidAuthHeader,
            AuthError::EmptyCookieToken,
            AuthError::EmptyFormToken,
        ] {
            assert_eq!(err.kind(), AuthErrorKind::TokenMissing);
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Forbidden.kind(),
            AuthErrorKind::AuthorizationDenied
        );
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err = AuthError::Signing("boom".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_algorithm_mismatch_is_malformed() {
        assert_eq!(
            AuthError::InvalidSigningAlgorithm.kind(),
            AuthErrorKind::TokenMalformed
        );
    }

    #[test]
    fn test_unreadable_form_body_is_413() {
        let err = AuthError::UnreadableFormBody;
        assert_eq!(err.kind(), AuthErrorKind::BodyRejected);
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
