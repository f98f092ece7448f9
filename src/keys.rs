//! Signing key material: loading, parsing and the active key strategy.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};

use crate::error::{AuthError, ConfigError};

/// Key family an algorithm signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    pub fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
            Algorithm::ES256 | Algorithm::ES384 => Self::Ec,
            Algorithm::EdDSA => Self::Ed,
            // RS256..RS512 and PS256..PS512
            _ => Self::Rsa,
        }
    }

    /// Whether keys of this family come as a private/public pair.
    pub fn is_asymmetric(self) -> bool {
        self != Self::Hmac
    }
}

/// Where key bytes come from. A file path wins over inline bytes.
#[derive(Debug, Clone, Default)]
pub struct KeySource {
    path: Option<PathBuf>,
    bytes: Option<Vec<u8>>,
}

impl KeySource {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            bytes: None,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: None,
            bytes: Some(bytes.into()),
        }
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn set_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
        self.bytes = Some(bytes.into());
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.bytes.as_ref().is_none_or(|b| b.is_empty())
    }

    /// Read the key bytes, preferring the file when one is configured.
    /// Returns `Ok(None)` when neither a path nor bytes are set.
    pub fn load(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        if let Some(path) = &self.path {
            let bytes = std::fs::read(path).map_err(|source| ConfigError::KeyFileRead {
                path: path.display().to_string(),
                source,
            })?;
            return Ok(Some(bytes));
        }
        Ok(self.bytes.clone().filter(|b| !b.is_empty()))
    }
}

/// A parsed asymmetric key pair.
#[derive(Clone)]
pub struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    /// Parse PEM-encoded private and public keys for the given algorithm.
    pub fn from_pem(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, ConfigError> {
        let (encoding, decoding) = match KeyFamily::of(algorithm) {
            KeyFamily::Rsa => (
                EncodingKey::from_rsa_pem(private_pem),
                DecodingKey::from_rsa_pem(public_pem),
            ),
            KeyFamily::Ec => (
                EncodingKey::from_ec_pem(private_pem),
                DecodingKey::from_ec_pem(public_pem),
            ),
            KeyFamily::Ed => (
                EncodingKey::from_ed_pem(private_pem),
                DecodingKey::from_ed_pem(public_pem),
            ),
            KeyFamily::Hmac => {
                return Err(ConfigError::UnsupportedAlgorithm(format!(
                    "{:?} is not an asymmetric algorithm",
                    algorithm
                )));
            }
        };

        Ok(Self {
            encoding: encoding.map_err(ConfigError::InvalidPrivateKey)?,
            decoding: decoding.map_err(ConfigError::InvalidPublicKey)?,
        })
    }

    /// Load both halves from their sources and parse them.
    pub fn load(
        algorithm: Algorithm,
        private: &KeySource,
        public: &KeySource,
    ) -> Result<Self, ConfigError> {
        let private_pem = private
            .load()?
            .ok_or(ConfigError::NoPrivateKey(algorithm))?;
        let public_pem = public.load()?.ok_or(ConfigError::NoPublicKey(algorithm))?;
        Self::from_pem(algorithm, &private_pem, &public_pem)
    }
}

/// Caller-supplied key resolution. When configured it replaces every other
/// key setting and no key validation happens at startup.
pub trait KeyResolver: Send + Sync {
    /// Key used to sign newly issued tokens.
    fn signing_key(&self, algorithm: Algorithm) -> Result<EncodingKey, AuthError>;

    /// Key used to verify a presented token, chosen from its header.
    fn verification_key(&self, header: &Header) -> Result<DecodingKey, AuthError>;
}

/// The single active signing mode of a gate.
#[derive(Clone)]
pub enum KeyStrategy {
    Symmetric {
        encoding: EncodingKey,
        decoding: DecodingKey,
    },
    Asymmetric(KeyPair),
    Custom(Arc<dyn KeyResolver>),
}

impl KeyStrategy {
    pub fn symmetric(secret: &[u8]) -> Self {
        Self::Symmetric {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub(crate) fn encoding_key(
        &self,
        algorithm: Algorithm,
    ) -> Result<Cow<'_, EncodingKey>, AuthError> {
        match self {
            Self::Symmetric { encoding, .. } => Ok(Cow::Borrowed(encoding)),
            Self::Asymmetric(pair) => Ok(Cow::Borrowed(&pair.encoding)),
            Self::Custom(resolver) => resolver.signing_key(algorithm).map(Cow::Owned),
        }
    }

    pub(crate) fn decoding_key(&self, header: &Header) -> Result<Cow<'_, DecodingKey>, AuthError> {
        match self {
            Self::Symmetric { decoding, .. } => Ok(Cow::Borrowed(decoding)),
            Self::Asymmetric(pair) => Ok(Cow::Borrowed(&pair.decoding)),
            Self::Custom(resolver) => resolver.verification_key(header).map(Cow::Owned),
        }
    }
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Symmetric { .. } => "Symmetric",
            Self::Asymmetric(_) => "Asymmetric",
            Self::Custom(_) => "Custom",
        };
        f.debug_tuple(name).field(&"[REDACTED]").finish()
    }
}
