//! CLI argument parsing, validation, and startup helpers.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use jsonwebtoken::Algorithm;
use tracing::error;

use crate::auth::DEFAULT_TOKEN_LOOKUP;
use crate::config::{DEFAULT_ALGORITHM, DEFAULT_REALM};
use crate::demo::DemoPolicy;
use crate::error::ConfigError;
use crate::gate::JwtGate;
use crate::keys::KeyFamily;
use crate::refresh::RefreshMode;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tokengate", about = "JWT authentication gate for HTTP services")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Realm reported in WWW-Authenticate challenges
    #[arg(long, default_value = DEFAULT_REALM)]
    pub realm: String,

    /// Signing algorithm (HS256, RS256, ES256, EdDSA, ...)
    #[arg(long, env = "JWT_ALGORITHM", default_value = DEFAULT_ALGORITHM)]
    pub algorithm: String,

    /// Path to file containing the HMAC secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// PEM private key for asymmetric algorithms
    #[arg(long, env = "JWT_PRIVATE_KEY_FILE")]
    pub private_key_file: Option<PathBuf>,

    /// PEM public key for asymmetric algorithms
    #[arg(long, env = "JWT_PUBLIC_KEY_FILE")]
    pub public_key_file: Option<PathBuf>,

    /// Token lifetime in seconds
    #[arg(long, default_value = "3600")]
    pub timeout_secs: u64,

    /// How long after login a token may still be refreshed, in seconds
    #[arg(long, default_value = "3600")]
    pub max_refresh_secs: u64,

    /// Where to look for the token, e.g. "header:Authorization,cookie:jwt"
    #[arg(long, default_value = DEFAULT_TOKEN_LOOKUP)]
    pub token_lookup: String,

    /// Mirror issued tokens into a cookie
    #[arg(long)]
    pub send_cookie: bool,

    /// Set the Secure flag on the token cookie (use behind HTTPS)
    #[arg(long)]
    pub secure_cookie: bool,

    /// Domain attribute of the token cookie
    #[arg(long)]
    pub cookie_domain: Option<String>,

    /// Keep the original login time across refreshes instead of sliding it
    #[arg(long)]
    pub fixed_refresh: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Args {
    /// Whether the configured algorithm signs with an HMAC secret.
    /// Unknown names count as symmetric and fail later in gate construction.
    pub fn uses_secret(&self) -> bool {
        Algorithm::from_str(&self.algorithm)
            .map(|alg| !KeyFamily::of(alg).is_asymmetric())
            .unwrap_or(true)
    }
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build the demo gate from validated arguments.
pub fn build_gate(args: &Args, secret: Option<String>) -> Result<JwtGate<DemoPolicy>, ConfigError> {
    let mut builder = JwtGate::builder(DemoPolicy::default())
        .realm(args.realm.as_str())
        .algorithm(args.algorithm.as_str())
        .timeout(Duration::from_secs(args.timeout_secs))
        .max_refresh(Duration::from_secs(args.max_refresh_secs))
        .token_lookup(args.token_lookup.as_str())
        .send_cookie(args.send_cookie)
        .secure_cookie(args.secure_cookie);

    if let Some(secret) = secret {
        builder = builder.secret(secret);
    }
    if let Some(path) = &args.private_key_file {
        builder = builder.private_key_file(path.clone());
    }
    if let Some(path) = &args.public_key_file {
        builder = builder.public_key_file(path.clone());
    }
    if let Some(domain) = &args.cookie_domain {
        builder = builder.cookie_domain(domain.as_str());
    }
    if args.fixed_refresh {
        builder = builder.refresh_mode(RefreshMode::Fixed);
    }

    builder.build()
}
