//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DASHBOARD_BASE_URL` - Public URL for the dashboard
//! - `DASHBOARD_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `MIDDIFY_API_URL` - Base URL of the Middify REST backend
//! - `IDP_DOMAIN` - Hosted identity provider domain (e.g. `https://auth.example.com`)
//! - `IDP_CLIENT_ID` - Identity provider client id
//!
//! ## Optional
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 3002)
//! - `IDP_LOGOUT_URI` - Post-logout redirect (default: `DASHBOARD_BASE_URL`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Middify backend configuration
    pub api: MiddifyApiConfig,
    /// Hosted identity provider configuration
    pub identity: IdentityConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Middify backend configuration.
#[derive(Debug, Clone)]
pub struct MiddifyApiConfig {
    /// Base URL of the REST backend (endpoint names are appended to it).
    pub base_url: String,
}

/// Hosted identity provider configuration.
///
/// The provider is an opaque collaborator: it hands the dashboard a bearer
/// token on the callback and owns the actual login/logout pages.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Provider domain, scheme included (e.g. `https://auth.middify.example`).
    pub domain: String,
    /// OAuth client id registered for the dashboard.
    pub client_id: String,
    /// Where the provider sends the browser after logout.
    pub logout_uri: String,
}

impl IdentityConfig {
    /// The provider page that starts a sign-in, returning to our callback.
    #[must_use]
    pub fn login_url(&self, base_url: &str) -> String {
        format!(
            "{}/login?client_id={}&response_type=token&redirect_uri={}",
            self.domain,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&format!("{base_url}/auth/callback")),
        )
    }

    /// The provider logout endpoint, clearing the hosted session too.
    #[must_use]
    pub fn logout_url(&self, id_token_hint: Option<&str>) -> String {
        let mut url = format!(
            "{}/logout?client_id={}&logout_uri={}",
            self.domain,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.logout_uri),
        );
        if let Some(hint) = id_token_hint {
            url.push_str("&id_token_hint=");
            url.push_str(&urlencoding::encode(hint));
        }
        url
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DASHBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DASHBOARD_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("DASHBOARD_BASE_URL")?;
        let session_secret = get_validated_secret("DASHBOARD_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "DASHBOARD_SESSION_SECRET")?;

        let api = MiddifyApiConfig {
            base_url: get_validated_url("MIDDIFY_API_URL")?,
        };
        let identity = IdentityConfig {
            domain: get_validated_url("IDP_DOMAIN")?
                .trim_end_matches('/')
                .to_string(),
            client_id: get_required_env("IDP_CLIENT_ID")?,
            logout_uri: get_optional_env("IDP_LOGOUT_URI").unwrap_or_else(|| base_url.clone()),
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            api,
            identity,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load a required environment variable that must parse as an absolute URL.
fn get_validated_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value)
}
