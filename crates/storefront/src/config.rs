//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8080)
//! - `STOREFRONT_BASE_URL` - Public URL of the site (default: <http://localhost:8080>)
//! - `SQUARE_APPLICATION_ID` - Web Payments SDK application id
//! - `SQUARE_LOCATION_ID` - Square location receiving payments
//! - `SQUARE_ACCESS_TOKEN` - Square API token; without it payments are simulated
//! - `SQUARE_ENVIRONMENT` - `sandbox` or `production` (default: sandbox)
//! - `SQUARE_MERCH_CATEGORY_ID` - Catalog category listed by `/api/square-products`
//! - `SQUARE_SIMULATED_DELAY_MS` - Latency of the simulated processor (default: 2000)
//! - `MAILERLITE_API_KEY` - Newsletter API key
//! - `MAILERLITE_GROUP_IDS` - Comma-separated groups new subscribers join
//! - `YOUTUBE_API_KEY` - YouTube Data API key
//! - `YOUTUBE_CHANNEL_ID` - Channel whose videos are listed
//! - `YOUTUBE_CACHE_TTL_SECS` - How long video listings are cached (default: 3600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Environment tag for Sentry events
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_APPLICATION_ID: &str = "sandbox-sq0idb-demo-app-id";
const DEFAULT_LOCATION_ID: &str = "demo-location-id";
const DEFAULT_CHANNEL_ID: &str = "UCbejausSessions";
const DEFAULT_MERCH_CATEGORY_ID: &str = "M2BJ3LCXRPCI4I4XETEORUJX";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used for CORS and cookie security
    pub base_url: String,
    /// Square payments configuration
    pub square: SquareConfig,
    /// Newsletter provider, if configured
    pub mailerlite: Option<MailerLiteConfig>,
    /// Video listing provider, if configured
    pub youtube: Option<YouTubeConfig>,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Square deployment the payment form and API talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SquareEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl SquareEnvironment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    /// Base URL of the Square Connect API for this environment.
    #[must_use]
    pub const fn api_base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://connect.squareupsandbox.com",
            Self::Production => "https://connect.squareup.com",
        }
    }
}

impl FromStr for SquareEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("expected 'sandbox' or 'production', got '{other}'")),
        }
    }
}

/// Square configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct SquareConfig {
    /// Application id for the browser payment form (public)
    pub application_id: String,
    /// Location receiving payments (public)
    pub location_id: String,
    pub environment: SquareEnvironment,
    /// Server-side API token; `None` switches to the simulated processor
    pub access_token: Option<SecretString>,
    /// Category id whose items `/api/square-products` lists
    pub merch_category_id: String,
    /// Artificial latency of the simulated processor
    pub simulated_delay: Duration,
}

impl std::fmt::Debug for SquareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SquareConfig")
            .field("application_id", &self.application_id)
            .field("location_id", &self.location_id)
            .field("environment", &self.environment)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("merch_category_id", &self.merch_category_id)
            .field("simulated_delay", &self.simulated_delay)
            .finish()
    }
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            application_id: DEFAULT_APPLICATION_ID.to_string(),
            location_id: DEFAULT_LOCATION_ID.to_string(),
            environment: SquareEnvironment::Sandbox,
            access_token: None,
            merch_category_id: DEFAULT_MERCH_CATEGORY_ID.to_string(),
            simulated_delay: Duration::from_secs(2),
        }
    }
}

/// `MailerLite` newsletter configuration.
#[derive(Clone)]
pub struct MailerLiteConfig {
    pub api_key: SecretString,
    /// Groups new subscribers are added to
    pub group_ids: Vec<String>,
}

impl std::fmt::Debug for MailerLiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerLiteConfig")
            .field("api_key", &"[REDACTED]")
            .field("group_ids", &self.group_ids)
            .finish()
    }
}

/// YouTube Data API configuration.
#[derive(Clone)]
pub struct YouTubeConfig {
    pub api_key: SecretString,
    pub channel_id: String,
    /// How long a fetched listing is served from cache
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for YouTubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeConfig")
            .field("api_key", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.1,
        }
    }
}

impl Default for StorefrontConfig {
    /// Local development defaults: simulated payments, no newsletter or videos.
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            square: SquareConfig::default(),
            mailerlite: None,
            youtube: None,
            sentry: SentryConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or if a provided
    /// secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("STOREFRONT_PORT", "8080")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:8080");

        Ok(Self {
            host,
            port,
            base_url,
            square: SquareConfig::from_env()?,
            mailerlite: MailerLiteConfig::from_env()?,
            youtube: YouTubeConfig::from_env()?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SquareConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let delay_ms: u64 = parse_env_or_default("SQUARE_SIMULATED_DELAY_MS", "2000")?;
        Ok(Self {
            application_id: get_env_or_default("SQUARE_APPLICATION_ID", DEFAULT_APPLICATION_ID),
            location_id: get_env_or_default("SQUARE_LOCATION_ID", DEFAULT_LOCATION_ID),
            environment: parse_env_or_default("SQUARE_ENVIRONMENT", "sandbox")?,
            access_token: get_optional_secret("SQUARE_ACCESS_TOKEN")?,
            merch_category_id: get_env_or_default(
                "SQUARE_MERCH_CATEGORY_ID",
                DEFAULT_MERCH_CATEGORY_ID,
            ),
            simulated_delay: Duration::from_millis(delay_ms),
        })
    }
}

impl MailerLiteConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_secret("MAILERLITE_API_KEY")? else {
            return Ok(None);
        };
        let group_ids = get_optional_env("MAILERLITE_GROUP_IDS")
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(Self { api_key, group_ids }))
    }
}

impl YouTubeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_secret("YOUTUBE_API_KEY")? else {
            return Ok(None);
        };
        let ttl_secs: u64 = parse_env_or_default("YOUTUBE_CACHE_TTL_SECS", "3600")?;
        Ok(Some(Self {
            api_key,
            channel_id: get_env_or_default("YOUTUBE_CHANNEL_ID", DEFAULT_CHANNEL_ID),
            cache_ttl: Duration::from_secs(ttl_secs),
        }))
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate an optional API key from environment.
fn get_optional_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    get_optional_env(key)
        .map(|value| {
            validate_secret_strength(&value, key)?;
            Ok(SecretString::from(value))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("EAAAl9xQ2mZ7kP4vT1bR8cW3nY6hJ0sD") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-square-token", "SQUARE_ACCESS_TOKEN").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "MAILERLITE_API_KEY").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "YOUTUBE_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("AIzaSyD4k9Qw2Lm7Xp1Tz8Rv3Nb6Hc0Jf5Gs", "YOUTUBE_API_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_square_environment_parsing() {
        assert_eq!(
            "sandbox".parse::<SquareEnvironment>().unwrap(),
            SquareEnvironment::Sandbox
        );
        assert_eq!(
            " Production ".parse::<SquareEnvironment>().unwrap(),
            SquareEnvironment::Production
        );
        assert!("staging".parse::<SquareEnvironment>().is_err());
        assert_eq!(
            SquareEnvironment::Production.api_base_url(),
            "https://connect.squareup.com"
        );
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
        assert!(!config.is_https());
        assert!(config.square.access_token.is_none());
        assert_eq!(config.square.environment, SquareEnvironment::Sandbox);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let square = SquareConfig {
            access_token: Some(SecretString::from("super_secret_square_token")),
            ..SquareConfig::default()
        };
        let mailerlite = MailerLiteConfig {
            api_key: SecretString::from("super_secret_mailerlite_key"),
            group_ids: vec!["123".to_string()],
        };

        let debug_output = format!("{square:?} {mailerlite:?}");

        assert!(debug_output.contains(DEFAULT_APPLICATION_ID));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_square_token"));
        assert!(!debug_output.contains("super_secret_mailerlite_key"));
    }
}
