//! Booking service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FERNHILL_PLATFORM_API_URL` - Base URL of the pharmacy platform API
//! - `FERNHILL_PLATFORM_API_TOKEN` - Service bearer token for the platform API
//! - `FERNHILL_BASE_URL` - Public URL for the booking service
//! - `FERNHILL_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `RYFT_PUBLIC_KEY` - Ryft payment SDK public key (safe to expose to clients)
//!
//! ## Optional
//! - `FERNHILL_HOST` - Bind address (default: 127.0.0.1)
//! - `FERNHILL_PORT` - Listen port (default: 3000)
//! - `FERNHILL_CURRENCY` - ISO 4217 currency code (default: GBP)
//! - `FERNHILL_DELIVERY_FEE_MINOR` - Flat delivery fee in minor units (default: 0)
//! - `FERNHILL_SUPPORT_URL` - Support/contact page URL
//! - `FERNHILL_SUPPORT_EMAIL` - Reply-to address for confirmation emails
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use fernhill_core::{CurrencyCode, Email, Money};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

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

/// Booking service configuration.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the booking service
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Pharmacy platform API configuration
    pub platform: PlatformConfig,
    /// Payment provider configuration
    pub payment: PaymentConfig,
    /// Currency for all cart and order amounts
    pub currency: CurrencyCode,
    /// Flat delivery fee added to order totals
    pub delivery_fee: Money,
    /// Support/contact page URL
    pub support_url: Option<String>,
    /// Reply-to address for confirmation emails
    pub support_email: Option<Email>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Pharmacy platform API configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct PlatformConfig {
    /// Base URL of the platform API (e.g., <https://api.fernhillpharmacy.co.uk>)
    pub api_url: Url,
    /// Service bearer token (server-side only)
    pub api_token: SecretString,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

/// Payment provider (Ryft) configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Ryft public key, handed to the browser SDK alongside the
    /// server-issued client secret
    pub public_key: String,
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("FERNHILL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FERNHILL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FERNHILL_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FERNHILL_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("FERNHILL_BASE_URL")?;
        let session_secret = get_validated_secret("FERNHILL_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "FERNHILL_SESSION_SECRET")?;

        let platform = PlatformConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;

        let currency = get_env_or_default("FERNHILL_CURRENCY", "GBP")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("FERNHILL_CURRENCY".to_string(), e))?;
        let delivery_fee_minor = get_env_or_default("FERNHILL_DELIVERY_FEE_MINOR", "0")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FERNHILL_DELIVERY_FEE_MINOR".to_string(), e.to_string())
            })?;

        let support_email = match get_optional_env("FERNHILL_SUPPORT_EMAIL") {
            Some(raw) => Some(Email::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("FERNHILL_SUPPORT_EMAIL".to_string(), e.to_string())
            })?),
            None => None,
        };

        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
            })?;
        let sentry_traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            platform,
            payment,
            currency,
            delivery_fee: Money::from_minor(delivery_fee_minor, currency),
            support_url: get_optional_env("FERNHILL_SUPPORT_URL"),
            support_email,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
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

impl PlatformConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_required_env("FERNHILL_PLATFORM_API_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FERNHILL_PLATFORM_API_URL".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_url,
            api_token: get_validated_secret("FERNHILL_PLATFORM_API_TOKEN")?,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            public_key: get_required_env("RYFT_PUBLIC_KEY")?,
        })
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
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_platform_config_debug_redacts_token() {
        let config = PlatformConfig {
            api_url: "https://api.fernhill.test".parse().unwrap(),
            api_token: SecretString::from("svc_token_super_secret"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("api.fernhill.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("svc_token_super_secret"));
    }
}
