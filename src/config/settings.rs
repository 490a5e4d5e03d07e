//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::constants::{
    DEFAULT_COMMISSION_RATE, DEFAULT_DATABASE_URL, DEFAULT_FREE_SHIPPING_THRESHOLD,
    DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REDIS_URL,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SHIPPING_FLAT, DEFAULT_TAX_RATE,
    DEFAULT_WEBHOOK_TOLERANCE_SECONDS, MIN_JWT_SECRET_LENGTH,
};

/// Store-wide pricing knobs used by checkout and commission calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    pub commission_rate: Decimal,
    pub shipping_flat: Decimal,
    pub free_shipping_threshold: Decimal,
    pub tax_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            commission_rate: parse_decimal(DEFAULT_COMMISSION_RATE),
            shipping_flat: parse_decimal(DEFAULT_SHIPPING_FLAT),
            free_shipping_threshold: parse_decimal(DEFAULT_FREE_SHIPPING_THRESHOLD),
            tax_rate: parse_decimal(DEFAULT_TAX_RATE),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    webhook_secret: String,
    pub webhook_tolerance_seconds: i64,
    pub pricing: PricingConfig,
    pub blob_storage_url: Option<String>,
    blob_storage_token: Option<String>,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("webhook_secret", &"[REDACTED]")
            .field("webhook_tolerance_seconds", &self.webhook_tolerance_seconds)
            .field("pricing", &self.pricing)
            .field("blob_storage_url", &self.blob_storage_url)
            .field("blob_storage_token", &"[REDACTED]")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET or PAYMENT_WEBHOOK_SECRET are missing in release
    /// builds, or if JWT_SECRET is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = required_secret("JWT_SECRET", "dev-secret-key-minimum-32-chars!!");

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let webhook_secret = required_secret("PAYMENT_WEBHOOK_SECRET", "dev-webhook-secret");

        let defaults = PricingConfig::default();
        let pricing = PricingConfig {
            commission_rate: env_decimal("COMMISSION_RATE", defaults.commission_rate),
            shipping_flat: env_decimal("SHIPPING_FLAT_FEE", defaults.shipping_flat),
            free_shipping_threshold: env_decimal(
                "FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            ),
            tax_rate: env_decimal("TAX_RATE", defaults.tax_rate),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            webhook_secret,
            webhook_tolerance_seconds: env::var("PAYMENT_WEBHOOK_TOLERANCE_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECONDS),
            pricing,
            blob_storage_url: env::var("BLOB_STORAGE_URL").ok().filter(|v| !v.is_empty()),
            blob_storage_token: env::var("BLOB_STORAGE_TOKEN").ok().filter(|v| !v.is_empty()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Build a configuration for tests and tooling without touching the environment.
    pub fn for_secrets(jwt_secret: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            webhook_secret: webhook_secret.into(),
            webhook_tolerance_seconds: DEFAULT_WEBHOOK_TOLERANCE_SECONDS,
            pricing: PricingConfig::default(),
            blob_storage_url: None,
            blob_storage_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origin: None,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the shared secret used to verify payment webhooks.
    pub fn webhook_secret_bytes(&self) -> &[u8] {
        self.webhook_secret.as_bytes()
    }

    /// Bearer token for the blob storage provider, if configured.
    pub fn blob_storage_token(&self) -> Option<&str> {
        self.blob_storage_token.as_deref()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required_secret(name: &str, dev_default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            tracing::warn!("{} not set, using insecure default for development", name);
            dev_default.to_string()
        } else {
            panic!("{} environment variable must be set in production", name);
        }
    })
}

fn env_decimal(name: &str, default: Decimal) -> Decimal {
    match env::var(name) {
        Ok(raw) => Decimal::from_str(raw.trim()).unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid decimal, using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pricing_matches_constants() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.commission_rate, Decimal::new(10, 2));
        assert_eq!(pricing.shipping_flat, Decimal::new(999, 2));
        assert_eq!(pricing.free_shipping_threshold, Decimal::new(10000, 2));
        assert_eq!(pricing.tax_rate, Decimal::ZERO);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::for_secrets("a-very-long-jwt-secret-for-tests-only", "whsec");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("a-very-long-jwt-secret"));
        assert!(!rendered.contains("whsec"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
