//! Configuration module for the Shopify upload relay
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion, an environment-only mode that mirrors the
//! variables the relay has always been deployed with, and validation.
//!
//! The resulting [`Config`] is built once at startup and shared read-only
//! with every request.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Default maximum accepted file size (20 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str) -> String {
    expand_with(s, |name| std::env::var(name).ok())
}

pub(crate) fn expand_with<F>(s: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match lookup(var_name.as_str()) {
            Some(val) => val,
            None => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub shop: ShopConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Build configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigLoader::from_env()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let token = self.shop.access_token.trim();
        if token.is_empty() || token.starts_with("${") {
            return Err(ConfigError::Missing("SHOPIFY_ACCESS_TOKEN"));
        }

        if self.shop.domain.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Shop domain cannot be empty".into(),
            ));
        }

        if self.shop.api_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "API version cannot be empty".into(),
            ));
        }

        if let Some(ref endpoint) = self.shop.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid shop endpoint '{}': must start with http:// or https://",
                    endpoint
                )));
            }
        }

        self.server.socket_addr()?;

        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be greater than zero".into(),
            ));
        }

        for origin in &self.cors.allowed_origins {
            if !is_valid_http_url(origin) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid allowed origin '{}': must start with http:// or https://",
                    origin
                )));
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
}

impl ServerConfig {
    /// Parse the configured bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address.parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Invalid server address '{}': {}",
                self.address, e
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Shopify store and Admin API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Store domain, e.g. `example.myshopify.com`
    #[serde(default = "default_shop_domain")]
    pub domain: String,
    /// Admin API access token sent as `X-Shopify-Access-Token`
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Overrides `https://{domain}` as the GraphQL base URL
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Outbound request timeout. Unset leaves the HTTP client default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ShopConfig {
    /// Full GraphQL Admin API endpoint
    pub fn graphql_endpoint(&self) -> String {
        let base = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.domain));
        format!(
            "{}/admin/api/{}/graphql.json",
            base.trim_end_matches('/'),
            self.api_version
        )
    }
}

fn default_shop_domain() -> String {
    "thereadcounts.myshopify.com".to_string()
}

fn default_api_version() -> String {
    "2025-10".to_string()
}

/// Cross-origin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://thereadcounts.myshopify.com".to_string(),
        "https://thereadcounts.com".to_string(),
        // Shopify CLI theme dev server
        "http://localhost:9292".to_string(),
    ]
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

/// Deployment mode
///
/// Upstream error bodies are echoed to clients only in `Development`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid environment '{}': must be 'production' or 'development'",
                other
            ))),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    9090
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
