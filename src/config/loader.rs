//! Configuration loader with environment variable expansion

use super::{
    expand_env_vars, Config, ConfigError, CorsConfig, Environment, LogFormat, LoggingConfig,
    MetricsConfig, ServerConfig, ShopConfig, UploadConfig,
};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text, expanding `${VAR}` references first
    pub fn from_yaml_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_token = var("SHOPIFY_ACCESS_TOKEN").ok_or(ConfigError::Missing(
            "SHOPIFY_ACCESS_TOKEN",
        ))?;

        let mut server = ServerConfig::default();
        if let Some(port) = var("PORT") {
            let port: u16 = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("Invalid PORT '{}'", port))
            })?;
            server.address = format!("0.0.0.0:{}", port);
        }

        let mut shop = ShopConfig {
            domain: super::default_shop_domain(),
            access_token,
            api_version: super::default_api_version(),
            endpoint: var("SHOPIFY_API_ENDPOINT"),
            timeout_seconds: None,
        };
        if let Some(domain) = var("SHOPIFY_SHOP") {
            shop.domain = domain;
        }
        if let Some(version) = var("SHOPIFY_API_VERSION") {
            shop.api_version = version;
        }

        let mut cors = CorsConfig::default();
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            cors.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        let mut upload = UploadConfig::default();
        if let Some(size) = var("MAX_FILE_SIZE") {
            upload.max_file_size = size.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("Invalid MAX_FILE_SIZE '{}'", size))
            })?;
        }

        let environment = match var("RELAY_ENV") {
            Some(env) => env.parse()?,
            None => Environment::default(),
        };

        let mut metrics = MetricsConfig::default();
        if let Some(enabled) = var("METRICS_ENABLED") {
            metrics.enabled = matches!(enabled.trim(), "1" | "true" | "yes");
        }
        if let Some(port) = var("METRICS_PORT") {
            metrics.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("Invalid METRICS_PORT '{}'", port))
            })?;
        }

        let mut logging = LoggingConfig::default();
        if let Some(format) = var("LOG_FORMAT") {
            logging.format = match format.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid LOG_FORMAT '{}': must be 'json' or 'pretty'",
                        other
                    )))
                }
            };
        }

        let config = Config {
            server,
            shop,
            cors,
            upload,
            environment,
            metrics,
            logging,
        };
        config.validate()?;
        Ok(config)
    }
}
