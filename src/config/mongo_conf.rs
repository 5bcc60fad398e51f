use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "catalog";
const DEFAULT_PRODUCT_COLLECTION: &str = "products";

/// Connection settings for the catalog database.
///
/// `users` and `sessions` have fixed collection names; only the product
/// collection is configurable because imported catalogs land in differently
/// named collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    /// Both must be set for credentials to be sent
    pub username: Option<String>,
    pub password: Option<String>,
    pub product_collection: String,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using default: {}", name, default);
        default.to_string()
    })
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            error!("Invalid {} value: {}", name, raw);
            ConfigError::InvalidValue(format!("Invalid {} value", name))
        }),
        Err(_) => Ok(default),
    }
}

impl MongoConfig {
    /// Reads MONGO_URI, MONGO_DATABASE, MONGO_USERNAME, MONGO_PASSWORD,
    /// MONGO_PRODUCT_COLLECTION, MONGO_POOL_SIZE and MONGO_CONNECTION_TIMEOUT.
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");

        let defaults = MongoConfig::default();
        let config = MongoConfig {
            uri: var_or("MONGO_URI", DEFAULT_URI),
            database: var_or("MONGO_DATABASE", DEFAULT_DATABASE),
            username: env::var("MONGO_USERNAME").ok(),
            password: env::var("MONGO_PASSWORD").ok(),
            product_collection: env::var("MONGO_PRODUCT_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_PRODUCT_COLLECTION.to_string()),
            pool_size: parse_var("MONGO_POOL_SIZE", defaults.pool_size)?,
            connection_timeout_secs: parse_var("MONGO_CONNECTION_TIMEOUT", defaults.connection_timeout_secs)?,
        };
        debug!(
            database = %config.database,
            products = %config.product_collection,
            authenticated = config.username.is_some(),
            "MongoDB settings"
        );

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    /// Local server, separate database and a short timeout.
    pub fn from_test_env() -> Self {
        MongoConfig {
            database: "catalog_test".to_string(),
            product_collection: "test_products".to_string(),
            pool_size: 2,
            connection_timeout_secs: 2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("MONGO_URI", &self.uri),
            ("MONGO_DATABASE", &self.database),
            ("MONGO_PRODUCT_COLLECTION", &self.product_collection),
        ] {
            if value.trim().is_empty() {
                error!("{} is empty", name);
                return Err(ConfigError::ValidationError(format!("{} cannot be empty", name)));
            }
        }
        if !self.uri.starts_with("mongodb://") && !self.uri.starts_with("mongodb+srv://") {
            return Err(ConfigError::ValidationError(
                "MONGO_URI must start with mongodb:// or mongodb+srv://".to_string(),
            ));
        }
        if self.pool_size == 0 || self.connection_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "MongoDB pool size and connection timeout must be greater than 0".to_string(),
            ));
        }
        let blank = |v: &Option<String>| v.as_deref().is_some_and(str::is_empty);
        if blank(&self.username) || blank(&self.password) {
            return Err(ConfigError::ValidationError(
                "MongoDB credentials cannot be empty if set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: None,
            password: None,
            product_collection: DEFAULT_PRODUCT_COLLECTION.to_string(),
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MongoConfig::default();
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "catalog");
        assert_eq!(config.product_collection, "products");
        assert_eq!(config.pool_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_env_uses_separate_database() {
        let config = MongoConfig::from_test_env();
        assert_eq!(config.database, "catalog_test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_collection_and_bad_scheme() {
        let mut config = MongoConfig::from_test_env();
        config.product_collection = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = MongoConfig::from_test_env();
        config.uri = "localhost:27017".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_pool_and_blank_credentials() {
        let mut config = MongoConfig::from_test_env();
        config.pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = MongoConfig::from_test_env();
        config.username = Some(String::new());
        assert!(config.validate().is_err());
    }
}
