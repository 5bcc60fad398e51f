use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};

use crate::config::{env_flag, ConfigError};

/// Server-side session and cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Session lifetime, also used as the cookie `Max-Age`.
    pub ttl_secs: i64,
    /// Forces the `Secure` attribute even when the request arrived over plain HTTP.
    pub force_secure_cookie: bool,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let cookie_name = env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session_id".to_string());
        let ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "7200".to_string())
            .parse::<i64>()
            .map_err(|_| {
                error!("Invalid SESSION_TTL_SECS value");
                ConfigError::InvalidValue("Invalid SESSION_TTL_SECS value".to_string())
            })?;
        let force_secure_cookie = env_flag("COOKIE_SECURE");
        debug!(cookie = %cookie_name, ttl_secs, force_secure_cookie, "Session configuration");

        let config = SessionConfig { cookie_name, ttl_secs, force_secure_cookie };
        config.validate()?;
        Ok(config)
    }

    pub fn from_test_env() -> Self {
        SessionConfig { ttl_secs: 60, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_name.is_empty() {
            return Err(ConfigError::ValidationError("Session cookie name cannot be empty".to_string()));
        }
        if self.ttl_secs <= 0 {
            return Err(ConfigError::ValidationError("Session TTL must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: "session_id".to_string(),
            ttl_secs: 2 * 60 * 60,
            force_secure_cookie: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_two_hours() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl_secs, 7200);
        assert_eq!(config.cookie_name, "session_id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = SessionConfig::default();
        config.ttl_secs = 0;
        assert!(config.validate().is_err());
    }
}
