use std::env;
use tracing::{debug, error, info, warn};

use crate::config::{env_flag, ConfigError};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Google OAuth2 client configuration
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub revoke_url: String,
    /// Timeout for token and userinfo calls, in seconds
    pub http_timeout_secs: u64,
    /// Timeout for the logout-time revocation call, in seconds
    pub revoke_timeout_secs: u64,
    /// Disables TLS certificate checks; local development only
    pub skip_tls_verify: bool,
}

// The client secret stays out of debug output.
impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("revoke_url", &self.revoke_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => {
            error!(
                "{} environment variable not found; copy .env.example to .env and fill it in",
                name
            );
            Err(ConfigError::EnvVarNotFound(name.to_string()))
        }
    }
}

impl OAuthConfig {
    /// Load Google OAuth configuration from environment variables
    ///
    /// Expected environment variables:
    /// - GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET, GOOGLE_REDIRECT_URI (required)
    /// - GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL, GOOGLE_REVOKE_URL (optional overrides)
    /// - OAUTH_HTTP_TIMEOUT: request timeout in seconds (defaults to 10)
    /// - OAUTH_SKIP_TLS_VERIFY: "1"/"true" to skip certificate checks
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading Google OAuth configuration from environment variables");

        let client_id = required("GOOGLE_CLIENT_ID")?;
        let client_secret = required("GOOGLE_CLIENT_SECRET")?;
        let redirect_uri = required("GOOGLE_REDIRECT_URI")?;
        debug!("Google client id: {}, redirect uri: {}", client_id, redirect_uri);

        let http_timeout_secs = env::var("OAUTH_HTTP_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue("Invalid OAUTH_HTTP_TIMEOUT value".to_string()))?;

        let skip_tls_verify = env_flag("OAUTH_SKIP_TLS_VERIFY");
        if skip_tls_verify {
            warn!("OAUTH_SKIP_TLS_VERIFY is set, provider certificates will not be verified");
        }

        let config = OAuthConfig {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
            token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
            userinfo_url: env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| GOOGLE_USERINFO_URL.to_string()),
            revoke_url: env::var("GOOGLE_REVOKE_URL").unwrap_or_else(|_| GOOGLE_REVOKE_URL.to_string()),
            http_timeout_secs,
            revoke_timeout_secs: 5,
            skip_tls_verify,
        };
        config.validate()?;
        info!("Google OAuth configuration loaded successfully");
        Ok(config)
    }

    /// Points every endpoint at `base_url`, for tests that stand in for the provider
    pub fn for_provider(base_url: &str) -> Self {
        OAuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:8080/api/v1/auth/google/callback".to_string(),
            auth_url: format!("{}/o/oauth2/v2/auth", base_url),
            token_url: format!("{}/token", base_url),
            userinfo_url: format!("{}/userinfo", base_url),
            revoke_url: format!("{}/revoke", base_url),
            http_timeout_secs: 5,
            revoke_timeout_secs: 5,
            skip_tls_verify: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("GOOGLE_REDIRECT_URI", &self.redirect_uri),
            ("GOOGLE_AUTH_URL", &self.auth_url),
            ("GOOGLE_TOKEN_URL", &self.token_url),
            ("GOOGLE_USERINFO_URL", &self.userinfo_url),
            ("GOOGLE_REVOKE_URL", &self.revoke_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!("{} must be an http(s) URL", name)));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ValidationError("OAUTH_HTTP_TIMEOUT must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_provider_is_valid() {
        let config = OAuthConfig::for_provider("http://127.0.0.1:9999");
        assert!(config.validate().is_ok());
        assert_eq!(config.token_url, "http://127.0.0.1:9999/token");
    }

    #[test]
    fn test_validate_rejects_non_http_redirect() {
        let mut config = OAuthConfig::for_provider("http://127.0.0.1:9999");
        config.redirect_uri = "localhost/callback".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = OAuthConfig::for_provider("http://127.0.0.1:9999");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test-client-secret"));
    }
}
