use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::ConfigError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`; uploads land in its `uploads` child.
    pub static_dir: PathBuf,
    /// Where the OAuth callback sends the browser once the session cookie is set.
    pub login_success_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::ParseError(format!("Invalid APP_PORT: {}", raw)))?,
            Err(_) => {
                warn!("APP_PORT not set, using default: 8080");
                8080
            }
        };
        let static_dir = PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()));
        let login_success_path =
            env::var("LOGIN_SUCCESS_PATH").unwrap_or_else(|_| "/login/success".to_string());
        debug!("App listening on {}:{}, static dir {:?}", host, port, static_dir);

        let config = AppConfig { host, port, static_dir, login_success_path };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError("APP_HOST cannot be empty".to_string()));
        }
        if !self.login_success_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "LOGIN_SUCCESS_PATH must be an absolute path".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults with a throwaway static directory under the system temp dir.
    pub fn from_test_env() -> Self {
        AppConfig {
            static_dir: env::temp_dir().join(format!("catalog-static-{}", uuid::Uuid::new_v4())),
            ..Default::default()
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("static"),
            login_success_path: "/login/success".to_string(),
        }
    }
}
