use std::env;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

/// Emails that are provisioned with the `admin` role the first time they log in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub emails: Vec<String>,
}

impl AdminUserConfig {
    pub fn from_env() -> Self {
        match env::var("ADMIN_EMAILS") {
            Ok(raw) => {
                let config = Self::from_list(&raw);
                info!("Loaded {} admin email(s)", config.emails.len());
                config
            }
            Err(_) => {
                warn!("ADMIN_EMAILS not set, new users will all get the default role");
                AdminUserConfig::default()
            }
        }
    }

    pub fn from_list(raw: &str) -> Self {
        let emails = raw
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        AdminUserConfig { emails }
    }

    pub fn is_admin_email(&self, email: Option<&str>) -> bool {
        match email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                self.emails.iter().any(|e| *e == email)
            }
            None => false,
        }
    }
}
