//! Google OAuth2 authorization-code client.
//!
//! [`IdentityGateway`] is the seam the auth service talks to; [`GoogleGateway`]
//! is the reqwest implementation. Tests swap in their own gateway or point a
//! `GoogleGateway` at a local fake provider through [`OAuthConfig::for_provider`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::OAuthConfig;
use crate::model::user::UserIdentity;

const SCOPES: &str = "openid email profile";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("identity provider answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("token response did not include an access token")]
    MissingToken,

    #[error("request to identity provider failed: {0}")]
    Request(String),

    #[error("could not decode identity provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Request(err.to_string())
        }
    }
}

/// Tokens returned by a successful code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    id_token: Option<String>,
}

/// Profile as returned by the userinfo endpoint (v2 or OpenID flavour).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GoogleUserInfo {
    pub sub: Option<String>,
    pub id: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "verified_email")]
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
}

impl GoogleUserInfo {
    /// Stable provider id: `sub`, else `id`.
    pub fn google_id(&self) -> Option<&str> {
        self.sub
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn into_identity(self) -> Result<UserIdentity, GatewayError> {
        let google_id = self
            .google_id()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Decode("user info has neither 'sub' nor 'id'".to_string()))?;
        Ok(UserIdentity {
            google_id,
            email: self.email.map(|e| e.trim().to_lowercase()),
            email_verified: self.email_verified.unwrap_or(false),
            name: self.name,
            given_name: self.given_name,
            family_name: self.family_name,
            picture: self.picture,
            locale: self.locale,
        })
    }
}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Provider consent URL carrying `state`.
    fn authorization_url(&self, state: &str) -> String;
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GatewayError>;
    async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, GatewayError>;
    async fn revoke_token(&self, token: &str) -> Result<(), GatewayError>;
}

pub struct GoogleGateway {
    config: OAuthConfig,
    client: Client,
}

impl GoogleGateway {
    pub fn new(config: OAuthConfig) -> Result<Self, GatewayError> {
        if config.skip_tls_verify {
            warn!("TLS certificate verification is disabled for the identity provider");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .map_err(|e| GatewayError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Ok(GoogleGateway { config, client })
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %body, "Identity provider rejected the request");
        Err(GatewayError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl IdentityGateway for GoogleGateway {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&scope={}&redirect_uri={}&access_type=offline&prompt=select_account&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(SCOPES),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(state),
        )
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GatewayError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");
        let response = self
            .client
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;

        let raw = response
            .json::<RawTokenResponse>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let access_token = raw
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(GatewayError::MissingToken)?;

        info!(has_refresh_token = raw.refresh_token.is_some(), "Authorization code exchanged");
        Ok(TokenResponse {
            access_token,
            refresh_token: raw.refresh_token,
            expires_in: raw.expires_in,
            id_token: raw.id_token,
        })
    }

    #[instrument(skip(self, access_token))]
    async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, GatewayError> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;
        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    #[instrument(skip(self, token))]
    async fn revoke_token(&self, token: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(&self.config.revoke_url)
            .query(&[("token", token)])
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .timeout(Duration::from_secs(self.config.revoke_timeout_secs))
            .send()
            .await?;
        Self::error_for_status(response).await?;
        debug!("Token revoked");
        Ok(())
    }
}

/// Opaque value for the `state` parameter and its cookie.
pub fn new_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
