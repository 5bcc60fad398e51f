#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Response};
use axum::Router;
use catalog_backend::app::state::AppState;
use catalog_backend::config::{AdminUserConfig, AppConfig, SessionConfig};
use catalog_backend::model::session::{Session, SessionMeta};
use catalog_backend::model::user::User;
use catalog_backend::repository::memory::{
    InMemoryProductRepository, InMemorySessionRepository, InMemoryUserRepository,
};
use catalog_backend::repository::session_repo::SessionRepository;
use catalog_backend::router::create_router;
use catalog_backend::service::auth_service::AuthServiceImpl;
use catalog_backend::service::product_service::ProductServiceImpl;
use catalog_backend::service::session_service::SessionServiceImpl;
use catalog_backend::service::user_service::UserServiceImpl;
use catalog_backend::util::google_oauth::{GatewayError, GoogleUserInfo, IdentityGateway, TokenResponse};
use catalog_backend::util::upload::UploadStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Identity provider double with scripted answers.
pub struct FakeGateway {
    pub user_info: GoogleUserInfo,
    pub fail_revoke: bool,
    pub revoked: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new(email: &str) -> Self {
        FakeGateway {
            user_info: GoogleUserInfo {
                sub: Some(format!("sub-{}", email)),
                email: Some(email.to_string()),
                email_verified: Some(true),
                name: Some("Ana".to_string()),
                ..Default::default()
            },
            fail_revoke: false,
            revoked: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_revoke(mut self) -> Self {
        self.fail_revoke = true;
        self
    }
}

#[async_trait]
impl IdentityGateway for FakeGateway {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.test/o/oauth2/v2/auth?client_id=test&state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GatewayError> {
        match code {
            "unreachable" => Err(GatewayError::Request("connection refused".to_string())),
            "rejected" => Err(GatewayError::Status { status: 400, body: "invalid_grant".to_string() }),
            _ => Ok(TokenResponse {
                access_token: "access-token".to_string(),
                refresh_token: Some("refresh-token".to_string()),
                expires_in: Some(3599),
                id_token: None,
            }),
        }
    }

    async fn fetch_user_info(&self, _access_token: &str) -> Result<GoogleUserInfo, GatewayError> {
        Ok(self.user_info.clone())
    }

    async fn revoke_token(&self, token: &str) -> Result<(), GatewayError> {
        self.revoked.lock().unwrap().push(token.to_string());
        if self.fail_revoke {
            Err(GatewayError::Request("revocation endpoint down".to_string()))
        } else {
            Ok(())
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub products: Arc<InMemoryProductRepository>,
    pub gateway: Arc<FakeGateway>,
    pub static_dir: PathBuf,
    pub cookie_name: String,
}

pub fn test_app(gateway: FakeGateway) -> TestApp {
    let app_config = AppConfig::from_test_env();
    let session_config = SessionConfig::default();
    let users = Arc::new(InMemoryUserRepository::new());
    let sessions = Arc::new(InMemorySessionRepository::new());
    let products = Arc::new(InMemoryProductRepository::new());
    let gateway = Arc::new(gateway);
    let uploads = UploadStore::new(app_config.uploads_dir());

    let user_service = Arc::new(UserServiceImpl::new(users.clone(), AdminUserConfig::from_list(ADMIN_EMAIL)));
    let session_service = Arc::new(SessionServiceImpl::new(sessions.clone(), session_config.ttl_secs));
    let auth_service = Arc::new(AuthServiceImpl::new(gateway.clone(), user_service.clone(), session_service));
    let product_service = Arc::new(ProductServiceImpl::new(products.clone(), uploads.clone()));

    let cookie_name = session_config.cookie_name.clone();
    let state = Arc::new(AppState {
        auth_service,
        user_service,
        product_service,
        uploads,
        session_config,
        login_success_path: app_config.login_success_path.clone(),
    });
    TestApp {
        router: create_router(state, &app_config.static_dir),
        users,
        sessions,
        products,
        gateway,
        static_dir: app_config.static_dir,
        cookie_name,
    }
}

impl TestApp {
    /// Stores a user with `role` and a live session for it; returns the `Cookie` header value.
    pub async fn sign_in(&self, email: &str, role: &str) -> (User, String) {
        let user: User = bson::from_document(bson::doc! {
            "google_id": format!("sub-{}", email),
            "email": email,
            "name": "Test User",
            "role": role,
        })
        .unwrap();
        let user = self.users.insert_user(user).unwrap();
        let session_id = self.insert_session(&user.id_hex().unwrap(), 3600).await;
        (user, format!("{}={}", self.cookie_name, session_id))
    }

    /// Inserts a session expiring `ttl_secs` from now (negative for already expired).
    pub async fn insert_session(&self, user_id: &str, ttl_secs: i64) -> String {
        let now = bson::DateTime::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: bson::DateTime::from_millis(now.timestamp_millis() + ttl_secs * 1000),
            meta: SessionMeta::with_tokens(Some("access-token".into()), Some("refresh-token".into())),
        };
        self.sessions.insert(&session).await.unwrap();
        session.id
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.static_dir);
    }
}

pub fn set_cookies(resp: &Response<Body>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub const BOUNDARY: &str = "X-CATALOG-TEST-BOUNDARY";

/// Builds a multipart body from text fields and `(field, file name, bytes)` files.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
