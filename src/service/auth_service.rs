use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::model::session::{Session, SessionMeta};
use crate::model::user::User;
use crate::service::session_service::SessionService;
use crate::service::user_service::UserService;
use crate::util::error::ServiceError;
use crate::util::google_oauth::IdentityGateway;

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    fn login_url(&self, state: &str) -> String;
    /// Exchanges the callback code, upserts the user and opens a session.
    async fn complete_login(&self, code: &str) -> Result<LoginOutcome, ServiceError>;
    /// User behind a session cookie, if the session is still live.
    async fn resolve_user(&self, session_id: &str) -> Result<Option<User>, ServiceError>;
    /// Best-effort token revocation followed by session removal. Never fails.
    async fn logout(&self, session_id: &str);
}

pub struct AuthServiceImpl {
    gateway: Arc<dyn IdentityGateway>,
    user_service: Arc<dyn UserService>,
    session_service: Arc<dyn SessionService>,
}

impl AuthServiceImpl {
    pub fn new(
        gateway: Arc<dyn IdentityGateway>,
        user_service: Arc<dyn UserService>,
        session_service: Arc<dyn SessionService>,
    ) -> Self {
        Self { gateway, user_service, session_service }
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    fn login_url(&self, state: &str) -> String {
        self.gateway.authorization_url(state)
    }

    #[instrument(skip(self, code))]
    async fn complete_login(&self, code: &str) -> Result<LoginOutcome, ServiceError> {
        let tokens = self.gateway.exchange_code(code).await.map_err(|e| {
            error!("Failed to fetch token from provider: {}", e);
            ServiceError::from(e)
        })?;
        let info = self.gateway.fetch_user_info(&tokens.access_token).await.map_err(|e| {
            error!("Failed to fetch user info: {}", e);
            ServiceError::from(e)
        })?;
        let identity = info.into_identity()?;

        let user = self.user_service.login_upsert(&identity).await?;
        let user_id = user
            .id_hex()
            .ok_or_else(|| ServiceError::InternalError("User id not available".to_string()))?;

        let meta = SessionMeta::with_tokens(Some(tokens.access_token), tokens.refresh_token);
        let session = self.session_service.create_session(&user_id, meta).await?;
        info!(user_id = %user_id, "Login completed");
        Ok(LoginOutcome { user, session })
    }

    async fn resolve_user(&self, session_id: &str) -> Result<Option<User>, ServiceError> {
        let Some(session) = self.session_service.get_session(session_id).await? else {
            return Ok(None);
        };
        let user = self.user_service.get_user(&session.user_id).await?;
        if user.is_none() {
            debug!(user_id = %session.user_id, "Session points at a missing user");
        }
        Ok(user)
    }

    #[instrument(skip(self, session_id))]
    async fn logout(&self, session_id: &str) {
        match self.session_service.get_session(session_id).await {
            Ok(Some(session)) => {
                if let Some(token) = session.meta.token_to_revoke() {
                    match self.gateway.revoke_token(token).await {
                        Ok(()) => debug!("Provider token revoked"),
                        Err(e) => warn!("Token revocation failed, continuing logout: {}", e),
                    }
                }
            }
            Ok(None) => debug!("No live session to revoke"),
            Err(e) => warn!("Could not read session during logout: {}", e),
        }
        match self.session_service.delete_session(session_id).await {
            Ok(_) => info!("Session ended"),
            Err(e) => warn!("Could not delete session during logout: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminUserConfig;
    use crate::repository::memory::{InMemorySessionRepository, InMemoryUserRepository};
    use crate::service::session_service::SessionServiceImpl;
    use crate::service::user_service::UserServiceImpl;
    use crate::util::google_oauth::{GatewayError, GoogleUserInfo, TokenResponse};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedGateway {
        fail_revoke: bool,
        revoked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IdentityGateway for ScriptedGateway {
        fn authorization_url(&self, state: &str) -> String {
            format!("https://provider.test/auth?state={}", state)
        }

        async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GatewayError> {
            if code == "bad" {
                return Err(GatewayError::Status { status: 400, body: "invalid_grant".into() });
            }
            Ok(TokenResponse {
                access_token: "access-1".into(),
                refresh_token: Some("refresh-1".into()),
                expires_in: Some(3599),
                id_token: None,
            })
        }

        async fn fetch_user_info(&self, _access_token: &str) -> Result<GoogleUserInfo, GatewayError> {
            Ok(GoogleUserInfo {
                sub: Some("sub-1".into()),
                email: Some("ana@example.com".into()),
                name: Some("Ana".into()),
                ..Default::default()
            })
        }

        async fn revoke_token(&self, token: &str) -> Result<(), GatewayError> {
            self.revoked.lock().unwrap().push(token.to_string());
            if self.fail_revoke {
                Err(GatewayError::Request("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    fn build(gateway: Arc<ScriptedGateway>) -> (Arc<InMemorySessionRepository>, AuthServiceImpl) {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let auth = AuthServiceImpl::new(
            gateway,
            Arc::new(UserServiceImpl::new(users, AdminUserConfig::default())),
            Arc::new(SessionServiceImpl::new(sessions.clone(), 7200)),
        );
        (sessions, auth)
    }

    #[tokio::test]
    async fn test_complete_login_opens_session_with_tokens() {
        let (sessions, auth) = build(Arc::new(ScriptedGateway::default()));
        let outcome = auth.complete_login("good").await.unwrap();
        assert_eq!(outcome.user.google_id, "sub-1");
        assert_eq!(outcome.session.meta.refresh_token.as_deref(), Some("refresh-1"));
        assert!(sessions.contains(&outcome.session.id));

        let resolved = auth.resolve_user(&outcome.session.id).await.unwrap().unwrap();
        assert_eq!(resolved.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_rejected_code_surfaces_error() {
        let (sessions, auth) = build(Arc::new(ScriptedGateway::default()));
        assert!(auth.complete_login("bad").await.is_err());
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_logout_deletes_session_when_revocation_fails() {
        let gateway = Arc::new(ScriptedGateway { fail_revoke: true, ..Default::default() });
        let (sessions, auth) = build(gateway.clone());
        let outcome = auth.complete_login("good").await.unwrap();

        auth.logout(&outcome.session.id).await;

        assert!(!sessions.contains(&outcome.session.id));
        assert_eq!(gateway.revoked.lock().unwrap().as_slice(), ["refresh-1".to_string()]);
        assert!(auth.resolve_user(&outcome.session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_unknown_session_is_quiet() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (_, auth) = build(gateway.clone());
        auth.logout("nope").await;
        assert!(gateway.revoked.lock().unwrap().is_empty());
    }
}
