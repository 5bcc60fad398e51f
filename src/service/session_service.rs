use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::model::session::{Session, SessionMeta};
use crate::repository::session_repo::SessionRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create_session(&self, user_id: &str, meta: SessionMeta) -> Result<Session, ServiceError>;
    /// Returns the session only while it is live; an expired one is deleted on sight.
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, ServiceError>;
    async fn delete_session(&self, session_id: &str) -> Result<bool, ServiceError>;
}

pub struct SessionServiceImpl {
    session_repo: Arc<dyn SessionRepository>,
    ttl_secs: i64,
}

impl SessionServiceImpl {
    pub fn new(session_repo: Arc<dyn SessionRepository>, ttl_secs: i64) -> Self {
        Self { session_repo, ttl_secs }
    }
}

#[async_trait]
impl SessionService for SessionServiceImpl {
    #[instrument(skip(self, meta))]
    async fn create_session(&self, user_id: &str, meta: SessionMeta) -> Result<Session, ServiceError> {
        let now = bson::DateTime::now();
        let expires_at = bson::DateTime::from_millis(now.timestamp_millis() + self.ttl_secs * 1000);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at,
            meta,
        };
        self.session_repo.insert(&session).await?;
        info!("Session created");
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, ServiceError> {
        let Some(session) = self.session_repo.find(session_id).await? else {
            debug!("No session for cookie value");
            return Ok(None);
        };
        if session.is_expired_at(bson::DateTime::now()) {
            info!(user_id = %session.user_id, "Session expired, removing it");
            if let Err(e) = self.session_repo.delete(session_id).await {
                warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, ServiceError> {
        let deleted = self.session_repo.delete(session_id).await?;
        Ok(deleted > 0)
    }
}
