use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::AdminUserConfig;
use crate::model::user::{ProfileUpdate, User, UserIdentity, ROLE_ADMIN, ROLE_USER};
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait UserService: Send + Sync {
    /// Creates or refreshes the user behind a provider identity.
    async fn login_upsert(&self, identity: &UserIdentity) -> Result<User, ServiceError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, ServiceError>;
    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, ServiceError>;
    async fn toggle_favorite(&self, user_id: &str, product_id: &str) -> Result<bool, ServiceError>;
}

pub struct UserServiceImpl {
    user_repo: Arc<dyn UserRepository>,
    admins: AdminUserConfig,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>, admins: AdminUserConfig) -> Self {
        Self { user_repo, admins }
    }

    fn initial_role(&self, identity: &UserIdentity) -> &'static str {
        if self.admins.is_admin_email(identity.email.as_deref()) {
            ROLE_ADMIN
        } else {
            ROLE_USER
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, identity), fields(google_id = %identity.google_id))]
    async fn login_upsert(&self, identity: &UserIdentity) -> Result<User, ServiceError> {
        if identity.google_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Identity without provider id".to_string()));
        }
        let result = self.user_repo.upsert_identity(identity, self.initial_role(identity)).await;
        match &result {
            Ok(user) => info!(role = %user.role, "User logged in"),
            Err(e) => error!("User persistence error: {e}"),
        }
        Ok(result?)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.user_repo.find_by_id(user_id).await?)
    }

    #[instrument(skip(self, update))]
    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, ServiceError> {
        if update.is_empty() {
            return Err(ServiceError::InvalidInput("No updatable fields provided".to_string()));
        }
        self.user_repo
            .update_profile(user_id, &update)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User not found for ID: {}", user_id)))
    }

    #[instrument(skip(self))]
    async fn toggle_favorite(&self, user_id: &str, product_id: &str) -> Result<bool, ServiceError> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(ServiceError::InvalidInput("Product id is required".to_string()));
        }
        Ok(self.user_repo.toggle_favorite(user_id, product_id).await?)
    }
}
