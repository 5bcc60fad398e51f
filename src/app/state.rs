use std::sync::Arc;

use crate::config::SessionConfig;
use crate::service::auth_service::AuthService;
use crate::service::product_service::ProductService;
use crate::service::user_service::UserService;
use crate::util::upload::UploadStore;

/// Services and settings shared by every handler.
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub product_service: Arc<dyn ProductService>,
    pub uploads: UploadStore,
    pub session_config: SessionConfig,
    /// Where the OAuth callback sends the browser after a successful login.
    pub login_success_path: String,
}
