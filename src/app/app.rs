use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{AdminUserConfig, AppConfig, MongoConfig, OAuthConfig, SessionConfig};
use crate::app::state::AppState;
use crate::repository::mongo;
use crate::repository::product_repo::MongoProductRepository;
use crate::repository::session_repo::MongoSessionRepository;
use crate::repository::user_repo::MongoUserRepository;
use crate::router::create_router;
use crate::service::auth_service::AuthServiceImpl;
use crate::service::product_service::ProductServiceImpl;
use crate::service::session_service::SessionServiceImpl;
use crate::service::user_service::UserServiceImpl;
use crate::util::google_oauth::GoogleGateway;
use crate::util::upload::UploadStore;

pub type AppError = Box<dyn std::error::Error + Send + Sync>;

pub struct App {
    config: AppConfig,
    router: Router,
}

impl App {
    /// Loads configuration from the environment, connects to MongoDB and
    /// wires every service behind the router.
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env()?;
        let mongo_config = MongoConfig::from_env()?;
        let oauth_config = OAuthConfig::from_env()?;
        let session_config = SessionConfig::from_env()?;
        let admins = AdminUserConfig::from_env();
        if admins.emails.is_empty() {
            warn!("ADMIN_EMAILS is empty; no user will be created as admin");
        }

        let db = mongo::connect(&mongo_config).await.map_err(|e| {
            error!("Failed to connect to MongoDB: {}", e);
            e
        })?;

        let user_repo = Arc::new(MongoUserRepository::new(&db));
        user_repo.ensure_indexes().await;
        let session_repo = Arc::new(MongoSessionRepository::new(&db));
        session_repo.ensure_indexes().await;
        let product_repo = Arc::new(MongoProductRepository::new(&db, &mongo_config.product_collection));

        let uploads = UploadStore::new(config.uploads_dir());
        if let Err(e) = uploads.ensure_dir().await {
            warn!("Could not create uploads directory {:?}: {}", uploads.dir(), e);
        }

        let gateway = Arc::new(GoogleGateway::new(oauth_config)?);
        let user_service = Arc::new(UserServiceImpl::new(user_repo, admins));
        let session_service = Arc::new(SessionServiceImpl::new(session_repo, session_config.ttl_secs));
        let auth_service = Arc::new(AuthServiceImpl::new(gateway, user_service.clone(), session_service));
        let product_service = Arc::new(ProductServiceImpl::new(product_repo, uploads.clone()));

        let state = Arc::new(AppState {
            auth_service,
            user_service,
            product_service,
            uploads,
            session_config,
            login_success_path: config.login_success_path.clone(),
        });
        let router = create_router(state, &config.static_dir);
        Ok(App { config, router })
    }

    pub async fn start(self) -> Result<(), AppError> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
