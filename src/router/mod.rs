pub mod auth_router;
pub mod product_router;
pub mod user_router;

use axum::{middleware, routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app::state::AppState;
use crate::middlewares::session_middleware::{resolve_session, SessionAuthState};

/// Full application router: every route group, `/health`, static files, the
/// session resolver and request tracing.
pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let session_state = Arc::new(SessionAuthState {
        auth_service: state.auth_service.clone(),
        cookie_name: state.session_config.cookie_name.clone(),
    });

    Router::new()
        .merge(auth_router::auth_router(state.clone()))
        .merge(user_router::user_router(state.clone()))
        .merge(product_router::product_router(state))
        .route("/health", get(|| async { "OK" }))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(session_state, resolve_session))
        .layer(TraceLayer::new_for_http())
}
