use axum::{routing::get, Router};
use std::sync::Arc;

use crate::app::state::AppState;
use crate::handler::auth_handler::{
    google_callback_handler, google_login_handler, logout_handler, me_handler, site_logout_handler,
};

pub fn auth_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/auth/google", get(google_login_handler))
        .route("/api/v1/auth/google/callback", get(google_callback_handler))
        .route("/api/v1/auth/logout", get(logout_handler))
        .route("/api/v1/auth/me", get(me_handler))
        .route("/logout", get(site_logout_handler))
        .with_state(state)
}
