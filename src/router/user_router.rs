use axum::{routing::{get, patch, post}, Router};
use std::sync::Arc;

use crate::app::state::AppState;
use crate::handler::user_handler::{
    profile_handler, toggle_favorite_handler, update_me_handler, upload_avatar_handler,
};

pub fn user_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/users/me", patch(update_me_handler))
        .route("/api/v1/users/avatar", post(upload_avatar_handler))
        .route("/api/v1/users/favorites/{product_id}", post(toggle_favorite_handler))
        .route("/profile", get(profile_handler))
        .with_state(state)
}
