use axum::{body::Body, http::Request, middleware::Next, response::{IntoResponse, Response}};
use tracing::warn;

use crate::middlewares::session_middleware::CurrentUser;
use crate::util::error::HandlerError;

/// Lets the request through only when the session user has the admin role.
/// Must run after `resolve_session`.
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    let is_admin = req
        .extensions()
        .get::<CurrentUser>()
        .map(CurrentUser::is_admin)
        .unwrap_or(false);
    if !is_admin {
        warn!(path = %req.uri().path(), "Admin route refused");
        return HandlerError::forbidden().into_response();
    }
    next.run(req).await
}
