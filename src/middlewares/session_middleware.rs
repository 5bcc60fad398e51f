use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::user::User;
use crate::service::auth_service::AuthService;
use crate::util::cookies::read_cookie;
use crate::util::error::HandlerError;

pub struct SessionAuthState {
    pub auth_service: Arc<dyn AuthService>,
    pub cookie_name: String,
}

/// The user behind the request's session cookie, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().map(User::is_admin).unwrap_or(false)
    }
}

/// Resolves the session cookie into a [`CurrentUser`] extension.
/// Lookup failures are logged and treated as anonymous.
pub async fn resolve_session(
    State(state): State<Arc<SessionAuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user = match read_cookie(req.headers(), &state.cookie_name) {
        Some(session_id) => match state.auth_service.resolve_user(&session_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Session lookup failed, continuing anonymously: {}", e);
                None
            }
        },
        None => None,
    };
    if let Some(ref user) = user {
        debug!(google_id = %user.google_id, "Request authenticated");
    }
    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// Like [`CurrentUser`] but rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(CurrentUser(Some(user))) => Ok(AuthenticatedUser(user.clone())),
            _ => Err(HandlerError::unauthorized()),
        }
    }
}
