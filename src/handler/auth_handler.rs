use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::state::AppState;
use crate::dto::user_dto::{MeResponse, UserResponse};
use crate::middlewares::session_middleware::AuthenticatedUser;
use crate::util::cookies::{
    is_https, read_cookie, removal_cookie, session_cookie, set_cookie_headers, state_cookie,
    OAUTH_STATE_COOKIE,
};
use crate::util::error::HandlerError;
use crate::util::google_oauth::new_state;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn secure_cookie(state: &AppState, headers: &HeaderMap, uri: &Uri) -> bool {
    state.session_config.force_secure_cookie || is_https(headers, uri)
}

pub async fn google_login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let csrf_state = new_state();
    let url = state.auth_service.login_url(&csrf_state);
    info!("Redirecting to identity provider");
    let cookie = state_cookie(&csrf_state, secure_cookie(&state, &headers, &uri));
    (set_cookie_headers(&[cookie]), Redirect::to(&url)).into_response()
}

pub async fn google_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, HandlerError> {
    if let Some(ref provider_error) = query.error {
        warn!(error = %provider_error, "Provider returned an error to the callback");
        return Err(HandlerError::bad_request("Authorization was not granted").with_details(provider_error.clone()));
    }
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| HandlerError::bad_request("Missing code in callback"))?;

    let expected = read_cookie(&headers, OAUTH_STATE_COOKIE);
    match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            warn!("OAuth state missing or mismatched");
            return Err(HandlerError::bad_request("Invalid OAuth state"));
        }
    }

    let outcome = state.auth_service.complete_login(code).await.map_err(|e| {
        error!("Login failed: {}", e);
        HandlerError::from(e)
    })?;

    let secure = secure_cookie(&state, &headers, &uri);
    let cookies = [
        session_cookie(
            &state.session_config.cookie_name,
            &outcome.session.id,
            secure,
            state.session_config.ttl_secs,
        ),
        removal_cookie(OAUTH_STATE_COOKIE),
    ];
    Ok((set_cookie_headers(&cookies), Redirect::to(&state.login_success_path)).into_response())
}

async fn end_session(state: &AppState, headers: &HeaderMap, target: &str) -> Response {
    let cookie_name = &state.session_config.cookie_name;
    if let Some(session_id) = read_cookie(headers, cookie_name) {
        state.auth_service.logout(&session_id).await;
    }
    (set_cookie_headers(&[removal_cookie(cookie_name)]), Redirect::to(target)).into_response()
}

/// `/api/v1/auth/logout`: ends the session and returns to the login page.
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    end_session(&state, &headers, "/login").await
}

/// `/logout`: ends the session and returns to the catalog.
pub async fn site_logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    end_session(&state, &headers, "/").await
}

pub async fn me_handler(AuthenticatedUser(user): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse { user: UserResponse::from(user) })
}
