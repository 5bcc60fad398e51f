use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

use crate::app::state::AppState;
use crate::dto::user_dto::{FavoriteResponse, UpdateProfileRequest, UserResponse};
use crate::middlewares::session_middleware::{AuthenticatedUser, CurrentUser};
use crate::model::user::{ProfileUpdate, User};
use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::upload::UploadedFile;

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub ok: bool,
    pub picture: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub current_user: UserResponse,
    pub page_title: &'static str,
}

fn user_id(user: &User) -> Result<String, HandlerError> {
    user.id_hex()
        .ok_or_else(|| HandlerError::internal("User id not available"))
}

pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, HandlerError> {
    let Json(req) = payload.map_err(|e| {
        HandlerError::bad_request("Invalid JSON payload").with_details(e.body_text())
    })?;
    if let Err(e) = req.validate() {
        return Err(HandlerError::new(HandlerErrorKind::Validation, "Invalid profile fields")
            .with_details(e.to_string()));
    }
    let id = user_id(&user)?;
    let updated = state.user_service.update_profile(&id, req.into()).await?;
    info!(user_id = %id, "Profile updated");
    Ok(Json(UserResponse::from(updated)))
}

pub async fn upload_avatar_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let mut upload: Option<UploadedFile> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HandlerError::bad_request(format!("Failed to get next field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string).unwrap_or_default();
        let bytes = field.bytes().await.map_err(|e| {
            HandlerError::bad_request(format!("Failed to read file: {}", e))
        })?;
        upload = Some(UploadedFile { file_name, bytes });
        break;
    }
    let upload = upload.ok_or_else(|| HandlerError::bad_request("Missing file field"))?;

    let id = user_id(&user)?;
    let picture = state.uploads.save_avatar(&id, &upload).await.map_err(|e| {
        error!("Failed saving avatar: {}", e);
        HandlerError::internal("Failed saving file")
    })?;
    let update = ProfileUpdate { name: None, picture: Some(picture.clone()) };
    state.user_service.update_profile(&id, update).await?;
    info!(user_id = %id, "Avatar updated");

    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    match referer {
        Some(back) => Ok(Redirect::to(back).into_response()),
        None => Ok(Json(AvatarResponse { ok: true, picture }).into_response()),
    }
}

pub async fn toggle_favorite_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(product_id): Path<String>,
) -> Result<Json<FavoriteResponse>, HandlerError> {
    let id = user_id(&user)?;
    let is_favorite = state.user_service.toggle_favorite(&id, &product_id).await?;
    Ok(Json(FavoriteResponse { ok: true, is_favorite }))
}

pub async fn profile_handler(CurrentUser(user): CurrentUser) -> Response {
    match user {
        Some(user) => Json(ProfileView {
            current_user: UserResponse::from(user),
            page_title: "My profile",
        })
        .into_response(),
        None => Redirect::to("/login").into_response(),
    }
}
