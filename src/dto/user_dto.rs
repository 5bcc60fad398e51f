use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::user::{ProfileUpdate, User};

/// Public view of a user; never carries provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Option<String>,
    pub google_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub role: String,
    pub favorites: Vec<String>,
    pub created_at: Option<String>,
    pub last_login_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id_hex(),
            google_id: user.google_id,
            email: user.email,
            email_verified: user.email_verified,
            name: user.name,
            given_name: user.given_name,
            family_name: user.family_name,
            picture: user.picture,
            locale: user.locale,
            role: user.role,
            favorites: user.favorites,
            created_at: user.created_at.map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            last_login_at: user.last_login_at.map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 2048))]
    pub picture: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            name: req.name.map(|n| n.trim().to_string()),
            picture: req.picture.map(|p| p.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteResponse {
    pub ok: bool,
    pub is_favorite: bool,
}
