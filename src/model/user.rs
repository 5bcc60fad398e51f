use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

fn default_role() -> String {
    ROLE_USER.to_string()
}

/// A user as stored in the `users` collection.
///
/// Identity fields mirror the provider profile and are refreshed on every login.
/// `role` belongs to this application and is only ever written when the document
/// is first inserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub google_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
    #[serde(default)]
    pub last_login_at: Option<bson::DateTime>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn id_hex(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }
}

/// Profile fields taken from the identity provider on login.
///
/// `None` means the provider did not send the field; such fields are left
/// untouched in storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserIdentity {
    pub google_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
}

impl UserIdentity {
    /// The `$set` part of a login upsert. Never contains `role`.
    pub fn to_set_document(&self, now: bson::DateTime) -> bson::Document {
        let mut set = bson::doc! {
            "google_id": &self.google_id,
            "email_verified": self.email_verified,
            "updated_at": now,
            "last_login_at": now,
        };
        let optional = [
            ("email", &self.email),
            ("name", &self.name),
            ("given_name", &self.given_name),
            ("family_name", &self.family_name),
            ("picture", &self.picture),
            ("locale", &self.locale),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                set.insert(key, value.clone());
            }
        }
        set
    }
}

/// Self-service profile changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.picture.is_none()
    }
}
