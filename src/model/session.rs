use bson::Document;
use serde::{Deserialize, Serialize};

/// Provider tokens kept on the session so logout can revoke them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

impl SessionMeta {
    pub fn with_tokens(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        SessionMeta { access_token, refresh_token, extra: Document::new() }
    }

    /// The refresh token outlives the access token, so it is the one worth revoking.
    pub fn token_to_revoke(&self) -> Option<&str> {
        fn non_empty(token: &Option<String>) -> Option<&str> {
            token.as_deref().filter(|t| !t.is_empty())
        }
        non_empty(&self.refresh_token).or_else(|| non_empty(&self.access_token))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub created_at: bson::DateTime,
    pub expires_at: bson::DateTime,
    #[serde(default)]
    pub meta: SessionMeta,
}

impl Session {
    pub fn is_expired_at(&self, now: bson::DateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_refresh_token() {
        let meta = SessionMeta::with_tokens(Some("access".into()), Some("refresh".into()));
        assert_eq!(meta.token_to_revoke(), Some("refresh"));

        let meta = SessionMeta::with_tokens(Some("access".into()), None);
        assert_eq!(meta.token_to_revoke(), Some("access"));

        assert_eq!(SessionMeta::default().token_to_revoke(), None);
    }

    #[test]
    fn test_meta_keeps_unknown_keys() {
        let meta: SessionMeta = bson::from_document(bson::doc! {
            "access_token": "a",
            "ip": "10.0.0.1",
        })
        .unwrap();
        assert_eq!(meta.access_token.as_deref(), Some("a"));
        assert_eq!(meta.extra.get_str("ip").unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_expiry_boundary() {
        let now = bson::DateTime::now();
        let session = Session {
            id: "s".into(),
            user_id: "u".into(),
            created_at: now,
            expires_at: now,
            meta: SessionMeta::default(),
        };
        assert!(session.is_expired_at(now));
    }
}
