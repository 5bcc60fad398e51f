use bson::{doc, oid::ObjectId, Document};
use mongodb::{options::{ClientOptions, Credential, ResolverConfig}, Client, Database};
use tracing::{info, instrument, warn};

use crate::config::mongo_conf::MongoConfig;

pub const USERS_COLLECTION: &str = "users";
pub const SESSIONS_COLLECTION: &str = "sessions";

/// Opens a pooled client and returns the configured database.
#[instrument(skip(config), fields(database = %config.database))]
pub async fn connect(config: &MongoConfig) -> Result<Database, mongodb::error::Error> {
    let mut client_options =
        ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
    client_options.app_name = Some("CatalogBackend".to_string());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));
    if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
        client_options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }
    let client = Client::with_options(client_options)?;
    info!("MongoDB client created");
    Ok(client.database(&config.database))
}

/// Filter for a document addressed by id.
///
/// Ids are normally hex ObjectIds; anything else is matched against a string
/// `id` field, which older imports used.
pub fn id_filter(raw: &str) -> Document {
    let clean = raw.trim();
    match ObjectId::parse_str(clean) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => {
            warn!(id = %clean, "Not an ObjectId, falling back to the 'id' field");
            doc! { "id": clean }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_filter_object_id() {
        let oid = ObjectId::new();
        let filter = id_filter(&format!("  {} ", oid.to_hex()));
        assert_eq!(filter.get_object_id("_id").unwrap(), oid);
    }

    #[test]
    fn test_id_filter_fallback() {
        let filter = id_filter("legacy-7");
        assert_eq!(filter.get_str("id").unwrap(), "legacy-7");
        assert!(!filter.contains_key("_id"));
    }
}
