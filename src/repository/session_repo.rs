use crate::model::session::Session;
use crate::repository::mongo::SESSIONS_COLLECTION;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: &Session) -> RepositoryResult<()>;
    async fn find(&self, id: &str) -> RepositoryResult<Option<Session>>;
    /// Returns the number of removed sessions (0 or 1).
    async fn delete(&self, id: &str) -> RepositoryResult<u64>;
}

pub struct MongoSessionRepository {
    collection: mongodb::Collection<Session>,
}

impl MongoSessionRepository {
    pub fn new(db: &Database) -> Self {
        MongoSessionRepository { collection: db.collection::<Session>(SESSIONS_COLLECTION) }
    }

    /// TTL index so MongoDB purges sessions that are never read again.
    pub async fn ensure_indexes(&self) {
        let index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder().expire_after(Duration::from_secs(0)).build())
            .build();
        if let Err(e) = self.collection.create_index(index, None).await {
            warn!("Could not create sessions TTL index: {}", e);
        }
    }
}

#[async_trait]
impl SessionRepository for MongoSessionRepository {
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn insert(&self, session: &Session) -> RepositoryResult<()> {
        match self.collection.insert_one(session, None).await {
            Ok(_) => {
                debug!("Session stored");
                Ok(())
            }
            Err(e) => {
                error!("Failed to store session: {}", e);
                Err(e.into())
            }
        }
    }

    async fn find(&self, id: &str) -> RepositoryResult<Option<Session>> {
        let session = self.collection.find_one(doc! { "_id": id }, None).await.map_err(|e| {
            error!("Failed to read session: {}", e);
            RepositoryError::database(format!("Failed to read session: {}", e))
        })?;
        Ok(session)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<u64> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await.map_err(|e| {
            error!("Failed to delete session: {}", e);
            RepositoryError::database(format!("Failed to delete session: {}", e))
        })?;
        Ok(result.deleted_count)
    }
}
