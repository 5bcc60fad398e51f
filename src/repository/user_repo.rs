use crate::model::user::{ProfileUpdate, User, UserIdentity};
use crate::repository::mongo::{id_filter, USERS_COLLECTION};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Database, IndexModel};
use tracing::{error, info, instrument, warn};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts or refreshes the user keyed by `identity.google_id`.
    ///
    /// `role_on_insert` is written only when the document is created; an
    /// existing user's role is never touched.
    async fn upsert_identity(&self, identity: &UserIdentity, role_on_insert: &str) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>>;
    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> RepositoryResult<Option<User>>;
    /// Adds or removes `product_id` from the favorites; returns whether it is now a favorite.
    async fn toggle_favorite(&self, id: &str, product_id: &str) -> RepositoryResult<bool>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        MongoUserRepository { collection: db.collection::<User>(USERS_COLLECTION) }
    }

    /// Unique indexes on `google_id` and `email`. Failures are logged, not fatal.
    pub async fn ensure_indexes(&self) {
        let indexes = [
            IndexModel::builder()
                .keys(doc! { "google_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build(),
        ];
        for index in indexes {
            if let Err(e) = self.collection.create_index(index, None).await {
                warn!("Could not create users index: {}", e);
            }
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, identity), fields(google_id = %identity.google_id))]
    async fn upsert_identity(&self, identity: &UserIdentity, role_on_insert: &str) -> RepositoryResult<User> {
        let now = bson::DateTime::now();
        let filter = doc! { "google_id": &identity.google_id };
        let update = doc! {
            "$set": identity.to_set_document(now),
            "$setOnInsert": {
                "role": role_on_insert,
                "favorites": [],
                "created_at": now,
            },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let result = self.collection.find_one_and_update(filter, update, options).await;
        match result {
            Ok(Some(user)) => {
                info!(role = %user.role, "User identity upserted");
                Ok(user)
            }
            Ok(None) => {
                error!("Upsert returned no document");
                Err(RepositoryError::database("Upsert returned no document"))
            }
            Err(e) => {
                error!("Failed to upsert user: {}", e);
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let user = self.collection.find_one(id_filter(id), None).await.map_err(|e| {
            error!("Failed to find user by id: {}", e);
            RepositoryError::database(format!("Failed to find user by id: {}", e))
        })?;
        Ok(user)
    }

    #[instrument(skip(self, update), fields(id = %id))]
    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> RepositoryResult<Option<User>> {
        let mut set = doc! { "updated_at": bson::DateTime::now() };
        if let Some(ref name) = update.name {
            set.insert("name", name.clone());
        }
        if let Some(ref picture) = update.picture {
            set.insert("picture", picture.clone());
        }
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let user = self
            .collection
            .find_one_and_update(id_filter(id), doc! { "$set": set }, options)
            .await
            .map_err(|e| {
                error!("Failed to update user profile: {}", e);
                RepositoryError::database(format!("Failed to update user profile: {}", e))
            })?;
        Ok(user)
    }

    #[instrument(skip(self), fields(id = %id, product_id = %product_id))]
    async fn toggle_favorite(&self, id: &str, product_id: &str) -> RepositoryResult<bool> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("User not found for ID: {}", id)))?;
        let is_favorite = !user.favorites.iter().any(|f| f == product_id);
        let update = if is_favorite {
            doc! { "$addToSet": { "favorites": product_id } }
        } else {
            doc! { "$pull": { "favorites": product_id } }
        };
        self.collection.update_one(id_filter(id), update, None).await.map_err(|e| {
            RepositoryError::database(format!("Failed to toggle favorite: {}", e))
        })?;
        info!(is_favorite, "Favorite toggled");
        Ok(is_favorite)
    }
}
