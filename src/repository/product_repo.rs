use crate::repository::mongo::id_filter;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, Bson, Document, Regex};
use futures::stream::StreamExt;
use mongodb::options::FindOptions;
use mongodb::Database;
use tracing::{error, info, instrument, warn};

/// Outcome of an update: whether anything matched, and whether it changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Newest first, one page at a time. `page` starts at 1.
    async fn list(&self, page: u64, page_size: i64) -> RepositoryResult<Vec<Document>>;
    /// Newest first, at most `limit` documents; 0 means no limit.
    async fn list_limited(&self, limit: i64) -> RepositoryResult<Vec<Document>>;
    async fn count(&self) -> RepositoryResult<u64>;
    async fn search(&self, query: &str, page: u64, page_size: i64) -> RepositoryResult<Vec<Document>>;
    async fn count_search(&self, query: &str) -> RepositoryResult<u64>;
    async fn find(&self, id: &str) -> RepositoryResult<Option<Document>>;
    /// Returns the new document's id.
    async fn insert(&self, product: Document) -> RepositoryResult<String>;
    async fn update(&self, id: &str, set: Document) -> RepositoryResult<UpdateOutcome>;
    async fn delete(&self, id: &str) -> RepositoryResult<u64>;
}

/// Case-insensitive substring match over name, description and both tag fields.
pub fn search_filter(query: &str) -> Document {
    let query = query.trim();
    if query.is_empty() {
        return Document::new();
    }
    let regex = Bson::RegularExpression(Regex {
        pattern: regex::escape(query),
        options: "i".to_string(),
    });
    doc! {
        "$or": [
            { "name": regex.clone() },
            { "description": regex.clone() },
            { "tags": regex.clone() },
            { "ia_tags.tags": regex },
        ]
    }
}

/// Clamped to `i64::MAX`; the server rejects anything larger.
fn skip_for(page: u64, page_size: i64) -> u64 {
    (page.max(1) - 1)
        .saturating_mul(page_size.max(0) as u64)
        .min(i64::MAX as u64)
}

pub struct MongoProductRepository {
    collection: mongodb::Collection<Document>,
}

impl MongoProductRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        MongoProductRepository { collection: db.collection::<Document>(collection_name) }
    }

    async fn find_sorted(&self, filter: Document, options: FindOptions) -> RepositoryResult<Vec<Document>> {
        let mut cursor = self.collection.find(filter, options).await.map_err(|e| {
            error!("Failed to query products: {}", e);
            RepositoryError::database(format!("Failed to query products: {}", e))
        })?;
        let mut products = Vec::new();
        while let Some(product) = cursor.next().await {
            match product {
                Ok(p) => products.push(p),
                Err(e) => {
                    error!("Failed to read product: {}", e);
                    return Err(RepositoryError::serialization(format!("Failed to read product: {}", e)));
                }
            }
        }
        Ok(products)
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn list(&self, page: u64, page_size: i64) -> RepositoryResult<Vec<Document>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip_for(page, page_size))
            .limit(page_size)
            .build();
        self.find_sorted(Document::new(), options).await
    }

    #[instrument(skip(self))]
    async fn list_limited(&self, limit: i64) -> RepositoryResult<Vec<Document>> {
        let mut options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        if limit > 0 {
            options.limit = Some(limit);
        }
        self.find_sorted(Document::new(), options).await
    }

    async fn count(&self) -> RepositoryResult<u64> {
        self.collection.count_documents(None, None).await.map_err(|e| {
            error!("Failed to count products: {}", e);
            RepositoryError::database(format!("Failed to count products: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, page: u64, page_size: i64) -> RepositoryResult<Vec<Document>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip_for(page, page_size))
            .limit(page_size)
            .build();
        self.find_sorted(search_filter(query), options).await
    }

    async fn count_search(&self, query: &str) -> RepositoryResult<u64> {
        self.collection.count_documents(search_filter(query), None).await.map_err(|e| {
            error!("Failed to count search results: {}", e);
            RepositoryError::database(format!("Failed to count search results: {}", e))
        })
    }

    async fn find(&self, id: &str) -> RepositoryResult<Option<Document>> {
        self.collection.find_one(id_filter(id), None).await.map_err(|e| {
            RepositoryError::database(format!("Failed to fetch product: {}", e))
        })
    }

    #[instrument(skip(self, product))]
    async fn insert(&self, product: Document) -> RepositoryResult<String> {
        let result = self.collection.insert_one(product, None).await.map_err(|e| {
            error!("Failed to create product: {}", e);
            RepositoryError::database(format!("Failed to create product: {}", e))
        })?;
        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        info!(id = %id, "Product created");
        Ok(id)
    }

    #[instrument(skip(self, set))]
    async fn update(&self, id: &str, set: Document) -> RepositoryResult<UpdateOutcome> {
        let result = self
            .collection
            .update_one(id_filter(id), doc! { "$set": set }, None)
            .await
            .map_err(|e| {
                error!("Failed to update product {}: {}", id, e);
                RepositoryError::database(format!("Failed to update product: {}", e))
            })?;
        if result.matched_count == 0 {
            warn!("Update failed: product {} not found", id);
        } else if result.modified_count == 0 {
            info!("Product {} matched but payload was identical", id);
        }
        Ok(UpdateOutcome { matched: result.matched_count, modified: result.modified_count })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> RepositoryResult<u64> {
        let result = self.collection.delete_one(id_filter(id), None).await.map_err(|e| {
            error!("Failed to delete product: {}", e);
            RepositoryError::database(format!("Failed to delete product: {}", e))
        })?;
        Ok(result.deleted_count)
    }
}
