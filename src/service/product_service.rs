use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::dto::product_dto::ProductForm;
use crate::model::product::{clean_price, parse_tags, NormalizedProduct, ProductDraft};
use crate::repository::product_repo::{ProductRepository, UpdateOutcome};
use crate::util::error::ServiceError;
use crate::util::upload::UploadStore;

pub const PAGE_SIZE: i64 = 12;
pub const ADMIN_LIST_LIMIT: i64 = 100;

/// One page of catalog results.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<NormalizedProduct>,
    pub page: u64,
    pub total: u64,
    pub query: String,
}

#[async_trait]
pub trait ProductService: Send + Sync {
    /// Newest first; `limit == 0` returns everything.
    async fn list_products(&self, limit: i64) -> Result<Vec<NormalizedProduct>, ServiceError>;
    /// Catalog page, searching when `query` is non-blank.
    async fn catalog_page(&self, page: u64, query: Option<&str>) -> Result<ProductPage, ServiceError>;
    async fn admin_products(&self) -> Result<Vec<NormalizedProduct>, ServiceError>;
    async fn get_product(&self, id: &str) -> Result<Option<NormalizedProduct>, ServiceError>;
    async fn create_product(&self, form: ProductForm) -> Result<String, ServiceError>;
    async fn update_product(&self, id: &str, form: ProductForm) -> Result<UpdateOutcome, ServiceError>;
    async fn delete_product(&self, id: &str) -> Result<bool, ServiceError>;
}

pub struct ProductServiceImpl {
    product_repo: Arc<dyn ProductRepository>,
    uploads: UploadStore,
}

impl ProductServiceImpl {
    pub fn new(product_repo: Arc<dyn ProductRepository>, uploads: UploadStore) -> Self {
        Self { product_repo, uploads }
    }

    fn draft_from(form: &ProductForm, images: Vec<String>) -> Result<ProductDraft, ServiceError> {
        let name = form.title.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("Product title is required".to_string()));
        }
        Ok(ProductDraft {
            name: name.to_string(),
            description: form.description.trim().to_string(),
            price: clean_price(&form.price),
            tags: parse_tags(&form.tags),
            images,
        })
    }
}

/// Kept images followed by new uploads, blanks and repeats dropped.
pub fn merge_gallery(kept: &[String], uploaded: &[String]) -> Vec<String> {
    let mut gallery: Vec<String> = Vec::with_capacity(kept.len() + uploaded.len());
    for img in kept.iter().chain(uploaded) {
        let img = img.trim();
        if !img.is_empty() && !gallery.iter().any(|g| g == img) {
            gallery.push(img.to_string());
        }
    }
    gallery
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    async fn list_products(&self, limit: i64) -> Result<Vec<NormalizedProduct>, ServiceError> {
        let docs = self.product_repo.list_limited(limit.max(0)).await?;
        Ok(docs.iter().map(NormalizedProduct::from_document).collect())
    }

    #[instrument(skip(self))]
    async fn catalog_page(&self, page: u64, query: Option<&str>) -> Result<ProductPage, ServiceError> {
        let page = page.max(1);
        let query = query.map(str::trim).unwrap_or_default();
        let (docs, total) = if query.is_empty() {
            (
                self.product_repo.list(page, PAGE_SIZE).await?,
                self.product_repo.count().await?,
            )
        } else {
            (
                self.product_repo.search(query, page, PAGE_SIZE).await?,
                self.product_repo.count_search(query).await?,
            )
        };
        Ok(ProductPage {
            items: docs.iter().map(NormalizedProduct::from_document).collect(),
            page,
            total,
            query: query.to_string(),
        })
    }

    async fn admin_products(&self) -> Result<Vec<NormalizedProduct>, ServiceError> {
        self.list_products(ADMIN_LIST_LIMIT).await
    }

    async fn get_product(&self, id: &str) -> Result<Option<NormalizedProduct>, ServiceError> {
        let doc = self.product_repo.find(id).await?;
        Ok(doc.as_ref().map(NormalizedProduct::from_document))
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    async fn create_product(&self, form: ProductForm) -> Result<String, ServiceError> {
        // Validate before touching the disk.
        Self::draft_from(&form, Vec::new())?;
        let saved = self.uploads.save_product_images(&form.image_files).await;
        let draft = Self::draft_from(&form, saved)?;
        let id = self
            .product_repo
            .insert(draft.to_document(bson::DateTime::now(), true))
            .await
            .map_err(|e| {
                error!("Failed to create product: {e}");
                ServiceError::from(e)
            })?;
        info!(id = %id, "Product created");
        Ok(id)
    }

    #[instrument(skip(self, form), fields(title = %form.title))]
    async fn update_product(&self, id: &str, form: ProductForm) -> Result<UpdateOutcome, ServiceError> {
        Self::draft_from(&form, Vec::new())?;
        let uploaded = self.uploads.save_product_images(&form.image_files).await;
        let draft = Self::draft_from(&form, merge_gallery(&form.kept_images, &uploaded))?;
        let outcome = self
            .product_repo
            .update(id, draft.to_document(bson::DateTime::now(), false))
            .await?;
        if outcome.matched == 0 {
            warn!("Update matched no product");
            return Err(ServiceError::NotFound(format!("Product not found: {}", id)));
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: &str) -> Result<bool, ServiceError> {
        let deleted = self.product_repo.delete(id).await?;
        if deleted == 0 {
            warn!("Delete matched no product");
        }
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryProductRepository;
    use bson::doc;

    fn service() -> (Arc<InMemoryProductRepository>, ProductServiceImpl) {
        let repo = Arc::new(InMemoryProductRepository::new());
        let dir = std::env::temp_dir().join(format!("catalog-svc-{}", uuid::Uuid::new_v4()));
        (repo.clone(), ProductServiceImpl::new(repo, UploadStore::new(dir)))
    }

    fn form(title: &str) -> ProductForm {
        ProductForm {
            title: title.to_string(),
            description: "  Roble macizo ".to_string(),
            price: "💰70.000".to_string(),
            tags: "madera, sala, madera".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_gallery_keeps_order() {
        let kept = vec!["/a.png".to_string(), "".to_string(), "/b.png".to_string()];
        let uploaded = vec!["/b.png".to_string(), "/c.png".to_string()];
        assert_eq!(merge_gallery(&kept, &uploaded), vec!["/a.png", "/b.png", "/c.png"]);
    }

    #[tokio::test]
    async fn test_create_product_normalizes_form() {
        let (repo, service) = service();
        let id = service.create_product(form(" Silla ")).await.unwrap();
        let stored = repo.find(&id).await.unwrap().unwrap();
        assert_eq!(stored.get_str("name").unwrap(), "Silla");
        assert_eq!(stored.get_str("description").unwrap(), "Roble macizo");
        assert_eq!(stored.get_i64("price").unwrap(), 70000);
        assert_eq!(stored.get_str("category").unwrap(), "madera");
        assert!(stored.contains_key("created_at"));
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let (_, service) = service();
        let err = service.create_product(form("   ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let (_, service) = service();
        let err = service
            .update_product(&bson::oid::ObjectId::new().to_hex(), form("Mesa"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_sets_cover_from_kept_images() {
        let (repo, service) = service();
        let id = repo.seed(doc! { "name": "Mesa", "created_at": bson::DateTime::now() }).unwrap();
        let mut update = form("Mesa");
        update.kept_images = vec!["/static/uploads/2.png".into(), "/static/uploads/1.png".into()];
        service.update_product(&id, update).await.unwrap();

        let product = service.get_product(&id).await.unwrap().unwrap();
        assert_eq!(product.image.as_deref(), Some("/static/uploads/2.png"));
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.tags, vec!["madera", "sala"]);
    }

    #[tokio::test]
    async fn test_catalog_page_search_and_count() {
        let (repo, service) = service();
        for i in 0..14 {
            repo.seed(doc! { "name": format!("Silla {}", i) }).unwrap();
        }
        repo.seed(doc! { "name": "Mesa" }).unwrap();

        let page = service.catalog_page(2, Some("silla")).await.unwrap();
        assert_eq!(page.total, 14);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.query, "silla");

        let all = service.catalog_page(0, None).await.unwrap();
        assert_eq!(all.page, 1);
        assert_eq!(all.items.len(), PAGE_SIZE as usize);
        assert_eq!(all.total, 15);
    }
}
