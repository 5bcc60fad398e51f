use serde::{Deserialize, Serialize};

use crate::model::product::{format_price, public_image_url, NormalizedProduct};
use crate::util::upload::UploadedFile;

pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";
pub const ADMIN_PLACEHOLDER_IMAGE: &str = "/static/images/product1.svg";

/// Product create/edit form as submitted by the admin UI.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub tags: String,
    /// Existing gallery entries to keep (edit only).
    pub kept_images: Vec<String>,
    pub image_files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub page: Option<u64>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListResponse {
    pub items: Vec<NormalizedProduct>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductCreatedResponse {
    pub status: &'static str,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductUpdatedResponse {
    pub status: &'static str,
    pub modified: bool,
    pub matched: bool,
}

/// One tile on the catalog page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price_fmt: String,
    pub image: String,
    pub is_new: bool,
    pub tags: Vec<String>,
}

impl From<&NormalizedProduct> for ProductCard {
    fn from(product: &NormalizedProduct) -> Self {
        ProductCard {
            id: product.id.clone(),
            name: product.name.clone(),
            price_fmt: format_price(product.price),
            image: product
                .cover()
                .map(public_image_url)
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            is_new: product.is_new,
            tags: product.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: u64,
    pub prev_page: u64,
    pub q: String,
}

impl Pagination {
    pub fn new(current_page: u64, total_items: u64, page_size: u64, q: &str) -> Self {
        let total_pages = if total_items == 0 || page_size == 0 {
            1
        } else {
            total_items.div_ceil(page_size)
        };
        Pagination {
            current_page,
            total_pages,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
            next_page: current_page.saturating_add(1),
            prev_page: current_page.saturating_sub(1),
            q: q.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub products: Vec<ProductCard>,
    pub page_title: String,
    pub pagination: Pagination,
    pub q: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

impl From<&NormalizedProduct> for ProductDetail {
    fn from(product: &NormalizedProduct) -> Self {
        let images: Vec<String> = product.gallery().iter().map(|i| public_image_url(i)).collect();
        ProductDetail {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            image: images.first().cloned(),
            images,
            tags: product.tags.clone(),
        }
    }
}

/// Row of the admin catalog table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
}

impl From<&NormalizedProduct> for AdminProductRow {
    fn from(product: &NormalizedProduct) -> Self {
        AdminProductRow {
            id: product.id.clone(),
            name: product.name.clone(),
            price: format!("${}", product.price),
            image: product
                .cover()
                .map(str::to_string)
                .unwrap_or_else(|| ADMIN_PLACEHOLDER_IMAGE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminCatalog {
    pub products: Vec<AdminProductRow>,
}

/// Edit form prefill: the normalized product with its full gallery.
#[derive(Debug, Clone, Serialize)]
pub struct ProductEditView {
    pub product: ProductDetail,
    pub tags_csv: String,
}
