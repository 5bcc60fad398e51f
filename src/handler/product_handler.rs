use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::app::state::AppState;
use crate::dto::product_dto::{
    AdminCatalog, AdminProductRow, CatalogPage, CatalogQuery, ListProductsQuery, Pagination,
    ProductCard, ProductCreatedResponse, ProductDetail, ProductEditView, ProductForm,
    ProductListResponse, ProductUpdatedResponse,
};
use crate::middlewares::session_middleware::CurrentUser;
use crate::model::product::NormalizedProduct;
use crate::service::product_service::PAGE_SIZE;
use crate::util::error::HandlerError;
use crate::util::upload::UploadedFile;

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, HandlerError> {
    field.text().await.map_err(|e| {
        error!("[read_product_form] Failed to read text field: {}", e);
        HandlerError::bad_request(format!("Failed to read form field: {}", e))
    })
}

/// Collects the product form fields; unknown fields are ignored.
pub async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm, HandlerError> {
    let mut form = ProductForm { price: "0".to_string(), ..Default::default() };
    let mut has_title = false;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("[read_product_form] Error getting next field: {}", e);
        HandlerError::bad_request(format!("Failed to get next field: {}", e))
    })? {
        let name = field.name().map(str::to_string).unwrap_or_default();
        debug!("[read_product_form] Processing field: {}", name);
        match name.as_str() {
            "title" => {
                form.title = read_text(field).await?;
                has_title = true;
            }
            "description" => form.description = read_text(field).await?,
            "price" => form.price = read_text(field).await?,
            "tags" => form.tags = read_text(field).await?,
            "kept_images" => form.kept_images.push(read_text(field).await?),
            "image_files" => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let bytes = field.bytes().await.map_err(|e| {
                    HandlerError::bad_request(format!("Failed to read file: {}", e))
                })?;
                debug!("[read_product_form] Received file: {} ({} bytes)", file_name, bytes.len());
                form.image_files.push(UploadedFile { file_name, bytes });
            }
            _ => {}
        }
    }
    if !has_title || form.title.trim().is_empty() {
        return Err(HandlerError::bad_request("Missing title"));
    }
    Ok(form)
}

pub async fn list_products_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, HandlerError> {
    let items = state.product_service.list_products(query.limit.unwrap_or(0)).await?;
    Ok(Json(ProductListResponse { items }))
}

pub async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NormalizedProduct>, HandlerError> {
    state
        .product_service
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| HandlerError::not_found("Product not found"))
}

pub async fn catalog_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPage>, HandlerError> {
    let page = state
        .product_service
        .catalog_page(query.page.unwrap_or(1), query.q.as_deref())
        .await?;
    let page_title = if page.query.is_empty() {
        "Catalog".to_string()
    } else {
        format!("Results for '{}'", page.query)
    };
    Ok(Json(CatalogPage {
        products: page.items.iter().map(ProductCard::from).collect(),
        page_title,
        pagination: Pagination::new(page.page, page.total, PAGE_SIZE as u64, &page.query),
        q: page.query,
    }))
}

pub async fn product_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>, HandlerError> {
    let product = state
        .product_service
        .get_product(&id)
        .await?
        .ok_or_else(|| HandlerError::not_found("Product not found"))?;
    Ok(Json(ProductDetail::from(&product)))
}

pub async fn manage_catalog_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Response, HandlerError> {
    if !current.is_admin() {
        return Ok(Redirect::to("/").into_response());
    }
    let products = state.product_service.admin_products().await?;
    let rows = products.iter().map(AdminProductRow::from).collect();
    Ok(Json(AdminCatalog { products: rows }).into_response())
}

pub async fn edit_product_form_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, HandlerError> {
    if !current.is_admin() {
        return Ok(Redirect::to("/").into_response());
    }
    let product = state
        .product_service
        .get_product(&id)
        .await?
        .ok_or_else(|| HandlerError::not_found("Product not found"))?;
    let view = ProductEditView {
        tags_csv: product.tags.join(", "),
        product: ProductDetail::from(&product),
    };
    Ok(Json(view).into_response())
}

pub async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let form = read_product_form(multipart).await?;
    let id = state.product_service.create_product(form).await?;
    info!(id = %id, "[create_product_handler] Product created");
    Ok((StatusCode::CREATED, Json(ProductCreatedResponse { status: "created", id })))
}

pub async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ProductUpdatedResponse>, HandlerError> {
    let form = read_product_form(multipart).await?;
    let outcome = state.product_service.update_product(&id, form).await?;
    Ok(Json(ProductUpdatedResponse {
        status: "updated",
        modified: outcome.modified > 0,
        matched: outcome.matched > 0,
    }))
}

pub async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, HandlerError> {
    state.product_service.delete_product(&id).await?;
    Ok(Redirect::to("/manage/catalog"))
}
