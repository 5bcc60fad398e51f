use axum::{routing::{get, post, put}, middleware, Router};
use std::sync::Arc;

use crate::app::state::AppState;
use crate::handler::product_handler::{
    catalog_handler, create_product_handler, delete_product_handler, edit_product_form_handler,
    get_product_handler, list_products_handler, manage_catalog_handler, product_detail_handler,
    update_product_handler,
};
use crate::middlewares::admin_middleware::require_admin;

pub fn product_router(state: Arc<AppState>) -> Router {
    // Public catalog and product API
    let public = Router::new()
        .route("/", get(catalog_handler))
        .route("/api/v1/products", get(list_products_handler))
        .route("/api/v1/products/{id}", get(get_product_handler))
        .route("/product/{id}", get(product_detail_handler))
        // Admin pages redirect non-admins themselves
        .route("/manage/catalog", get(manage_catalog_handler))
        .route("/product/edit/{id}", get(edit_product_form_handler));

    // Admin-only mutations
    let admin = Router::new()
        .route("/product", post(create_product_handler))
        .route("/product/{id}", put(update_product_handler))
        .route("/product/delete/{id}", post(delete_product_handler))
        .route_layer(middleware::from_fn(require_admin));

    public.merge(admin).with_state(state)
}
