use super::common::{
    created_response, no_content_response, page_params, paginated_response, success_response,
    validate_decimal_non_negative, validate_input, validate_not_blank,
};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    errors::ApiError,
    services::products::{CreateProductInput, ProductFilter, UpdateProductInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Vendor catalog management
pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .with_ability(Action::Read, Subject::Product);

    let create = Router::new()
        .route("/products", post(create_product))
        .with_ability(Action::Create, Subject::Product);

    let update = Router::new()
        .route("/products/:id", patch(update_product))
        .with_ability(Action::Update, Subject::Product);

    let remove = Router::new()
        .route("/products/:id", delete(delete_product))
        .with_ability(Action::Delete, Subject::Product);

    read.merge(create).merge(update).merge(remove)
}

/// Public storefront catalog
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_active_products))
        .route("/products/:id", get(get_active_product))
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let filter = ProductFilter {
        search: query.search,
        category: query.category,
        active_only: query.active_only.unwrap_or(false),
    };
    let result = state.services.products.list_products(page, limit, filter).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(product))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state
        .services
        .products
        .create_product(CreateProductInput {
            name: payload.name.trim().to_string(),
            slug: payload.slug,
            description: payload.description,
            sku: payload.sku.trim().to_string(),
            price: payload.price,
            stock: payload.stock,
            category: payload.category,
            image_url: payload.image_url,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    Ok(created_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state
        .services
        .products
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name.map(|n| n.trim().to_string()),
                slug: payload.slug,
                description: payload.description,
                sku: payload.sku.map(|s| s.trim().to_string()),
                price: payload.price,
                stock: payload.stock,
                category: payload.category,
                image_url: payload.image_url,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete_product(id).await?;
    Ok(no_content_response())
}

async fn list_active_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let filter = ProductFilter {
        search: query.search,
        category: query.category,
        active_only: true,
    };
    let result = state.services.products.list_products(page, limit, filter).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_active_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get_active_product(id).await?;
    Ok(success_response(product))
}

#[derive(Debug, Deserialize, Default)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64), custom = "validate_not_blank")]
    pub sku: String,
    #[validate(custom = "validate_decimal_non_negative")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64), custom = "validate_not_blank")]
    pub sku: Option<String>,
    #[validate(custom = "validate_decimal_non_negative")]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}
