//! Customer-only storefront actions: cart, likes and checkout.

use super::common::{
    created_response, customer_id, no_content_response, success_response, validate_input,
};
use crate::{
    auth::{AuthRouterExt, AuthUser, CUSTOMER_ROLE},
    errors::ApiError,
    services::checkout::CheckoutInput,
    AppState,
};
use axum::{
    extract::{Extension, Json, Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart).post(add_to_cart).delete(clear_cart))
        .route(
            "/cart/:product_id",
            patch(set_cart_quantity).delete(remove_from_cart),
        )
        .route("/likes", get(list_likes))
        .route("/likes/:product_id", post(like_product).delete(unlike_product))
        .route("/checkout", post(checkout))
        .with_role(CUSTOMER_ROLE)
}

// Cart

async fn view_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.cart.view_cart(customer_id(&user)?).await?;
    Ok(success_response(cart))
}

async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let cart = state
        .services
        .cart
        .add_item(customer_id(&user)?, payload.product_id, payload.quantity)
        .await?;
    Ok(success_response(cart))
}

async fn set_cart_quantity(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<CartQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let cart = state
        .services
        .cart
        .set_quantity(customer_id(&user)?, product_id, payload.quantity)
        .await?;
    Ok(success_response(cart))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .remove_item(customer_id(&user)?, product_id)
        .await?;
    Ok(success_response(cart))
}

async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.cart.clear(customer_id(&user)?).await?;
    Ok(no_content_response())
}

// Likes

async fn list_likes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .likes
        .liked_products(customer_id(&user)?)
        .await?;
    Ok(success_response(products))
}

async fn like_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state
        .services
        .likes
        .like(customer_id(&user)?, product_id)
        .await?;
    Ok(created_response(like))
}

async fn unlike_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .likes
        .unlike(customer_id(&user)?, product_id)
        .await?;
    Ok(no_content_response())
}

// Checkout

async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let details = state
        .services
        .checkout
        .checkout(
            customer_id(&user)?,
            CheckoutInput {
                shipping_address: payload.shipping_address,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(created_response(details))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct CartQuantityRequest {
    #[validate(range(min = 0, max = 1000))]
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(max = 1000))]
    pub shipping_address: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
