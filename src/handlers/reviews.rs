use super::common::{
    created_response, customer_id, no_content_response, page_params, paginated_response,
    success_response, validate_input,
};
use crate::{
    auth::{Action, AuthRouterExt, AuthUser, Subject, CUSTOMER_ROLE},
    errors::ApiError,
    services::reviews::{ReviewFilter, SubmitReviewInput},
    AppState, ListQuery,
};
use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Moderation queue
pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews/:id", get(get_review))
        .with_ability(Action::Read, Subject::Review);
    let moderate = Router::new()
        .route("/reviews/:id", patch(moderate_review))
        .with_ability(Action::Update, Subject::Review);
    let remove = Router::new()
        .route("/reviews/:id", delete(delete_review))
        .with_ability(Action::Delete, Subject::Review);
    read.merge(moderate).merge(remove)
}

pub fn store_routes() -> Router<AppState> {
    let public = Router::new().route("/products/:id/reviews", get(list_product_reviews));
    let submit = Router::new()
        .route("/products/:id/reviews", post(submit_review))
        .with_role(CUSTOMER_ROLE);
    public.merge(submit)
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let filter = ReviewFilter {
        product_id: query.product_id,
        approved: query.approved,
    };
    let result = state.services.reviews.list_reviews(page, limit, filter).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.reviews.get_review(id).await?))
}

async fn moderate_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .services
        .reviews
        .moderate_review(id, payload.is_approved)
        .await?;
    Ok(success_response(review))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.reviews.delete_review(id).await?;
    Ok(no_content_response())
}

/// Only approved reviews are visible on the storefront
async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .reviews
        .list_approved_for_product(product_id, page, limit)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn submit_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let review = state
        .services
        .reviews
        .submit_review(
            customer_id(&user)?,
            product_id,
            SubmitReviewInput {
                rating: payload.rating,
                title: payload.title,
                comment: payload.comment,
            },
        )
        .await?;
    Ok(created_response(review))
}

#[derive(Debug, Deserialize, Default)]
pub struct ReviewListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub product_id: Option<Uuid>,
    pub approved: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ModerateReviewRequest {
    pub is_approved: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    pub rating: i32,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub comment: Option<String>,
}
