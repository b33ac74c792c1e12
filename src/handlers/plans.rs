use super::common::{
    created_response, no_content_response, page_params, paginated_response, success_response,
    validate_decimal_non_negative, validate_input, validate_not_blank,
};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    entities::plan::BillingCycle,
    errors::ApiError,
    services::plans::{CreatePlanInput, UpdatePlanInput},
    AppState, ListQuery,
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

pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/:id", get(get_plan))
        .with_ability(Action::Read, Subject::Plan);
    let create = Router::new()
        .route("/plans", post(create_plan))
        .with_ability(Action::Create, Subject::Plan);
    let update = Router::new()
        .route("/plans/:id", patch(update_plan))
        .with_ability(Action::Update, Subject::Plan);
    let remove = Router::new()
        .route("/plans/:id", delete(delete_plan))
        .with_ability(Action::Delete, Subject::Plan);
    read.merge(create).merge(update).merge(remove)
}

/// Public pricing page data
pub fn store_routes() -> Router<AppState> {
    Router::new().route("/plans", get(list_active_plans))
}

async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state.services.plans.list_plans(page, limit).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.plans.get_plan(id).await?))
}

async fn create_plan(
    State(state): State<AppState>,
    Json(payload): Json<PlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let plan = state
        .services
        .plans
        .create_plan(CreatePlanInput {
            name: payload.name.trim().to_string(),
            price: payload.price,
            billing_cycle: payload.billing_cycle,
            features: payload.features,
            is_active: payload.is_active,
        })
        .await?;
    Ok(created_response(plan))
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let plan = state
        .services
        .plans
        .update_plan(
            id,
            UpdatePlanInput {
                name: payload.name.map(|n| n.trim().to_string()),
                price: payload.price,
                billing_cycle: payload.billing_cycle,
                features: payload.features,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(success_response(plan))
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.plans.delete_plan(id).await?;
    Ok(no_content_response())
}

async fn list_active_plans(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.plans.list_active_plans().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlanRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_decimal_non_negative")]
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub features: Vec<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(custom = "validate_decimal_non_negative")]
    pub price: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
