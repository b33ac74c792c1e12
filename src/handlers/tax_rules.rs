use super::common::{
    created_response, no_content_response, page_params, paginated_response, success_response,
    validate_input, validate_not_blank,
};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    errors::ApiError,
    services::tax_rules::{CreateTaxRuleInput, UpdateTaxRuleInput},
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
        .route("/tax-rules", get(list_tax_rules))
        .route("/tax-rules/:id", get(get_tax_rule))
        .with_ability(Action::Read, Subject::TaxRule);
    let create = Router::new()
        .route("/tax-rules", post(create_tax_rule))
        .with_ability(Action::Create, Subject::TaxRule);
    let update = Router::new()
        .route("/tax-rules/:id", patch(update_tax_rule))
        .with_ability(Action::Update, Subject::TaxRule);
    let remove = Router::new()
        .route("/tax-rules/:id", delete(delete_tax_rule))
        .with_ability(Action::Delete, Subject::TaxRule);
    read.merge(create).merge(update).merge(remove)
}

async fn list_tax_rules(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state.services.tax_rules.list_tax_rules(page, limit).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_tax_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.tax_rules.get_tax_rule(id).await?))
}

async fn create_tax_rule(
    State(state): State<AppState>,
    Json(payload): Json<TaxRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let rule = state
        .services
        .tax_rules
        .create_tax_rule(CreateTaxRuleInput {
            state: payload.state,
            rate: payload.rate,
            description: payload.description,
            is_active: payload.is_active,
        })
        .await?;
    Ok(created_response(rule))
}

async fn update_tax_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaxRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let rule = state
        .services
        .tax_rules
        .update_tax_rule(
            id,
            UpdateTaxRuleInput {
                state: payload.state,
                rate: payload.rate,
                description: payload.description,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(success_response(rule))
}

async fn delete_tax_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.tax_rules.delete_tax_rule(id).await?;
    Ok(no_content_response())
}

/// `rate` is a percentage; the 0 to 100 bound is enforced by the service
#[derive(Debug, Deserialize, Validate)]
pub struct TaxRuleRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub state: String,
    pub rate: Decimal,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaxRuleRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub state: Option<String>,
    pub rate: Option<Decimal>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
