use super::common::{
    created_response, no_content_response, page_params, paginated_response, success_response,
    validate_input, validate_not_blank,
};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    errors::ApiError,
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
    AppState, ListQuery,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/:id", get(get_customer))
        .with_ability(Action::Read, Subject::Customer);

    let create = Router::new()
        .route("/customers", post(create_customer))
        .with_ability(Action::Create, Subject::Customer);

    let update = Router::new()
        .route("/customers/:id", patch(update_customer))
        .with_ability(Action::Update, Subject::Customer);

    let remove = Router::new()
        .route("/customers/:id", delete(delete_customer))
        .with_ability(Action::Delete, Subject::Customer);

    read.merge(create).merge(update).merge(remove)
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .customers
        .list_customers(page, limit, query.search)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(success_response(customer))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let customer = state
        .services
        .customers
        .create_customer(CreateCustomerInput {
            name: payload.name.trim().to_string(),
            email: payload.email,
            password: None,
            phone: payload.phone,
            address_line: payload.address_line,
            city: payload.city,
            state: payload.state,
            postal_code: payload.postal_code,
            country: payload.country,
        })
        .await?;
    Ok(created_response(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let customer = state
        .services
        .customers
        .update_customer(
            id,
            UpdateCustomerInput {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                address_line: payload.address_line,
                city: payload.city,
                state: payload.state,
                postal_code: payload.postal_code,
                country: payload.country,
            },
        )
        .await?;
    Ok(success_response(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.customers.delete_customer(id).await?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    pub country: Option<String>,
}
