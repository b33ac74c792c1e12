use super::common::{created_response, success_response, validate_input};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    services::accounts::RegisterCustomerInput,
    AppState,
};
use axum::{
    extract::{Extension, Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Staff authentication under `/api/auth`
pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/login", post(staff_login));
    let authenticated = Router::new().route("/me", get(me)).with_auth();
    public.merge(authenticated)
}

/// Customer authentication under `/api/store/auth`
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_customer))
        .route("/auth/login", post(customer_login))
}

async fn staff_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let session = state
        .services
        .accounts
        .staff_login(&payload.email, &payload.password)
        .await?;
    Ok(success_response(session))
}

/// The caller's identity and resolved capabilities
async fn me(Extension(user): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    let ability = user.ability();
    Ok(success_response(json!({
        "id": user.user_id,
        "name": user.name,
        "email": user.email,
        "roles": user.roles,
        "permissions": user.permissions,
        "is_admin": user.is_admin(),
        "abilities": ability.describe(),
    })))
}

async fn register_customer(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let session = state
        .services
        .accounts
        .register_customer(RegisterCustomerInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            phone: payload.phone,
            address_line: payload.address_line,
            city: payload.city,
            state: payload.state,
            postal_code: payload.postal_code,
            country: payload.country,
        })
        .await?;
    Ok(created_response(session))
}

async fn customer_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let session = state
        .services
        .accounts
        .customer_login(&payload.email, &payload.password)
        .await?;
    Ok(success_response(session))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}
