use super::common::{created_response, customer_id, success_response, validate_input};
use crate::{
    auth::{AuthRouterExt, AuthUser, CUSTOMER_ROLE},
    errors::ApiError,
    services::payments::VerifyPaymentInput,
    AppState,
};
use axum::{
    extract::{Extension, Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/order", post(create_payment_order))
        .route("/payments/verify", post(verify_payment))
        .with_role(CUSTOMER_ROLE)
}

/// Returns what the client needs to open the gateway checkout widget
async fn create_payment_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PaymentOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .payments
        .create_payment_order(customer_id(&user)?, payload.order_id)
        .await?;
    Ok(created_response(order))
}

async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let verification = state
        .services
        .payments
        .verify_payment(
            customer_id(&user)?,
            VerifyPaymentInput {
                gateway_order_id: payload.gateway_order_id,
                gateway_payment_id: payload.gateway_payment_id,
                signature: payload.signature,
            },
        )
        .await?;
    Ok(success_response(verification))
}

#[derive(Debug, Deserialize)]
pub struct PaymentOrderRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, max = 100))]
    pub gateway_order_id: String,
    #[validate(length(min = 1, max = 100))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1, max = 256))]
    pub signature: String,
}
