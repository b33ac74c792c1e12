use crate::{
    auth::AuthUser,
    errors::ApiError,
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Resolves `(page, limit)` from optional query values using the configured bounds
pub fn page_params(state: &AppState, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1).max(1), state.config.clamp_page_size(limit))
}

/// Wraps a service `(items, total)` pair as a paginated success response
pub fn paginated_response<T: Serialize>(
    (items, total): (Vec<T>, u64),
    page: u64,
    limit: u64,
) -> Response {
    success_response(PaginatedResponse::new(items, total, page, limit))
}

/// Customer id carried by a storefront token
pub fn customer_id(user: &AuthUser) -> Result<Uuid, ApiError> {
    Ok(user.id()?)
}

pub fn validate_decimal_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
