use super::common::{
    created_response, customer_id, no_content_response, page_params, paginated_response,
    success_response, validate_decimal_non_negative, validate_input, validate_not_blank,
};
use crate::{
    auth::{Action, AuthRouterExt, AuthUser, Subject, CUSTOMER_ROLE},
    entities::{
        complaint::ComplaintStatus, refund_request::RefundStatus, return_request::ReturnStatus,
    },
    errors::ApiError,
    services::{
        complaints::{CreateComplaintInput, UpdateComplaintInput},
        refunds::{CreateRefundInput, UpdateRefundInput},
        returns::{CreateReturnInput, UpdateReturnInput},
    },
    AppState,
};
use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Complaints, returns and refunds desk
pub fn vendor_routes() -> Router<AppState> {
    complaint_routes().merge(return_routes()).merge(refund_routes())
}

/// Customers file complaints against their own account
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/complaints", post(file_complaint))
        .with_role(CUSTOMER_ROLE)
}

fn complaint_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/complaints", get(list_complaints))
        .route("/complaints/:id", get(get_complaint))
        .with_ability(Action::Read, Subject::Complaint);
    let create = Router::new()
        .route("/complaints", post(create_complaint))
        .with_ability(Action::Create, Subject::Complaint);
    let update = Router::new()
        .route("/complaints/:id", patch(update_complaint))
        .with_ability(Action::Update, Subject::Complaint);
    let remove = Router::new()
        .route("/complaints/:id", delete(delete_complaint))
        .with_ability(Action::Delete, Subject::Complaint);
    read.merge(create).merge(update).merge(remove)
}

fn return_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/returns", get(list_returns))
        .route("/returns/:id", get(get_return))
        .with_ability(Action::Read, Subject::ReturnRequest);
    let create = Router::new()
        .route("/returns", post(create_return))
        .with_ability(Action::Create, Subject::ReturnRequest);
    let update = Router::new()
        .route("/returns/:id", patch(update_return))
        .with_ability(Action::Update, Subject::ReturnRequest);
    let remove = Router::new()
        .route("/returns/:id", delete(delete_return))
        .with_ability(Action::Delete, Subject::ReturnRequest);
    read.merge(create).merge(update).merge(remove)
}

fn refund_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/refunds", get(list_refunds))
        .route("/refunds/:id", get(get_refund))
        .with_ability(Action::Read, Subject::RefundRequest);
    let create = Router::new()
        .route("/refunds", post(create_refund))
        .with_ability(Action::Create, Subject::RefundRequest);
    let update = Router::new()
        .route("/refunds/:id", patch(update_refund))
        .with_ability(Action::Update, Subject::RefundRequest);
    let remove = Router::new()
        .route("/refunds/:id", delete(delete_refund))
        .with_ability(Action::Delete, Subject::RefundRequest);
    read.merge(create).merge(update).merge(remove)
}

// Complaints

async fn list_complaints(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery<ComplaintStatus>>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .complaints
        .list_complaints(page, limit, query.status)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_complaint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.complaints.get_complaint(id).await?))
}

async fn create_complaint(
    State(state): State<AppState>,
    Json(payload): Json<VendorComplaintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let complaint = state
        .services
        .complaints
        .create_complaint(CreateComplaintInput {
            customer_id: payload.customer_id,
            order_id: payload.complaint.order_id,
            subject: payload.complaint.subject,
            message: payload.complaint.message,
        })
        .await?;
    Ok(created_response(complaint))
}

async fn file_complaint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ComplaintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let complaint = state
        .services
        .complaints
        .create_complaint(CreateComplaintInput {
            customer_id: customer_id(&user)?,
            order_id: payload.order_id,
            subject: payload.subject,
            message: payload.message,
        })
        .await?;
    Ok(created_response(complaint))
}

async fn update_complaint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateComplaintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let complaint = state
        .services
        .complaints
        .update_complaint(
            id,
            UpdateComplaintInput {
                subject: payload.subject,
                message: payload.message,
                status: payload.status,
                resolution: payload.resolution,
            },
        )
        .await?;
    Ok(success_response(complaint))
}

async fn delete_complaint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.complaints.delete_complaint(id).await?;
    Ok(no_content_response())
}

// Returns

async fn list_returns(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery<ReturnStatus>>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .returns
        .list_returns(page, limit, query.status)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.returns.get_return(id).await?))
}

async fn create_return(
    State(state): State<AppState>,
    Json(payload): Json<ReturnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let request = state
        .services
        .returns
        .create_return(CreateReturnInput {
            order_id: payload.order_id,
            order_item_id: payload.order_item_id,
            reason: payload.reason,
            quantity: payload.quantity,
        })
        .await?;
    Ok(created_response(request))
}

async fn update_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReturnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let request = state
        .services
        .returns
        .update_return(
            id,
            UpdateReturnInput {
                status: payload.status,
                reason: payload.reason,
            },
        )
        .await?;
    Ok(success_response(request))
}

async fn delete_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.returns.delete_return(id).await?;
    Ok(no_content_response())
}

// Refunds

async fn list_refunds(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery<RefundStatus>>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .refunds
        .list_refunds(page, limit, query.status)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_refund(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.refunds.get_refund(id).await?))
}

async fn create_refund(
    State(state): State<AppState>,
    Json(payload): Json<RefundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let refund = state
        .services
        .refunds
        .create_refund(CreateRefundInput {
            order_id: payload.order_id,
            return_request_id: payload.return_request_id,
            amount: payload.amount,
            reason: payload.reason,
        })
        .await?;
    Ok(created_response(refund))
}

async fn update_refund(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRefundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let refund = state
        .services
        .refunds
        .update_refund(
            id,
            UpdateRefundInput {
                status: payload.status,
                reason: payload.reason,
            },
        )
        .await?;
    Ok(success_response(refund))
}

async fn delete_refund(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.refunds.delete_refund(id).await?;
    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct StatusQuery<S> {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<S>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ComplaintRequest {
    pub order_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub subject: String,
    #[validate(length(min = 1, max = 5000), custom = "validate_not_blank")]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VendorComplaintRequest {
    pub customer_id: Uuid,
    #[serde(flatten)]
    #[validate]
    pub complaint: ComplaintRequest,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateComplaintRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 5000), custom = "validate_not_blank")]
    pub message: Option<String>,
    pub status: Option<ComplaintStatus>,
    #[validate(length(max = 5000))]
    pub resolution: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReturnRequest {
    pub order_id: Uuid,
    pub order_item_id: Uuid,
    #[validate(length(min = 1, max = 2000), custom = "validate_not_blank")]
    pub reason: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReturnRequest {
    pub status: Option<ReturnStatus>,
    #[validate(length(min = 1, max = 2000), custom = "validate_not_blank")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundRequest {
    pub order_id: Uuid,
    pub return_request_id: Option<Uuid>,
    #[validate(custom = "validate_decimal_non_negative")]
    pub amount: Decimal,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRefundRequest {
    pub status: Option<RefundStatus>,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}
