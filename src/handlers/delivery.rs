use super::common::{
    no_content_response, page_params, paginated_response, success_response, validate_input,
};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    entities::delivery_tracking::DeliveryStatus,
    errors::ApiError,
    services::delivery::UpdateTrackingInput,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/delivery-tracking", get(list_tracking))
        .route("/delivery-tracking/:id", get(get_tracking))
        .with_ability(Action::Read, Subject::DeliveryTracking);
    let update = Router::new()
        .route("/delivery-tracking/:id", patch(update_tracking))
        .with_ability(Action::Update, Subject::DeliveryTracking);
    let remove = Router::new()
        .route("/delivery-tracking/:id", delete(delete_tracking))
        .with_ability(Action::Delete, Subject::DeliveryTracking);
    read.merge(update).merge(remove)
}

async fn list_tracking(
    State(state): State<AppState>,
    Query(query): Query<TrackingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .delivery
        .list_tracking(page, limit, query.status)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_tracking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.delivery.get_tracking(id).await?))
}

/// Status changes to shipped or delivered also move the order along
async fn update_tracking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTrackingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let tracking = state
        .services
        .delivery
        .update_tracking(
            id,
            UpdateTrackingInput {
                status: payload.status,
                carrier: payload.carrier,
                tracking_number: payload.tracking_number,
                estimated_delivery: payload.estimated_delivery,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(success_response(tracking))
}

async fn delete_tracking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.delivery.delete_tracking(id).await?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize, Default)]
pub struct TrackingListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<DeliveryStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrackingRequest {
    pub status: Option<DeliveryStatus>,
    #[validate(length(min = 1, max = 100))]
    pub carrier: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
