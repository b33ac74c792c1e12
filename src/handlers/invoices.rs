use super::common::{page_params, paginated_response, success_response};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    entities::invoice::InvoiceStatus,
    errors::ApiError,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Invoices are issued with their order; vendors only read them and move their status.
pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices/:id", get(get_invoice))
        .with_ability(Action::Read, Subject::Invoice);
    let update = Router::new()
        .route("/invoices/:id", patch(update_invoice_status))
        .with_ability(Action::Update, Subject::Invoice);
    read.merge(update)
}

async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .invoices
        .list_invoices(page, limit, query.status)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.invoices.get_invoice(id).await?))
}

async fn update_invoice_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoiceStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state
        .services
        .invoices
        .update_status(id, payload.status)
        .await?;
    Ok(success_response(invoice))
}

#[derive(Debug, Deserialize, Default)]
pub struct InvoiceListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}
