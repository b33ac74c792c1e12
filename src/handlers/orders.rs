use super::common::{
    created_response, customer_id, no_content_response, page_params, paginated_response,
    success_response, validate_input,
};
use crate::{
    auth::{Action, AuthRouterExt, AuthUser, Subject, CUSTOMER_ROLE},
    entities::order::{OrderStatus, PaymentStatus},
    errors::{ApiError, ServiceError},
    services::orders::{CreateOrderInput, OrderFilter, OrderLineInput, UpdateOrderInput},
    AppState,
};
use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Vendor order desk: `/api/vendor/order`
pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/order", get(list_orders))
        .route("/order/:id", get(get_order))
        .route("/order/:id/tracking", get(get_order_tracking))
        .with_ability(Action::Read, Subject::Order);

    let create = Router::new()
        .route("/order", post(create_order))
        .with_ability(Action::Create, Subject::Order);

    let update = Router::new()
        .route("/order/:id", patch(update_order))
        .with_ability(Action::Update, Subject::Order);

    let remove = Router::new()
        .route("/order/:id", delete(delete_order))
        .with_ability(Action::Delete, Subject::Order);

    read.merge(create).merge(update).merge(remove)
}

/// A signed-in customer's own orders
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_my_orders))
        .route("/orders/:id", get(get_my_order))
        .with_role(CUSTOMER_ROLE)
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let filter = OrderFilter {
        status: query.status,
        customer_id: query.customer_id,
    };
    let result = state.services.orders.list_orders(page, limit, filter).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.services.orders.get_order_details(id).await?;
    Ok(success_response(details))
}

async fn get_order_tracking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tracking = state.services.delivery.get_tracking_for_order(id).await?;
    Ok(success_response(tracking))
}

/// Places an order for a customer. Missing `customer_id` or an empty item list is a 400.
async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let details = state
        .services
        .orders
        .create_order(CreateOrderInput {
            customer_id: payload.customer_id,
            items: payload
                .items
                .into_iter()
                .map(|item| OrderLineInput {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            shipping_address: payload.shipping_address,
            notes: payload.notes,
        })
        .await?;
    Ok(created_response(details))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .update_order(
            id,
            UpdateOrderInput {
                status: payload.status,
                payment_status: payload.payment_status,
                notes: payload.notes,
                shipping_address: payload.shipping_address,
            },
        )
        .await?;
    Ok(success_response(order))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.orders.delete_order(id).await?;
    Ok(no_content_response())
}

async fn list_my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let filter = OrderFilter {
        status: query.status,
        customer_id: Some(customer_id(&user)?),
    };
    let result = state.services.orders.list_orders(page, limit, filter).await?;
    Ok(paginated_response(result, page, limit))
}

/// Another customer's order reads as missing
async fn get_my_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.services.orders.get_order_details(id).await?;
    if details.order.customer_id != customer_id(&user)? {
        return Err(ServiceError::not_found("Order", id).into());
    }
    Ok(success_response(details))
}

#[derive(Debug, Deserialize, Default)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItemRequest>,
    #[validate(length(max = 1000))]
    pub shipping_address: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(max = 1000))]
    pub shipping_address: Option<String>,
}
