use super::common::{
    created_response, no_content_response, page_params, paginated_response, success_response,
    validate_input, validate_not_blank,
};
use crate::{
    auth::{Action, AuthRouterExt, AuthUser, Subject},
    errors::ApiError,
    services::access::{
        CreatePermissionInput, CreateRoleInput, CreateUserInput, UpdateRoleInput, UpdateUserInput,
    },
    AppState, ListQuery,
};
use axum::{
    extract::{Extension, Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Roles, permissions and staff users
pub fn vendor_routes() -> Router<AppState> {
    role_routes().merge(permission_routes()).merge(user_routes())
}

fn role_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:id", get(get_role))
        .with_ability(Action::Read, Subject::Role);
    let create = Router::new()
        .route("/roles", post(create_role))
        .with_ability(Action::Create, Subject::Role);
    let update = Router::new()
        .route("/roles/:id", patch(update_role))
        .with_ability(Action::Update, Subject::Role);
    let remove = Router::new()
        .route("/roles/:id", delete(delete_role))
        .with_ability(Action::Delete, Subject::Role);
    read.merge(create).merge(update).merge(remove)
}

fn permission_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/permissions", get(list_permissions))
        .route("/permissions/:id", get(get_permission))
        .with_ability(Action::Read, Subject::Permission);
    let create = Router::new()
        .route("/permissions", post(create_permission))
        .with_ability(Action::Create, Subject::Permission);
    let update = Router::new()
        .route("/permissions/:id", patch(update_permission))
        .with_ability(Action::Update, Subject::Permission);
    let remove = Router::new()
        .route("/permissions/:id", delete(delete_permission))
        .with_ability(Action::Delete, Subject::Permission);
    read.merge(create).merge(update).merge(remove)
}

fn user_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .with_ability(Action::Read, Subject::User);
    let create = Router::new()
        .route("/users", post(create_user))
        .with_ability(Action::Create, Subject::User);
    let update = Router::new()
        .route("/users/:id", patch(update_user))
        .with_ability(Action::Update, Subject::User);
    let remove = Router::new()
        .route("/users/:id", delete(delete_user))
        .with_ability(Action::Delete, Subject::User);
    read.merge(create).merge(update).merge(remove)
}

// Roles

async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state.services.access.list_roles(page, limit).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.access.get_role(id).await?))
}

async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let role = state
        .services
        .access
        .create_role(CreateRoleInput {
            name: payload.name,
            description: payload.description,
            permissions: payload.permissions,
        })
        .await?;
    Ok(created_response(role))
}

async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let role = state
        .services
        .access
        .update_role(
            id,
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                permissions: payload.permissions,
            },
        )
        .await?;
    Ok(success_response(role))
}

async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.access.delete_role(id).await?;
    Ok(no_content_response())
}

// Permissions

async fn list_permissions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state.services.access.list_permissions(page, limit).await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.access.get_permission(id).await?))
}

async fn create_permission(
    State(state): State<AppState>,
    Json(payload): Json<PermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let permission = state
        .services
        .access
        .create_permission(CreatePermissionInput {
            key: payload.key,
            description: payload.description,
        })
        .await?;
    Ok(created_response(permission))
}

async fn update_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let permission = state
        .services
        .access
        .update_permission(id, payload.description)
        .await?;
    Ok(success_response(permission))
}

async fn delete_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.access.delete_permission(id).await?;
    Ok(no_content_response())
}

// Users

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&state, query.page, query.limit);
    let result = state
        .services
        .access
        .list_users(page, limit, query.search)
        .await?;
    Ok(paginated_response(result, page, limit))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.access.get_user(id).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state
        .services
        .access
        .create_user(
            CreateUserInput {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role_id: payload.role_id,
                is_active: payload.is_active,
            },
            caller.is_admin(),
        )
        .await?;
    Ok(created_response(user))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state
        .services
        .access
        .update_user(
            id,
            UpdateUserInput {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role_id: payload.role_id,
                is_active: payload.is_active,
            },
            caller.is_admin(),
        )
        .await?;
    Ok(success_response(user))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .access
        .delete_user(id, caller.is_admin())
        .await?;
    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct RoleRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PermissionRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub key: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
