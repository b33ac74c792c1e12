use super::common::{no_content_response, success_response, validate_input};
use crate::{
    auth::{Action, AuthRouterExt, Subject},
    errors::ApiError,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use serde::Deserialize;
use validator::Validate;

pub fn vendor_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/site-settings", get(list_settings))
        .with_ability(Action::Read, Subject::SiteSetting);
    let upsert = Router::new()
        .route("/site-settings/:key", put(upsert_setting))
        .with_ability(Action::Update, Subject::SiteSetting);
    let remove = Router::new()
        .route("/site-settings/:key", delete(delete_setting))
        .with_ability(Action::Delete, Subject::SiteSetting);
    read.merge(upsert).merge(remove)
}

/// Public key/value map for the storefront shell
pub fn store_routes() -> Router<AppState> {
    Router::new().route("/site-settings", get(settings_map))
}

async fn list_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.site_settings.list_settings().await?))
}

async fn upsert_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<SettingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let setting = state
        .services
        .site_settings
        .upsert_setting(&key, payload.value)
        .await?;
    Ok(success_response(setting))
}

async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.site_settings.delete_setting(&key).await?;
    Ok(no_content_response())
}

async fn settings_map(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.services.site_settings.settings_map().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingRequest {
    #[validate(length(max = 10000))]
    pub value: String,
}
