use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::HeaderMap,
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::{
    storage::{ProfileKey, fetch_profile, update_profile},
    types::{ProfileResponse, ProfileUpdateRequest, ProfileUpdatedResponse},
    update::ProfileUpdate,
};
use crate::api::handlers::{
    ApiError, ErrorBody,
    auth::{AuthState, principal::require_auth},
};

#[utoipa::path(
    get,
    path = "/profile/me",
    responses(
        (status = 200, description = "Caller's profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Profile not found", body = ErrorBody)
    ),
    tag = "profile"
)]
pub async fn get_me(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let principal = require_auth(&headers, &auth_state)?;

    let profile = fetch_profile(&pool, ProfileKey::Owner(principal.user_id))
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

#[utoipa::path(
    patch,
    path = "/profile/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "No valid fields, invalid value or email in use", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Profile not found", body = ErrorBody)
    ),
    tag = "profile"
)]
pub async fn patch_me(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProfileUpdatedResponse>, ApiError> {
    let principal = require_auth(&headers, &auth_state)?;

    let body = payload.map(|Json(body)| body).unwrap_or(Value::Null);
    let update = ProfileUpdate::from_json(&body)?;

    let profile = update_profile(&pool, ProfileKey::Owner(principal.user_id), &update)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    info!(user_id = %principal.user_id, "profile updated by owner");

    Ok(Json(ProfileUpdatedResponse {
        success: true,
        message: "Profile updated".to_string(),
        profile,
    }))
}
