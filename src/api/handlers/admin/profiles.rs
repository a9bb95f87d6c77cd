use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::HeaderMap,
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{
    storage, valid_ids,
    types::{BulkDeleteResponse, IdsRequest, ProfileDeletedResponse},
};
use crate::api::handlers::{
    ApiError, ErrorBody,
    auth::{AuthState, principal::require_admin},
    profile::{
        storage::{ProfileKey, update_profile},
        types::{ProfileUpdateRequest, ProfileUpdatedResponse},
        update::ProfileUpdate,
    },
};

fn profile_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid profile id"))
}

#[utoipa::path(
    patch,
    path = "/admin/profiles/{id}",
    params(("id" = String, Path, description = "Profile id")),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "Invalid id, no valid fields, invalid value or email in use", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Profile not found", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn edit_profile(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProfileUpdatedResponse>, ApiError> {
    let admin = require_admin(&headers, &auth_state)?;
    let id = profile_id(&id)?;

    let body = payload.map(|Json(body)| body).unwrap_or(Value::Null);
    let update = ProfileUpdate::from_json(&body)?;

    let profile = update_profile(&pool, ProfileKey::Id(id), &update)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    info!(profile_id = %id, admin = %admin.userid, "profile updated by admin");

    Ok(Json(ProfileUpdatedResponse {
        success: true,
        message: "Profile updated".to_string(),
        profile,
    }))
}

#[utoipa::path(
    delete,
    path = "/admin/profiles/{id}",
    params(("id" = String, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile deleted", body = ProfileDeletedResponse),
        (status = 400, description = "Invalid profile id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Profile not found", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn delete_profile(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<Json<ProfileDeletedResponse>, ApiError> {
    let admin = require_admin(&headers, &auth_state)?;
    let id = profile_id(&id)?;

    if !storage::delete_profile(&pool, id).await? {
        return Err(ApiError::NotFound("Profile not found"));
    }

    info!(profile_id = %id, admin = %admin.userid, "profile deleted");

    Ok(Json(ProfileDeletedResponse {
        success: true,
        message: "Profile deleted".to_string(),
        profile_id: id.to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/admin/profiles",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Matching profiles deleted", body = BulkDeleteResponse),
        (status = 400, description = "Missing ids or none valid", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn bulk_delete_profiles(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Result<Json<IdsRequest>, JsonRejection>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    let admin = require_admin(&headers, &auth_state)?;

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let ids = request.ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(ApiError::BadRequest("ids array required in body"));
    }

    let ids = valid_ids(&ids);
    if ids.is_empty() {
        return Err(ApiError::BadRequest("No valid profile ids provided"));
    }

    let deleted_count = storage::delete_profiles(&pool, &ids).await?;

    info!(deleted_count, admin = %admin.userid, "bulk profile delete");

    Ok(Json(BulkDeleteResponse {
        success: true,
        message: "Bulk delete completed".to_string(),
        deleted_count,
    }))
}
