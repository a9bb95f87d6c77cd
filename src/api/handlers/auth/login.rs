use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    password::verify_password,
    session::session_cookie,
    state::AuthState,
    storage::{find_by_email, find_by_userid},
    token::issue_token,
    types::{LoginRequest, LoginResponse},
};
use crate::api::handlers::{ApiError, ErrorBody, normalize_email};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Missing handle or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    let userid = request
        .userid
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let email = request
        .email
        .map(|v| normalize_email(&v))
        .filter(|v| !v.is_empty());
    let password = request.password.filter(|p| !p.is_empty());

    let Some(password) = password else {
        return Err(ApiError::BadRequest("Provide userid or email and password"));
    };

    let record = match (userid, email) {
        (Some(userid), _) => find_by_userid(&pool, &userid).await?,
        (None, Some(email)) => find_by_email(&pool, &email).await?,
        (None, None) => {
            return Err(ApiError::BadRequest("Provide userid or email and password"));
        }
    };

    let Some(record) = record else {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };
    if !verify_password(&password, &record.password_hash) {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = issue_token(&auth_state, record.id, &record.userid, record.role).map_err(|err| {
        error!("Failed to sign session token: {err}");
        ApiError::Internal("Failed to create session")
    })?;
    let cookie = session_cookie(auth_state.config(), &token).map_err(|err| {
        error!("Failed to build session cookie: {err}");
        ApiError::Internal("Failed to create session")
    })?;

    info!(user_id = %record.id, "login succeeded");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((
        StatusCode::OK,
        headers,
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            userid: record.userid,
            role: record.role,
        }),
    ))
}
