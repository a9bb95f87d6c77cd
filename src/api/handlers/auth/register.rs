use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
};
use sqlx::PgPool;
use tracing::{error, info};

use super::{
    password::{MIN_PASSWORD_LEN, hash_password},
    storage::{RegisterOutcome, insert_user_with_profile},
    types::{ProfileRef, RegisterRequest, RegisterResponse, RegisteredUser},
};
use crate::api::handlers::{ApiError, ErrorBody, normalize_email, valid_email};

#[utoipa::path(
    post,
    path = "/user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account and empty profile created", body = RegisterResponse),
        (status = 400, description = "Missing fields, invalid email, short password or duplicate", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    let non_blank = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let userid = non_blank(request.userid);
    let email = non_blank(request.email);
    let password = request.password.filter(|p| !p.trim().is_empty());

    let (Some(userid), Some(email), Some(password)) = (userid, email, password) else {
        return Err(ApiError::BadRequest(
            "userid, email and password are required",
        ));
    };

    let email = normalize_email(&email);
    if !valid_email(&email) {
        return Err(ApiError::BadRequest("Valid email required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters",
        ));
    }

    let password_hash = hash_password(&password).map_err(|err| {
        error!("Failed to hash password: {err}");
        ApiError::Internal("Failed to register user")
    })?;

    match insert_user_with_profile(&pool, &userid, &email, &password_hash).await? {
        RegisterOutcome::Created {
            user_id,
            profile_id,
        } => {
            info!(%user_id, "registered user");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    success: true,
                    message: "User registered successfully".to_string(),
                    user: RegisteredUser {
                        id: user_id.to_string(),
                        userid,
                        email,
                    },
                    profile: ProfileRef {
                        id: profile_id.to_string(),
                    },
                }),
            ))
        }
        RegisterOutcome::Conflict => Err(ApiError::BadRequest(
            "Email or userid already registered",
        )),
    }
}
