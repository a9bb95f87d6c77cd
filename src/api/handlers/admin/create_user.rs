use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    storage::{CreateOutcome, NewUser, create_user_with_profile},
    types::{CreateUserRequest, CreateUserResponse},
};
use crate::api::handlers::{
    ApiError, ErrorBody,
    auth::{
        AuthState, Role,
        password::{MIN_PASSWORD_LEN, hash_password},
        principal::require_admin,
    },
    normalize_email,
    profile::storage::{ProfileKey, fetch_profile},
    valid_age, valid_email, whole_number,
};

const USERID_ATTEMPTS: usize = 3;

/// Validated admin create-user input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ValidatedUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: Option<i32>,
    pub father_number: Option<String>,
    pub role: Role,
    pub password: String,
}

/// Digits of a string or number, separators dropped.
fn digits(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.chars().filter(char::is_ascii_digit).collect(),
        Some(Value::Number(number)) => number
            .to_string()
            .chars()
            .filter(char::is_ascii_digit)
            .collect(),
        _ => String::new(),
    }
}

fn parse_age(value: Option<&Value>) -> Result<Option<i32>, ApiError> {
    let invalid = ApiError::BadRequest("Invalid age");
    let age = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(value) => whole_number(value).ok_or(invalid)?,
    };
    if !valid_age(age) {
        return Err(ApiError::BadRequest("Invalid age"));
    }
    i32::try_from(age)
        .map(Some)
        .map_err(|_| ApiError::BadRequest("Invalid age"))
}

impl ValidatedUser {
    pub(crate) fn from_request(request: CreateUserRequest) -> Result<Self, ApiError> {
        let name = request.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(ApiError::BadRequest("Name is required"));
        }

        let email = normalize_email(request.email.as_deref().unwrap_or_default());
        if !valid_email(&email) {
            return Err(ApiError::BadRequest("Valid email required"));
        }

        let phone = digits(request.phone.as_ref());
        if phone.len() != 10 {
            return Err(ApiError::BadRequest("Phone must be 10 digits"));
        }

        let father_number = digits(request.father_number.as_ref());
        if !father_number.is_empty() && father_number.len() != 10 {
            return Err(ApiError::BadRequest("Father's number must be 10 digits"));
        }

        let age = parse_age(request.age.as_ref())?;

        let role = match request.role.as_deref().map(str::trim) {
            None | Some("") => Role::User,
            Some(raw) => Role::parse(raw).ok_or(ApiError::BadRequest("Invalid role"))?,
        };

        let password = request.password.unwrap_or_default();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::BadRequest(
                "Password must be at least 6 characters",
            ));
        }

        Ok(Self {
            name: name.to_string(),
            email,
            phone,
            age,
            father_number: (!father_number.is_empty()).then_some(father_number),
            role,
            password,
        })
    }
}

/// `u_<email local part>_<6 hex chars>`
pub(crate) fn generate_userid(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let suffix: [u8; 3] = rand::random();
    format!("u_{local}_{}", hex::encode(suffix))
}

#[utoipa::path(
    post,
    path = "/admin/create-user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account and profile created", body = CreateUserResponse),
        (status = 400, description = "Validation failure or duplicate email/phone", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn create_user(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let admin = require_admin(&headers, &auth_state)?;

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let user = ValidatedUser::from_request(request)?;

    let password_hash = hash_password(&user.password).map_err(|err| {
        error!("Failed to hash password: {err}");
        ApiError::Internal("Failed to create user")
    })?;

    let mut profile_id = None;
    for _ in 0..USERID_ATTEMPTS {
        let userid = generate_userid(&user.email);
        let new_user = NewUser {
            userid: &userid,
            email: &user.email,
            password_hash: &password_hash,
            role: user.role,
            name: &user.name,
            phone: &user.phone,
            age: user.age,
            father_number: user.father_number.as_deref(),
        };
        match create_user_with_profile(&pool, &new_user).await? {
            CreateOutcome::Created { profile_id: id } => {
                profile_id = Some(id);
                break;
            }
            CreateOutcome::EmailExists => return Err(ApiError::BadRequest("Email already exists")),
            CreateOutcome::PhoneExists => return Err(ApiError::BadRequest("Phone already exists")),
            CreateOutcome::UseridTaken => warn!(%userid, "generated userid collided, retrying"),
        }
    }
    let profile_id = profile_id.ok_or(ApiError::Internal("Failed to create user"))?;

    let profile = fetch_profile(&pool, ProfileKey::Id(profile_id))
        .await?
        .ok_or(ApiError::Internal("Failed to create user"))?;

    info!(%profile_id, role = %user.role, admin = %admin.userid, "user created by admin");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            success: true,
            message: "User created".to_string(),
            profile,
        }),
    ))
}
