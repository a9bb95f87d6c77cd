//! Authenticated principal extraction and the admin gate.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::{
    session::extract_session_token,
    state::AuthState,
    token::{Role, verify_token},
};
use crate::api::handlers::ApiError;

/// Caller identity taken from a verified session token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub userid: String,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolve the session token into a principal, or 401.
///
/// # Errors
/// `Not authenticated` when no token is presented, `Invalid or expired token`
/// when it fails verification.
pub fn require_auth(headers: &HeaderMap, auth_state: &AuthState) -> Result<Principal, ApiError> {
    let Some(token) = extract_session_token(headers) else {
        return Err(ApiError::Unauthorized("Not authenticated"));
    };
    let claims = verify_token(auth_state, &token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;
    Ok(Principal {
        user_id,
        userid: claims.userid,
        role: claims.role,
    })
}

/// Like [`require_auth`], additionally demanding the admin role (403 otherwise).
///
/// # Errors
/// Propagates [`require_auth`] failures; `Admin access required` for non-admins.
pub fn require_admin(headers: &HeaderMap, auth_state: &AuthState) -> Result<Principal, ApiError> {
    let principal = require_auth(headers, auth_state)?;
    if principal.is_admin() {
        Ok(principal)
    } else {
        Err(ApiError::Forbidden("Admin access required"))
    }
}
