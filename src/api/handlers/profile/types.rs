use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::handlers::auth::Role;

/// Auth record summary embedded in every profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRegisterRef {
    pub id: String,
    pub userid: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub father_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user_register: UserRegisterRef,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdatedResponse {
    pub success: bool,
    pub message: String,
    pub profile: Profile,
}

/// Whitelisted fields accepted by profile updates; anything else is ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub father_number: Option<String>,
}
