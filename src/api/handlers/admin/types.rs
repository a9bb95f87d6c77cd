use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::handlers::profile::types::Profile;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilesPage {
    pub profiles: Vec<Profile>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilesListResponse {
    pub success: bool,
    pub data: ProfilesPage,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileDeletedResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "profileId")]
    pub profile_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

/// Selected profile ids; entries that are not UUID strings are ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IdsRequest {
    #[schema(value_type = Vec<String>)]
    pub ids: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Ten digits; separators are stripped.
    #[schema(value_type = String)]
    pub phone: Option<Value>,
    #[schema(value_type = Option<i32>)]
    pub age: Option<Value>,
    #[serde(rename = "fatherNumber")]
    #[schema(value_type = Option<String>)]
    pub father_number: Option<Value>,
    pub password: Option<String>,
    /// `user` (default) or `admin`.
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: String,
    pub profile: Profile,
}
