use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
};
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use super::{
    storage,
    types::{Pagination, ProfilesListResponse, ProfilesPage},
};
use crate::api::handlers::{
    ApiError, ErrorBody,
    auth::{AuthState, principal::require_admin},
    escape_like, parse_limit, parse_page,
};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Sortable columns; anything unrecognised sorts by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Name,
    Email,
    Phone,
    Age,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name") => Self::Name,
            Some("email") => Self::Email,
            Some("phone") => Self::Phone,
            Some("age") => Self::Age,
            Some("updatedAt") => Self::UpdatedAt,
            _ => Self::CreatedAt,
        }
    }

    /// Text columns compare case-insensitively.
    #[must_use]
    pub const fn expression(self) -> &'static str {
        match self {
            Self::Name => "lower(p.name)",
            Self::Email => "lower(p.email)",
            Self::Phone => "lower(p.phone)",
            Self::Age => "p.age",
            Self::CreatedAt => "p.created_at",
            Self::UpdatedAt => "p.updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(order) if order.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// Nulls rank lowest in both directions.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC NULLS FIRST",
            Self::Desc => "DESC NULLS LAST",
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: Option<String>,
    pub user: Option<Uuid>,
}

impl ListQuery {
    /// Build from raw query parameters.
    ///
    /// # Errors
    /// `Invalid user filter id` when `user` is present but not a UUID.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ApiError> {
        let get = |key: &str| params.get(key).map(String::as_str);

        let user = match get("user").map(str::trim).filter(|u| !u.is_empty()) {
            Some(raw) => Some(
                Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid user filter id"))?,
            ),
            None => None,
        };

        Ok(Self {
            page: parse_page(get("page")),
            limit: parse_limit(get("limit"), DEFAULT_LIMIT, MAX_LIMIT),
            sort: SortField::parse(get("sortBy")),
            order: SortOrder::parse(get("order")),
            search: get("q")
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(ToString::to_string),
            user,
        })
    }

    /// `ILIKE` pattern for the search term, with metacharacters escaped.
    #[must_use]
    pub fn pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|q| format!("%{}%", escape_like(q)))
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// `max(1, ceil(total / limit))`
#[must_use]
pub fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 1;
    }
    ((total + limit - 1) / limit).max(1)
}

#[utoipa::path(
    get,
    path = "/admin/profiles",
    params(
        ("page" = Option<i64>, Query, description = "1-based page (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size, 1..=100 (default 10)"),
        ("sortBy" = Option<String>, Query, description = "name, email, phone, age, createdAt or updatedAt"),
        ("order" = Option<String>, Query, description = "asc or desc (default desc)"),
        ("q" = Option<String>, Query, description = "Substring match on name, email or phone"),
        ("user" = Option<String>, Query, description = "Auth record id")
    ),
    responses(
        (status = 200, description = "One page of profiles", body = ProfilesListResponse),
        (status = 400, description = "Invalid user filter id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn list_profiles(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ProfilesListResponse>, ApiError> {
    require_admin(&headers, &auth_state)?;

    let query = ListQuery::from_params(&params)?;
    let (total, profiles) = storage::list_profiles(&pool, &query).await?;

    Ok(Json(ProfilesListResponse {
        success: true,
        data: ProfilesPage {
            profiles,
            pagination: Pagination {
                total,
                page: query.page,
                pages: page_count(total, query.limit),
                limit: query.limit,
            },
        },
    }))
}
