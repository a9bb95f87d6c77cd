use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
};
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};

use super::{
    storage,
    types::{PaymentsMeta, PaymentsResponse},
};
use crate::api::handlers::{
    ApiError, ErrorBody,
    auth::{AuthState, principal::require_admin},
    parse_limit, parse_page,
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[utoipa::path(
    get,
    path = "/api/payments",
    params(
        ("page" = Option<i64>, Query, description = "1-based page (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size, 1..=100 (default 50)")
    ),
    responses(
        (status = 200, description = "Payments, newest first", body = PaymentsResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    tag = "payments"
)]
pub async fn list_payments(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PaymentsResponse>, ApiError> {
    require_admin(&headers, &auth_state)?;

    let page = parse_page(query.get("page").map(String::as_str));
    let limit = parse_limit(query.get("limit").map(String::as_str), DEFAULT_LIMIT, MAX_LIMIT);

    let (total, data) = storage::list_payments(&pool, page, limit).await?;

    Ok(Json(PaymentsResponse {
        success: true,
        meta: PaymentsMeta { total, page, limit },
        data,
    }))
}
