use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    gateway::{GatewayError, OrderNotes, OrderRequest},
    safe_return_path,
    state::PaymentState,
    types::{CheckoutRequest, CheckoutResponse, KeyResponse},
};
use crate::api::handlers::{ApiError, ErrorBody};

pub(crate) const MISSING_KEYS: &str = "Server misconfiguration: payment gateway keys missing";

#[utoipa::path(
    get,
    path = "/api/getkey",
    responses(
        (status = 200, description = "Public gateway key id (null when unset)", body = KeyResponse)
    ),
    tag = "payments"
)]
pub async fn get_key(payment_state: Extension<Arc<PaymentState>>) -> Json<KeyResponse> {
    Json(KeyResponse {
        key: payment_state.config().key_id().map(str::to_string),
    })
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Gateway order created", body = CheckoutResponse),
        (status = 400, description = "Invalid amount", body = ErrorBody),
        (status = 500, description = "Gateway keys missing", body = ErrorBody),
        (status = 502, description = "Gateway unreachable", body = ErrorBody)
    ),
    tag = "payments"
)]
pub async fn checkout(
    payment_state: Extension<Arc<PaymentState>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let Some(credentials) = payment_state.config().credentials() else {
        error!("checkout requested without gateway credentials");
        return Err(ApiError::Internal(MISSING_KEYS));
    };

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let amount = minor_units(request.amount.as_ref()).ok_or(ApiError::BadRequest("Invalid amount"))?;

    let order_request = OrderRequest {
        amount,
        currency: payment_state.config().currency().to_string(),
        notes: OrderNotes {
            return_url: safe_return_path(request.return_url.as_deref()),
        },
    };

    let order = payment_state
        .gateway()
        .create_order(&credentials, &order_request)
        .await
        .map_err(|err| {
            error!("Failed to create gateway order: {err}");
            gateway_error_response(err)
        })?;

    info!(amount, "gateway order created");

    Ok(Json(CheckoutResponse {
        success: true,
        order,
    }))
}

/// Convert a major-unit amount (number or numeric string) into minor units.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn minor_units(amount: Option<&Value>) -> Option<i64> {
    let major = match amount? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !major.is_finite() || major <= 0.0 {
        return None;
    }
    let minor = (major * 100.0).round();
    // f64 -> i64 casts saturate; keep the value well inside the exact range.
    if minor < 1.0 || minor > 9_007_199_254_740_991.0 {
        return None;
    }
    Some(minor as i64)
}

fn gateway_error_response(err: GatewayError) -> ApiError {
    match err {
        GatewayError::Status {
            status,
            description,
        } => {
            let status = StatusCode::from_u16(status)
                .ok()
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            ApiError::Upstream(status, description)
        }
        GatewayError::Transport(_) => {
            ApiError::Upstream(StatusCode::BAD_GATEWAY, "Failed to create order".to_string())
        }
    }
}
