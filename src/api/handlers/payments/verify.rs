use axum::{
    body::Bytes,
    extract::{Extension, Query},
    http::{HeaderMap, header::CONTENT_TYPE},
    response::Redirect,
};
use serde_json::Value;
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, info, warn};

use super::{
    checkout::MISSING_KEYS, safe_return_path, signature::verify_signature, state::PaymentState,
    storage::insert_payment, types::VerificationParams,
};
use crate::api::handlers::{ApiError, ErrorBody};
use secrecy::ExposeSecret;

const ORDER_ID: &str = "razorpay_order_id";
const PAYMENT_ID: &str = "razorpay_payment_id";
const SIGNATURE: &str = "razorpay_signature";

#[utoipa::path(
    post,
    path = "/api/paymentverification",
    request_body(content = VerificationParams, content_type = "application/x-www-form-urlencoded"),
    params(
        ("razorpay_order_id" = Option<String>, Query, description = "Gateway order id"),
        ("razorpay_payment_id" = Option<String>, Query, description = "Gateway payment id"),
        ("razorpay_signature" = Option<String>, Query, description = "HMAC-SHA256 hex signature")
    ),
    responses(
        (status = 303, description = "Redirect back to the frontend with the payment outcome"),
        (status = 400, description = "Missing params or invalid signature", body = ErrorBody),
        (status = 500, description = "Gateway keys missing", body = ErrorBody)
    ),
    tag = "payments"
)]
pub async fn payment_verification(
    pool: Extension<PgPool>,
    payment_state: Extension<Arc<PaymentState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Redirect, ApiError> {
    let params = collect_params(&headers, &body, query)
        .ok_or(ApiError::BadRequest("Missing verification params"))?;

    let Some(credentials) = payment_state.config().credentials() else {
        error!("payment verification requested without gateway credentials");
        return Err(ApiError::Internal(MISSING_KEYS));
    };

    if !verify_signature(
        credentials.key_secret.expose_secret(),
        &params.razorpay_order_id,
        &params.razorpay_payment_id,
        &params.razorpay_signature,
    ) {
        warn!(order_id = %params.razorpay_order_id, "payment signature mismatch");
        return Err(ApiError::BadRequest("Invalid signature"));
    }

    let frontend = payment_state.config().frontend_base_url();

    if let Err(err) = insert_payment(
        &pool,
        &params.razorpay_order_id,
        &params.razorpay_payment_id,
        &params.razorpay_signature,
    )
    .await
    {
        error!("Failed to store payment: {err}");
        return Ok(Redirect::to(&format!("{frontend}/dashboard?payment=failed")));
    }

    let return_path = match payment_state
        .gateway()
        .fetch_order(&credentials, &params.razorpay_order_id)
        .await
    {
        Ok(order) => safe_return_path(order.pointer("/notes/returnUrl").and_then(Value::as_str)),
        Err(err) => {
            warn!("Failed to fetch order notes, using default return path: {err}");
            safe_return_path(None)
        }
    };

    info!(payment_id = %params.razorpay_payment_id, "payment verified");

    Ok(Redirect::to(&success_url(
        frontend,
        &return_path,
        &params.razorpay_payment_id,
    )))
}

/// Gather the three callback fields; body values win over the query string.
fn collect_params(
    headers: &HeaderMap,
    body: &[u8],
    mut query: HashMap<String, String>,
) -> Option<VerificationParams> {
    let mut fields = body_fields(headers, body);
    let mut take = |key: &str| {
        fields
            .remove(key)
            .or_else(|| query.remove(key))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Some(VerificationParams {
        razorpay_order_id: take(ORDER_ID)?,
        razorpay_payment_id: take(PAYMENT_ID)?,
        razorpay_signature: take(SIGNATURE)?,
    })
}

fn body_fields(headers: &HeaderMap, body: &[u8]) -> HashMap<String, String> {
    if body.is_empty() {
        return HashMap::new();
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("json"));

    if is_json {
        serde_json::from_slice::<serde_json::Map<String, Value>>(body)
            .map(|map| {
                map.into_iter()
                    .filter_map(|(key, value)| match value {
                        Value::String(text) => Some((key, text)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    } else {
        url::form_urlencoded::parse(body).into_owned().collect()
    }
}

fn success_url(frontend: &str, return_path: &str, payment_id: &str) -> String {
    let separator = if return_path.contains('?') { '&' } else { '?' };
    let reference: String = url::form_urlencoded::byte_serialize(payment_id.as_bytes()).collect();
    format!("{frontend}{return_path}{separator}payment=success&reference={reference}")
}
