use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, LOCATION},
    },
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use super::{
    Credentials, GatewayError, OrderRequest, PaymentConfig, PaymentGateway, PaymentState,
    checkout::MISSING_KEYS, signature::expected_signature,
};
use crate::api::handlers::{
    auth::Role,
    test_support::{
        FRONTEND, TestDb, gateway_app, app_with, auth_state, cookie_for, json_body, lazy_pool, send,
    },
};
use sqlx::PgPool;

const SECRET: &str = "rzp_test_secret";

#[derive(Default)]
struct FakeGateway {
    orders: Mutex<Vec<OrderRequest>>,
    fail_with: Option<(u16, &'static str)>,
    return_url: Option<&'static str>,
}

impl FakeGateway {
    fn returning(return_url: &'static str) -> Self {
        Self {
            return_url: Some(return_url),
            ..Self::default()
        }
    }

    fn failing(status: u16, description: &'static str) -> Self {
        Self {
            fail_with: Some((status, description)),
            ..Self::default()
        }
    }

    fn recorded(&self) -> Vec<OrderRequest> {
        self.orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        credentials: &Credentials,
        request: &OrderRequest,
    ) -> Result<Value, GatewayError> {
        if let Some((status, description)) = self.fail_with {
            return Err(GatewayError::Status {
                status,
                description: description.to_string(),
            });
        }
        if let Ok(mut orders) = self.orders.lock() {
            orders.push(request.clone());
        }
        Ok(json!({
            "id": "order_test_1",
            "amount": request.amount,
            "currency": request.currency,
            "key": credentials.key_id,
            "notes": {"returnUrl": request.notes.return_url},
        }))
    }

    async fn fetch_order(
        &self,
        _credentials: &Credentials,
        order_id: &str,
    ) -> Result<Value, GatewayError> {
        match self.return_url {
            Some(return_url) => Ok(json!({"id": order_id, "notes": {"returnUrl": return_url}})),
            None => Err(GatewayError::Transport("offline".to_string())),
        }
    }
}

fn keyless_app(pool: PgPool) -> Router {
    let config = PaymentConfig::new("http://127.0.0.1:9".to_string(), FRONTEND.to_string());
    let state = PaymentState::with_gateway(config, Arc::new(FakeGateway::default()));
    app_with(pool, auth_state(), Arc::new(state))
}

async fn post_form(app: &Router, uri: &str, form: &str) -> Result<axum::http::Response<Body>> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))?;
    Ok(app.clone().oneshot(request).await?)
}

fn location(response: &axum::http::Response<Body>) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn signed_form(order_id: &str, payment_id: &str) -> String {
    let signature = expected_signature(SECRET, order_id, payment_id).unwrap_or_default();
    format!(
        "razorpay_order_id={order_id}&razorpay_payment_id={payment_id}&razorpay_signature={signature}"
    )
}

#[tokio::test]
async fn get_key_exposes_only_the_key_id() -> Result<()> {
    let app = gateway_app(lazy_pool()?, Arc::new(FakeGateway::default()));
    let response = send(&app, "GET", "/api/getkey", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?, json!({"key": "rzp_test_key"}));

    let response = send(&keyless_app(lazy_pool()?), "GET", "/api/getkey", None, None).await?;
    assert_eq!(json_body(response).await?, json!({"key": null}));
    Ok(())
}

#[tokio::test]
async fn checkout_without_keys_is_a_server_error() -> Result<()> {
    let app = keyless_app(lazy_pool()?);
    let response = send(&app, "POST", "/api/checkout", None, Some(&json!({"amount": 10}))).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await?["message"], MISSING_KEYS);
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_bad_amounts() -> Result<()> {
    let gateway = Arc::new(FakeGateway::default());
    let app = gateway_app(lazy_pool()?, gateway.clone());

    for body in [json!({}), json!({"amount": -5}), json!({"amount": "ten"}), json!({"amount": 0.001})] {
        let response = send(&app, "POST", "/api/checkout", None, Some(&body)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await?["message"], "Invalid amount");
    }
    assert!(gateway.recorded().is_empty());
    Ok(())
}

#[tokio::test]
async fn checkout_creates_order_in_minor_units() -> Result<()> {
    let gateway = Arc::new(FakeGateway::default());
    let app = gateway_app(lazy_pool()?, gateway.clone());

    let response = send(
        &app,
        "POST",
        "/api/checkout",
        None,
        Some(&json!({"amount": "499.50", "returnUrl": "/plans?tier=pro"})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["order"]["id"], "order_test_1");
    assert_eq!(body["order"]["amount"], 49950);

    let response = send(
        &app,
        "POST",
        "/api/checkout",
        None,
        Some(&json!({"amount": 1, "returnUrl": "//evil.example.com"})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let orders = gateway.recorded();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].currency, "INR");
    assert_eq!(orders[0].notes.return_url, "/plans?tier=pro");
    assert_eq!(orders[1].amount, 100);
    assert_eq!(orders[1].notes.return_url, "/dashboard");
    Ok(())
}

#[tokio::test]
async fn checkout_relays_gateway_errors() -> Result<()> {
    let app = gateway_app(
        lazy_pool()?,
        Arc::new(FakeGateway::failing(400, "The amount must be at least INR 1.00")),
    );
    let response = send(&app, "POST", "/api/checkout", None, Some(&json!({"amount": 5}))).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "The amount must be at least INR 1.00");
    Ok(())
}

#[tokio::test]
async fn verification_rejects_missing_params_and_bad_signatures() -> Result<()> {
    let app = gateway_app(lazy_pool()?, Arc::new(FakeGateway::default()));

    let response = post_form(&app, "/api/paymentverification", "razorpay_order_id=order_1").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["message"], "Missing verification params");

    let form = "razorpay_order_id=order_1&razorpay_payment_id=pay_1&razorpay_signature=deadbeef";
    let response = post_form(&app, "/api/paymentverification", form).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["message"], "Invalid signature");

    let keyless = keyless_app(lazy_pool()?);
    let response = post_form(&keyless, "/api/paymentverification", &signed_form("o", "p")).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn verification_redirects_to_failure_when_storage_is_down() -> Result<()> {
    let app = gateway_app(lazy_pool()?, Arc::new(FakeGateway::returning("/plans")));
    let response = post_form(
        &app,
        "/api/paymentverification",
        &signed_form("order_1", "pay_1"),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some(format!("{FRONTEND}/dashboard?payment=failed"))
    );
    Ok(())
}

#[tokio::test]
async fn payment_list_is_admin_only() -> Result<()> {
    let app = gateway_app(lazy_pool()?, Arc::new(FakeGateway::default()));

    let response = send(&app, "GET", "/api/payments", None, None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = cookie_for(Uuid::new_v4(), "asha", Role::User)?;
    let response = send(&app, "GET", "/api/payments", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn verified_payment_is_recorded_and_listed() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let app = gateway_app(db.pool.clone(), Arc::new(FakeGateway::returning("/plans?tier=pro")));

    let response = post_form(
        &app,
        "/api/paymentverification",
        &signed_form("order_1", "pay_1"),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some(format!(
            "{FRONTEND}/plans?tier=pro&payment=success&reference=pay_1"
        ))
    );

    let offline = gateway_app(db.pool.clone(), Arc::new(FakeGateway::default()));
    let request = Request::builder()
        .method("POST")
        .uri(format!(
            "/api/paymentverification?{}",
            signed_form("order_2", "pay_2")
        ))
        .body(Body::empty())?;
    let response = offline.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some(format!("{FRONTEND}/dashboard?payment=success&reference=pay_2"))
    );

    let cookie = cookie_for(Uuid::new_v4(), "root", Role::Admin)?;
    let response = send(&app, "GET", "/api/payments?limit=1", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["meta"], json!({"total": 2, "page": 1, "limit": 1}));
    let data = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(data.len(), 1);
    assert!(data[0]["razorpay_order_id"].is_string());
    assert!(data[0]["createdAt"].is_string());
    Ok(())
}
