use anyhow::Result;
use axum::http::{
    StatusCode,
    header::{AUTHORIZATION, SET_COOKIE},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use super::Role;
use crate::api::handlers::test_support::{
    TestDb, cookie_for, default_app, json_body, lazy_pool, seed_user, send,
};

fn set_cookie(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[tokio::test]
async fn register_validates_input() -> Result<()> {
    let app = default_app(lazy_pool()?)?;

    let cases = [
        (json!({}), "userid, email and password are required"),
        (
            json!({"userid": "  ", "email": "a@example.com", "password": "secret1"}),
            "userid, email and password are required",
        ),
        (
            json!({"userid": "asha", "email": "not-an-email", "password": "secret1"}),
            "Valid email required",
        ),
        (
            json!({"userid": "asha", "email": "a@example.com", "password": "12345"}),
            "Password must be at least 6 characters",
        ),
    ];
    for (body, message) in cases {
        let response = send(&app, "POST", "/user", None, Some(&body)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], message);
    }
    Ok(())
}

#[tokio::test]
async fn login_requires_a_handle_and_password() -> Result<()> {
    let app = default_app(lazy_pool()?)?;

    for body in [json!({}), json!({"userid": "asha"}), json!({"password": "secret1"})] {
        let response = send(&app, "POST", "/login", None, Some(&body)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await?["message"],
            "Provide userid or email and password"
        );
    }
    Ok(())
}

#[tokio::test]
async fn session_check_reports_missing_and_bad_tokens() -> Result<()> {
    let app = default_app(lazy_pool()?)?;

    let response = send(&app, "GET", "/login/check", None, None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await?["message"], "Not authenticated");

    let response = send(&app, "GET", "/login/check", Some("token=garbage"), None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await?["message"], "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn session_check_accepts_cookie_and_bearer() -> Result<()> {
    let app = default_app(lazy_pool()?)?;
    let user_id = Uuid::new_v4();

    let cookie = cookie_for(user_id, "asha", Role::Admin)?;
    let response = send(&app, "GET", "/login/check", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body, json!({"success": true, "userid": "asha", "role": "admin"}));

    let token = cookie.trim_start_matches("token=");
    let request = axum::http::Request::builder()
        .uri("/login/check")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let app = default_app(lazy_pool()?)?;

    let response = send(&app, "POST", "/logout", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(json_body(response).await?["message"], "Logged out successfully");
    Ok(())
}

#[tokio::test]
async fn register_then_login_by_userid_or_email() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let app = default_app(db.pool.clone())?;

    let request = json!({"userid": "asha", "email": " Asha@Example.com ", "password": "secret1"});
    let response = send(&app, "POST", "/user", None, Some(&request)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await?;
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert!(body["profile"]["id"].as_str().is_some());

    let response = send(&app, "POST", "/user", None, Some(&request)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await?["message"],
        "Email or userid already registered"
    );

    let response = send(
        &app,
        "POST",
        "/login",
        None,
        Some(&json!({"userid": "asha", "password": "secret1"})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    let body = json_body(response).await?;
    assert_eq!(body["userid"], "asha");
    assert_eq!(body["role"], "user");

    let session = cookie.split(';').next().unwrap_or_default().to_string();
    let response = send(&app, "GET", "/login/check", Some(&session), None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "POST",
        "/login",
        None,
        Some(&json!({"email": "ASHA@example.com", "password": "secret1"})),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn login_failures_look_the_same() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let app = default_app(db.pool.clone())?;
    seed_user(&db.pool, "asha", "asha@example.com", "secret1", Role::User).await?;

    for body in [
        json!({"userid": "asha", "password": "wrong-password"}),
        json!({"userid": "nobody", "password": "secret1"}),
        json!({"email": "nobody@example.com", "password": "secret1"}),
    ] {
        let response = send(&app, "POST", "/login", None, Some(&body)).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await?["message"], "Invalid credentials");
    }
    Ok(())
}
