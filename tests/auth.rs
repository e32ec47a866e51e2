mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

#[tokio::test]
async fn health_is_public() {
    let app = common::spawn().await;
    let res = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn api_requires_a_session() {
    let app = common::spawn().await;

    for uri in [
        "/api/transactions",
        "/api/categories",
        "/api/budgets",
        "/api/savings-goals",
        "/api/reports/summary",
    ] {
        let res = app.call(Method::GET, uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(res.body, json!({ "error": "Unauthorized" }));
    }

    let res = app
        .call(Method::GET, "/api/categories", Some("not-a-jwt"), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .call(
            Method::POST,
            "/api/transactions",
            None,
            Some(json!({ "amount": -5, "description": "x", "date": "2024-01-01" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_use_cookie() {
    let app = common::spawn().await;
    let creds = json!({ "email": "Ana@Example.com", "password": "correct-horse" });

    let res = app
        .call(Method::POST, "/api/auth/register", None, Some(creds.clone()))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["email"], "ana@example.com");

    let again = app
        .call(Method::POST, "/api/auth/register", None, Some(creds.clone()))
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert!(again.body["details"]["email"].is_array());

    let wrong = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "wrong-horse" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let login = app
        .call(Method::POST, "/api/auth/login", None, Some(creds))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.body["token"].is_string());

    let cookie = login.headers[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.contains("HttpOnly"));
    let pair = cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/categories")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = common::spawn().await;
    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "bo@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["details"]["password"],
        json!(["Password must be at least 8 characters"])
    );
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = common::spawn().await;
    let res = app.call(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let cookie = res.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}
