#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

use finance_tracker::backend::{
    auth::{hash_password, issue_token, AuthSettings},
    router, AppState,
};
use finance_tracker::database::db::{connection::memory_pool, migrate::run_migrations, queries};

pub struct TestApp {
    pub app: Router,
    pub pool: Pool<Sqlite>,
    pub auth: AuthSettings,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn spawn() -> TestApp {
    let pool = memory_pool().await.expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");

    let auth = AuthSettings {
        secret: "test-secret".into(),
        ttl_hours: 1,
    };
    let app = router(AppState::new(pool.clone(), auth.clone()));

    TestApp { app, pool, auth }
}

impl TestApp {
    /// Inserts a user directly and returns (id, bearer token).
    pub async fn user(&self, email: &str) -> (i64, String) {
        let hash = hash_password("password123").unwrap();
        let user = queries::create_user(&self.pool, email, &hash).await.unwrap();
        let token = issue_token(user.id, &self.auth).unwrap();
        (user.id, token)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Response {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a category and returns its id.
    pub async fn category(&self, token: &str, name: &str, kind: &str) -> i64 {
        let res = self
            .post(
                "/api/categories",
                token,
                serde_json::json!({ "name": name, "type": kind }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body["id"].as_i64().unwrap()
    }
}
