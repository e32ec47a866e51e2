mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

#[tokio::test]
async fn create_defaults_and_derived_fields() {
    let app = common::spawn().await;
    let (_, token) = app.user("ana@example.com").await;
    let in_ten_days = Utc::now().date_naive() + Duration::days(10);

    let res = app
        .post(
            "/api/savings-goals",
            &token,
            json!({ "name": "Trip", "targetAmount": 1000, "targetDate": in_ten_days.to_string() }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["currentAmount"], json!(0.0));
    assert_eq!(res.body["progress"], json!(0));
    assert_eq!(res.body["timeRemaining"], "10 days left");

    let undated = app
        .post(
            "/api/savings-goals",
            &token,
            json!({ "name": "Rainy day", "targetAmount": 200, "currentAmount": 250 }),
        )
        .await;
    assert_eq!(undated.body["progress"], json!(100));
    assert_eq!(undated.body["timeRemaining"], "no target date");

    let list = app.get("/api/savings-goals", &token).await;
    let names: Vec<&str> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Rainy day", "Trip"]);
}

#[tokio::test]
async fn patch_updates_only_given_fields() {
    let app = common::spawn().await;
    let (_, token) = app.user("ana@example.com").await;

    let created = app
        .post(
            "/api/savings-goals",
            &token,
            json!({ "name": "Car", "targetAmount": 5000, "targetDate": "2099-01-01" }),
        )
        .await;
    let id = created.body["id"].as_i64().unwrap();

    let res = app
        .patch(
            "/api/savings-goals",
            &token,
            json!({ "id": id, "currentAmount": 1250 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["name"], "Car");
    assert_eq!(res.body["targetDate"], "2099-01-01");
    assert_eq!(res.body["progress"], json!(25));

    let invalid = app
        .patch(
            "/api/savings-goals",
            &token,
            json!({ "id": id, "targetAmount": 0 }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.body["details"]["targetAmount"].is_array());
}

#[tokio::test]
async fn patch_requires_id_and_ownership() {
    let app = common::spawn().await;
    let (_, ana) = app.user("ana@example.com").await;
    let (_, bo) = app.user("bo@example.com").await;

    let created = app
        .post(
            "/api/savings-goals",
            &ana,
            json!({ "name": "House", "targetAmount": 90000 }),
        )
        .await;
    let id = created.body["id"].as_i64().unwrap();

    let missing = app
        .patch("/api/savings-goals", &ana, json!({ "currentAmount": 5 }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body, json!({ "error": "Savings goal ID is required" }));

    let foreign = app
        .patch(
            "/api/savings-goals",
            &bo,
            json!({ "id": id, "currentAmount": 90000 }),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let list = app.get("/api/savings-goals", &ana).await;
    assert_eq!(list.body[0]["currentAmount"], json!(0.0));
}

#[tokio::test]
async fn past_due_and_delete() {
    let app = common::spawn().await;
    let (_, ana) = app.user("ana@example.com").await;
    let (_, bo) = app.user("bo@example.com").await;

    let created = app
        .post(
            "/api/savings-goals",
            &ana,
            json!({ "name": "Old", "targetAmount": 10, "targetDate": "2001-01-01" }),
        )
        .await;
    assert_eq!(created.body["timeRemaining"], "past due");

    let uri = format!("/api/savings-goals/{}", created.body["id"]);
    assert_eq!(app.delete(&uri, &bo).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, &ana).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/savings-goals", &ana).await.body, json!([]));
}
