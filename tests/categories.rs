mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn empty_name_is_a_field_error() {
    let app = common::spawn().await;
    let (_, token) = app.user("ana@example.com").await;

    let res = app
        .post("/api/categories", &token, json!({ "name": "", "type": "EXPENSE" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({ "error": "Validation error", "details": { "name": ["Name is required"] } })
    );
}

#[tokio::test]
async fn list_filters_by_type_and_sorts_by_name() {
    let app = common::spawn().await;
    let (_, ana) = app.user("ana@example.com").await;
    let (_, bo) = app.user("bo@example.com").await;

    app.category(&ana, "Rent", "EXPENSE").await;
    app.category(&ana, "Groceries", "EXPENSE").await;
    app.category(&ana, "Salary", "INCOME").await;
    app.category(&bo, "Hobbies", "EXPENSE").await;

    let all = app.get("/api/categories", &ana).await;
    let names: Vec<&str> = all
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Groceries", "Rent", "Salary"]);

    let income = app.get("/api/categories?type=INCOME", &ana).await;
    assert_eq!(income.body.as_array().unwrap().len(), 1);
    assert_eq!(income.body[0]["name"], "Salary");

    let bad = app.get("/api/categories?type=OTHER", &ana).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn optional_fields_round_trip() {
    let app = common::spawn().await;
    let (_, token) = app.user("ana@example.com").await;

    let res = app
        .post(
            "/api/categories",
            &token,
            json!({ "name": "Travel", "type": "EXPENSE", "color": "#ff8800", "icon": "plane" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["color"], "#ff8800");
    assert_eq!(res.body["icon"], "plane");
}
