use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::backend::auth::{expired_cookie, hash_password, issue_token, session_cookie, verify_password};
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::validation::{normalize_email, LoginPayload, RegisterPayload, ValidJson};
use crate::backend::AppState;
use crate::database::db::queries;

pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterPayload>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);

    if queries::find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::field("email", "Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = queries::create_user(&state.db, &email, &hash).await?;
    tracing::info!(user_id = user.id, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": user.id, "email": user.email })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginPayload>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);

    let user = match queries::find_user_by_email(&state.db, &email).await? {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::warn!(%email, "rejected login");
            return Err(ApiError::Unauthorized);
        }
    };

    let token = issue_token(user.id, &state.auth)?;
    let cookie = session_cookie(&token, &state.auth);

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(json!({ "id": user.id, "email": user.email, "token": token })),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(SET_COOKIE, expired_cookie())])
}
