use axum::{extract::State, http::StatusCode, Json};

use crate::backend::auth::AuthUser;
use crate::backend::error::ApiResult;
use crate::backend::validation::{CategoryPayload, CategoryQuery, ValidJson, ValidQuery};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::Category;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<CategoryQuery>,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = queries::list_categories(&state.db, user_id, &query.into_filter()).await?;
    Ok(Json(categories))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CategoryPayload>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = queries::create_category(&state.db, user_id, &payload.into_new()?).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
