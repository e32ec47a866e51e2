use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::validation::{TransactionPayload, TransactionQuery, ValidJson, ValidQuery};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::Transaction;
use crate::progress::Pagination;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<TransactionQuery>,
) -> ApiResult<Json<Value>> {
    let filter = query.into_filter()?;
    tracing::debug!(user_id, ?filter, "listing transactions");

    let transactions = queries::list_transactions(&state.db, user_id, &filter).await?;
    let total = queries::count_transactions(&state.db, user_id, &filter).await?;

    Ok(Json(json!({
        "transactions": transactions,
        "pagination": Pagination::new(total, filter.page, filter.limit),
    })))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<TransactionPayload>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let new = payload.into_new()?;

    if let Some(category_id) = new.category_id {
        queries::find_category(&state.db, user_id, category_id)
            .await?
            .ok_or(ApiError::NotFound("Category"))?;
    }

    let transaction = queries::create_transaction(&state.db, user_id, &new).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if queries::delete_transaction(&state.db, user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Transaction"))
    }
}
