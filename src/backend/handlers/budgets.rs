use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use super::today;
use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::validation::{BudgetPayload, BudgetQuery, ValidJson, ValidQuery};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::{Budget, BudgetItem};
use crate::progress::{budget_progress, BudgetProgress, ItemProgress};

#[derive(Debug, Serialize)]
pub struct BudgetItemView {
    #[serde(flatten)]
    pub item: BudgetItem,
    pub progress: ItemProgress,
}

/// A budget as returned by the API: its items, each with progress, plus the
/// budget-wide totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub budget_items: Vec<BudgetItemView>,
    pub progress: BudgetProgress,
}

async fn view(pool: &Pool<Sqlite>, budget: Budget) -> ApiResult<BudgetView> {
    let totals =
        queries::category_totals(pool, budget.user_id, budget.start_date, budget.end_date).await?;
    let mut progress = budget_progress(&budget, &totals).map_err(anyhow::Error::from)?;

    let budget_items = budget
        .items
        .into_iter()
        .zip(std::mem::take(&mut progress.items))
        .map(|(item, progress)| BudgetItemView { item, progress })
        .collect();

    Ok(BudgetView {
        id: budget.id,
        user_id: budget.user_id,
        name: budget.name,
        start_date: budget.start_date,
        end_date: budget.end_date,
        created_at: budget.created_at,
        budget_items,
        progress,
    })
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<BudgetQuery>,
) -> ApiResult<Json<Vec<BudgetView>>> {
    let filter = query.into_filter(today());
    tracing::debug!(user_id, ?filter, "listing budgets");

    let budgets = queries::list_budgets(&state.db, user_id, &filter).await?;
    let mut views = Vec::with_capacity(budgets.len());
    for budget in budgets {
        views.push(view(&state.db, budget).await?);
    }
    Ok(Json(views))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<BudgetPayload>,
) -> ApiResult<(StatusCode, Json<BudgetView>)> {
    let new = payload.into_new()?;

    for item in &new.items {
        queries::find_category(&state.db, user_id, item.category_id)
            .await?
            .ok_or(ApiError::NotFound("Category"))?;
    }

    let budget = queries::create_budget(&state.db, user_id, &new).await?;
    Ok((StatusCode::CREATED, Json(view(&state.db, budget).await?)))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if queries::delete_budget(&state.db, user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Budget"))
    }
}
