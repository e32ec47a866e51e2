use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use super::today;
use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::validation::{SavingsGoalPatch, SavingsGoalPayload, ValidJson};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::SavingsGoal;
use crate::progress::{savings_progress, time_remaining, TimeRemaining};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalView {
    #[serde(flatten)]
    pub goal: SavingsGoal,
    pub progress: i64,
    pub time_remaining: TimeRemaining,
}

impl SavingsGoalView {
    fn new(goal: SavingsGoal, today: NaiveDate) -> Self {
        Self {
            progress: savings_progress(goal.current_amount, goal.target_amount),
            time_remaining: time_remaining(goal.target_date, today),
            goal,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<SavingsGoalView>>> {
    let today = today();
    let goals = queries::list_savings_goals(&state.db, user_id).await?;
    Ok(Json(
        goals
            .into_iter()
            .map(|goal| SavingsGoalView::new(goal, today))
            .collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<SavingsGoalPayload>,
) -> ApiResult<(StatusCode, Json<SavingsGoalView>)> {
    let goal = queries::create_savings_goal(&state.db, user_id, &payload.into_new()?).await?;
    Ok((StatusCode::CREATED, Json(SavingsGoalView::new(goal, today()))))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(patch): ValidJson<SavingsGoalPatch>,
) -> ApiResult<Json<SavingsGoalView>> {
    let (id, changes) = patch.into_changes()?;

    let goal = if changes.is_empty() {
        queries::get_savings_goal(&state.db, user_id, id).await?
    } else {
        queries::update_savings_goal(&state.db, user_id, id, &changes).await?
    };

    let goal = goal.ok_or(ApiError::NotFound("Savings goal"))?;
    Ok(Json(SavingsGoalView::new(goal, today())))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if queries::delete_savings_goal(&state.db, user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Savings goal"))
    }
}
