use axum::{extract::State, Json};

use crate::backend::auth::AuthUser;
use crate::backend::error::ApiResult;
use crate::backend::validation::{ReportQuery, ValidQuery};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::progress::{summarize, ReportSummary};

pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(query): ValidQuery<ReportQuery>,
) -> ApiResult<Json<ReportSummary>> {
    let (start, end) = query.into_range()?;
    let rows = queries::report_rows(&state.db, user_id, start, end).await?;
    let summary = summarize(&rows).map_err(anyhow::Error::from)?;
    Ok(Json(summary))
}
