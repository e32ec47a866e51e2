use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/transactions",
            get(handlers::transactions::list).post(handlers::transactions::create),
        )
        .route("/api/transactions/:id", delete(handlers::transactions::remove))
        .route(
            "/api/categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/api/budgets",
            get(handlers::budgets::list).post(handlers::budgets::create),
        )
        .route("/api/budgets/:id", delete(handlers::budgets::remove))
        .route(
            "/api/savings-goals",
            get(handlers::savings_goals::list)
                .post(handlers::savings_goals::create)
                .patch(handlers::savings_goals::update),
        )
        .route("/api/savings-goals/:id", delete(handlers::savings_goals::remove))
        .route("/api/reports/summary", get(handlers::reports::summary))
}
