pub mod auth;
pub mod error;
mod handlers;
mod routes;
pub mod validation;

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::{Pool, Sqlite};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use auth::AuthSettings;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, auth: AuthSettings) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: &Config, pool: Pool<Sqlite>) -> anyhow::Result<()> {
    let auth = AuthSettings {
        secret: config.require_jwt_secret()?.to_string(),
        ttl_hours: config.session_ttl_hours,
    };
    let app = router(AppState::new(pool, auth));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("server listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
