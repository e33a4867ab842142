use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/latest", get(handlers::get_latest))
        .route("/api/weekly/:year/:week", get(handlers::get_weekly))
        .route("/api/statistics", get(handlers::get_statistics))
        .route("/api/session", get(handlers::get_session))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/history", get(handlers::get_history))
        .route("/api/reports/batch-delete", post(handlers::batch_delete))
        .route(
            "/api/reports/:id",
            get(handlers::get_report).delete(handlers::delete_report),
        )
        .route("/api/crawl", post(handlers::crawl))
        .route("/api/crawl/progress", get(handlers::get_crawl_progress))
        .with_state(state)
}
