use crate::errors::{AppError, ClientError};
use crate::models::{
    BatchDeleteOutcome, BatchDeleteRequest, CrawlProgress, HistoryQuery, LoginRequest, Notice,
    SessionResponse,
};
use crate::state::AppState;
use crate::ui::render_index;
use crate::view::{history_rows, HistoryRow, ReportView, StatisticsView};
use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.dashboard.session()))
}

pub async fn get_latest(State(state): State<AppState>) -> Result<Json<ReportView>, AppError> {
    let view = state
        .dashboard
        .load_latest()
        .await
        .map_err(|err| AppError::from_client("Loading latest trending", err))?;
    Ok(Json(view))
}

pub async fn get_weekly(
    State(state): State<AppState>,
    Path((year, week)): Path<(i32, u32)>,
) -> Result<Json<ReportView>, AppError> {
    let view = state
        .dashboard
        .report_for_week(year, week)
        .await
        .map_err(|err| AppError::from_client("Loading weekly report", err))?;
    Ok(Json(view))
}

pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<StatisticsView>, AppError> {
    let view = state
        .dashboard
        .statistics()
        .await
        .map_err(|err| AppError::from_client("Loading statistics", err))?;
    Ok(Json(view))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(state.dashboard.session())
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }

    match state.dashboard.login(username, &payload.password).await {
        Ok(()) => Ok(Json(state.dashboard.session())),
        Err(ClientError::Unauthorized) => {
            warn!(username, "login rejected");
            Err(AppError::unauthorized("Invalid username or password"))
        }
        Err(ClientError::Http { status, .. }) if status < 500 => {
            Err(AppError::unauthorized("Invalid username or password"))
        }
        Err(err) => Err(AppError::from_client("Login", err)),
    }
}

pub async fn logout(State(state): State<AppState>) -> Json<SessionResponse> {
    state.dashboard.logout();
    Json(state.dashboard.session())
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRow>>, AppError> {
    let entries = state
        .dashboard
        .history(query.q.as_deref())
        .await
        .map_err(|err| AppError::from_client("Loading history", err))?;
    Ok(Json(history_rows(&entries)))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReportView>, AppError> {
    let report = state
        .dashboard
        .report_detail(id)
        .await
        .map_err(|err| AppError::from_client("Loading report", err))?;
    Ok(Json(ReportView::plain(&report)))
}

pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Notice>, AppError> {
    let notice = state
        .dashboard
        .delete_report(id)
        .await
        .map_err(|err| AppError::from_client("Delete", err))?;
    Ok(Json(notice))
}

pub async fn batch_delete(
    State(state): State<AppState>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<Json<BatchDeleteOutcome>, AppError> {
    let report = state
        .dashboard
        .batch_delete(&payload.ids)
        .await
        .map_err(|err| AppError::from_client("Batch delete", err))?;
    Ok(Json(BatchDeleteOutcome::from(report)))
}

pub async fn crawl(State(state): State<AppState>) -> Result<Json<Notice>, AppError> {
    let notice = state
        .dashboard
        .crawl()
        .await
        .map_err(|err| AppError::from_client("Crawl", err))?;
    Ok(Json(notice))
}

pub async fn get_crawl_progress(State(state): State<AppState>) -> Json<CrawlProgress> {
    Json(state.dashboard.crawl_progress())
}
