//! Reorder report HTTP handlers

use axum::{extract::State, response::IntoResponse, Json};

use crate::{error::AppResult, services::reorder::ReorderService, AppState};

/// Items at or below their reorder point, most urgent first
pub async fn reorder_report(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = ReorderService::new(state.store.clone());
    let report = service.reorder_report().await?;
    Ok(Json(report))
}
