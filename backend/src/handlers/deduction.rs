//! Recipe deduction HTTP handlers

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    error::AppResult,
    services::deduction::{DeductForTaskInput, DeductionService},
    services::engine::EngineService,
    AppState,
};

/// Deduct ingredient and packaging stock for a completed task
pub async fn deduct_for_task(
    State(state): State<AppState>,
    Json(input): Json<DeductForTaskInput>,
) -> AppResult<impl IntoResponse> {
    let engine = EngineService::new(state.store.clone(), state.locks.clone());
    let service = DeductionService::new(state.store.clone(), engine);
    let report = service.deduct_for_task(input).await?;
    Ok(Json(report))
}
