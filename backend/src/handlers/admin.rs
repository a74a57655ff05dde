//! Admin and integrity HTTP handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::admin::AdminService,
    services::engine::EngineService,
    AppState,
};

/// Input for rebuilding cached stock from the ledger
#[derive(Debug, Deserialize)]
pub struct RebuildInput {
    pub performed_by: Option<String>,
}

fn admin_service(state: &AppState) -> AdminService {
    let engine = EngineService::new(state.store.clone(), state.locks.clone());
    AdminService::new(state.store.clone(), engine)
}

/// Row counts and catalog breakdown
pub async fn store_diagnostics(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let diagnostics = admin_service(&state).store_diagnostics().await?;
    Ok(Json(diagnostics))
}

/// Structural checks across items and the ledger
pub async fn integrity_report(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let report = admin_service(&state).integrity_report().await?;
    Ok(Json(report))
}

/// Reset an item's cached stock to its ledger head
pub async fn rebuild_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<RebuildInput>,
) -> AppResult<impl IntoResponse> {
    let outcome = admin_service(&state)
        .rebuild_stock(item_id, input.performed_by)
        .await?;
    Ok(Json(outcome))
}
