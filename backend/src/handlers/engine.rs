//! Stock mutation HTTP handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::engine::{AdjustRequest, DeductOptions, EngineService, ReceiptInput},
    AppState,
};

/// Input for a relative stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub delta: Decimal,
    pub reason: String,
    pub performed_by: Option<String>,
}

/// Input for an absolute level correction (physical count)
#[derive(Debug, Deserialize)]
pub struct SetLevelInput {
    pub level: Decimal,
    pub reason: String,
    pub performed_by: Option<String>,
}

/// Input for a usage deduction outside task flows
#[derive(Debug, Deserialize)]
pub struct DeductStockInput {
    pub quantity: Decimal,
    #[serde(default)]
    pub allow_negative: bool,
    pub performed_by: Option<String>,
}

/// Input for recording spoilage or waste
#[derive(Debug, Deserialize)]
pub struct WasteInput {
    pub quantity: Decimal,
    pub reason: String,
    pub performed_by: Option<String>,
}

/// Input for adjusting several items in one call
#[derive(Debug, Deserialize)]
pub struct BulkAdjustInput {
    pub adjustments: Vec<AdjustRequest>,
    /// Apply what succeeds instead of all-or-nothing
    #[serde(default)]
    pub continue_on_error: bool,
}

/// Apply a signed delta to an item's stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<impl IntoResponse> {
    let service = EngineService::new(state.store.clone(), state.locks.clone());
    let outcome = service
        .adjust(item_id, input.delta, &input.reason, input.performed_by)
        .await?;
    Ok(Json(outcome))
}

/// Set an item's stock to an absolute level
pub async fn set_stock_level(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<SetLevelInput>,
) -> AppResult<impl IntoResponse> {
    let service = EngineService::new(state.store.clone(), state.locks.clone());
    let outcome = service
        .set_absolute(item_id, input.level, &input.reason, input.performed_by)
        .await?;
    Ok(Json(outcome))
}

/// Receive goods directly, outside any purchase order
pub async fn receive_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<ReceiptInput>,
) -> AppResult<impl IntoResponse> {
    let service = EngineService::new(state.store.clone(), state.locks.clone());
    let outcome = service.add_from_receipt(item_id, input, None).await?;
    Ok(Json(outcome))
}

/// Deduct stock for usage
pub async fn deduct_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<DeductStockInput>,
) -> AppResult<impl IntoResponse> {
    let service = EngineService::new(state.store.clone(), state.locks.clone());
    let options = DeductOptions {
        allow_negative: input.allow_negative,
        performed_by: input.performed_by,
    };
    let outcome = service
        .deduct_for_usage(item_id, input.quantity, None, options)
        .await?;
    Ok(Json(outcome))
}

/// Record waste or spoilage
pub async fn record_waste(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<WasteInput>,
) -> AppResult<impl IntoResponse> {
    let service = EngineService::new(state.store.clone(), state.locks.clone());
    let outcome = service
        .record_waste(item_id, input.quantity, &input.reason, input.performed_by)
        .await?;
    Ok(Json(outcome))
}

/// Adjust several items in one request
pub async fn bulk_adjust(
    State(state): State<AppState>,
    Json(input): Json<BulkAdjustInput>,
) -> AppResult<impl IntoResponse> {
    let service = EngineService::new(state.store.clone(), state.locks.clone());
    let outcome = service
        .bulk_adjust(input.adjustments, input.continue_on_error)
        .await?;
    Ok(Json(outcome))
}
