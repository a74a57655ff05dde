//! Stock ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::ReferenceType;
use shared::types::DateRange;

use crate::{
    error::{AppError, AppResult},
    services::ledger::{AppendEntryInput, LedgerService},
    AppState,
};

/// Query parameters for item history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Query parameters for the ledger summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Input for voiding a ledger entry
#[derive(Debug, Deserialize)]
pub struct VoidInput {
    pub reason: String,
    pub performed_by: Option<String>,
}

/// Append a manual ledger entry
pub async fn append_transaction(
    State(state): State<AppState>,
    Json(input): Json<AppendEntryInput>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.store.clone());
    let transaction = service.append(input).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Get a single ledger entry
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.store.clone());
    let transaction = service.entry(transaction_id).await?;
    Ok(Json(transaction))
}

/// Void a ledger entry, excluding it from balance math
pub async fn void_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(input): Json<VoidInput>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.store.clone());
    let transaction = service
        .void(transaction_id, &input.reason, input.performed_by)
        .await?;
    Ok(Json(transaction))
}

/// Item history with running balances, newest first
pub async fn get_history(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.store.clone());
    let entries = service.history_for(item_id, query.limit).await?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

/// Item history as a CSV download
pub async fn export_history_csv(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.store.clone());
    let csv = service.export_csv(item_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"stock-history.csv\"",
            ),
        ],
        csv,
    ))
}

/// Aggregated ledger summary for an item
pub async fn get_summary(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<impl IntoResponse> {
    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        (None, None) => None,
        _ => {
            return Err(AppError::Validation {
                field: "range".to_string(),
                message: "start and end must be provided together".to_string(),
                message_fr: "Les dates de début et de fin doivent être fournies ensemble"
                    .to_string(),
            })
        }
    };

    let service = LedgerService::new(state.store.clone());
    let summary = service.summary_for(item_id, range).await?;
    Ok(Json(summary))
}

/// Ledger entries linked to a source document
pub async fn get_transactions_by_reference(
    State(state): State<AppState>,
    Path((reference_type, reference_id)): Path<(String, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let reference_type: ReferenceType =
        reference_type
            .parse()
            .map_err(|_| AppError::Validation {
                field: "reference_type".to_string(),
                message: format!("unknown reference type: {}", reference_type),
                message_fr: "Type de référence inconnu".to_string(),
            })?;

    let service = LedgerService::new(state.store.clone());
    let entries = service
        .entries_for_reference(reference_type, reference_id)
        .await?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}
