//! Inventory item catalog HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::items::{CreateItemInput, ItemService, UpdateItemInput},
    AppState,
};

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub include_inactive: Option<bool>,
}

/// Create a new inventory item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.store.clone());
    let item = service.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List items with resolved strategy and threshold status
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.store.clone());
    let include_inactive = query.include_inactive.unwrap_or(false);
    let items = service.list_items(include_inactive).await?;
    Ok(Json(serde_json::json!({ "items": items })))
}

/// Get a single item
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.store.clone());
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Update item metadata
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.store.clone());
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Deactivate an item (soft delete)
pub async fn deactivate_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.store.clone());
    let item = service.deactivate_item(item_id).await?;
    Ok(Json(item))
}
