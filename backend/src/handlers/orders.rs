//! Purchase order HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::OrderStatus;

use crate::{
    error::AppResult,
    services::engine::EngineService,
    services::orders::{CreateOrderInput, NewLineInput, OrderService, ReceiveInput},
    AppState,
};

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
}

/// Input for a status transition
#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

fn order_service(state: &AppState) -> OrderService {
    let engine = EngineService::new(state.store.clone(), state.locks.clone());
    OrderService::new(state.store.clone(), engine)
}

/// Create a purchase order in draft
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<impl IntoResponse> {
    let order = order_service(&state).create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders, optionally filtered by status
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<impl IntoResponse> {
    let orders = order_service(&state).list_orders(query.status).await?;
    Ok(Json(serde_json::json!({ "orders": orders })))
}

/// Get an order with its lines
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let order = order_service(&state).get_order(order_id).await?;
    Ok(Json(order))
}

/// Add a line to a draft order
pub async fn add_line(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<NewLineInput>,
) -> AppResult<impl IntoResponse> {
    let order = order_service(&state).add_line(order_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Move an order through its lifecycle
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<impl IntoResponse> {
    let order = order_service(&state)
        .update_status(order_id, input.status)
        .await?;
    Ok(Json(order))
}

/// Receive goods against order lines, adding stock and ledger entries
pub async fn receive_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ReceiveInput>,
) -> AppResult<impl IntoResponse> {
    let outcome = order_service(&state).receive_lines(order_id, input).await?;
    Ok(Json(outcome))
}
