//! Route definitions for the KitchenCommand inventory platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Item catalog and stock ledger
        .nest("/inventory", inventory_routes())
        // Recipe-driven deductions
        .nest("/deduction", deduction_routes())
        // Purchasing
        .nest("/orders", order_routes())
        // Diagnostics and repair
        .nest("/admin", admin_routes())
}

/// Item catalog, stock mutations, and ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Items
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/items/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::deactivate_item),
        )
        // Stock mutations
        .route("/items/:item_id/adjust", post(handlers::adjust_stock))
        .route("/items/:item_id/set-level", post(handlers::set_stock_level))
        .route("/items/:item_id/receive", post(handlers::receive_stock))
        .route("/items/:item_id/deduct", post(handlers::deduct_stock))
        .route("/items/:item_id/waste", post(handlers::record_waste))
        .route("/bulk-adjust", post(handlers::bulk_adjust))
        // Ledger
        .route("/items/:item_id/history", get(handlers::get_history))
        .route("/items/:item_id/history.csv", get(handlers::export_history_csv))
        .route("/items/:item_id/summary", get(handlers::get_summary))
        .route("/transactions", post(handlers::append_transaction))
        .route("/transactions/:transaction_id", get(handlers::get_transaction))
        .route(
            "/transactions/:transaction_id/void",
            post(handlers::void_transaction),
        )
        .route(
            "/references/:reference_type/:reference_id",
            get(handlers::get_transactions_by_reference),
        )
        // Procurement signals
        .route("/reorder-report", get(handlers::reorder_report))
}

/// Recipe deduction routes
fn deduction_routes() -> Router<AppState> {
    Router::new().route("/tasks", post(handlers::deduct_for_task))
}

/// Purchase order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route("/:order_id/lines", post(handlers::add_line))
        .route("/:order_id/status", post(handlers::update_status))
        .route("/:order_id/receive", post(handlers::receive_order))
}

/// Diagnostics and repair routes
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/diagnostics", get(handlers::store_diagnostics))
        .route("/integrity", get(handlers::integrity_report))
        .route("/items/:item_id/rebuild", post(handlers::rebuild_stock))
}
