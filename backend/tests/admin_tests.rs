//! Admin Tooling Tests
//!
//! Tests for store diagnostics, ledger integrity checks, and stock
//! rebuilds including:
//! - Violation detection: broken deltas, transfers with deltas,
//!   cached stock diverging from the ledger head, orphaned entries
//! - Rebuilding cached stock from the ledger, including negative heads
//! - Store-wide counts and strategy breakdowns

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use kc_backend::services::admin::{AdminService, ViolationKind};
use kc_backend::services::engine::{EngineService, ItemLocks};
use kc_backend::store::{ItemStore, LedgerStore, MemoryStore, OrderStore, Store};
use shared::models::{
    InventoryItem, OrderStatus, PurchaseOrder, StockTransaction, TransactionType,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn new_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

fn service_for(store: &Arc<dyn Store>) -> AdminService {
    let engine = EngineService::new(store.clone(), Arc::new(ItemLocks::new()));
    AdminService::new(store.clone(), engine)
}

/// An item tracked by weight in pounds
fn weight_item(name: &str, stock: &str) -> InventoryItem {
    let mut item = InventoryItem::new(name);
    item.pricing_type = Some("weight".to_string());
    item.stock_weight = dec(stock);
    item.stock_weight_unit = Some("lb".to_string());
    item
}

/// An item tracked by discrete count
fn count_item(name: &str, stock: &str) -> InventoryItem {
    let mut item = InventoryItem::new(name);
    item.price_per_unit = Some(dec("0.15"));
    item.stock_quantity = dec(stock);
    item
}

/// A raw ledger entry, bypassing service validation so corrupt rows can
/// be seeded
fn raw_entry(
    item_id: Uuid,
    transaction_type: TransactionType,
    quantity_change: &str,
    stock_before: &str,
    stock_after: &str,
) -> StockTransaction {
    StockTransaction {
        id: Uuid::new_v4(),
        item_id,
        transaction_type,
        quantity_change: dec(quantity_change),
        stock_before: dec(stock_before),
        stock_after: dec(stock_after),
        unit: "lb".to_string(),
        reference: None,
        reason: None,
        notes: None,
        unit_cost: None,
        total_cost: None,
        performed_by: None,
        created_at: Utc::now(),
        void: false,
        void_reason: None,
        voided_at: None,
    }
}

fn draft_order(order_number: &str) -> PurchaseOrder {
    let now = Utc::now();
    PurchaseOrder {
        id: Uuid::new_v4(),
        order_number: order_number.to_string(),
        vendor: Some("Norref".to_string()),
        status: OrderStatus::Draft,
        subtotal: Decimal::ZERO,
        gst: Decimal::ZERO,
        qst: Decimal::ZERO,
        total: Decimal::ZERO,
        expected_at: None,
        received_at: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test that a consistent store reports nothing
    #[tokio::test]
    async fn test_clean_store_reports_no_violations() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Farine tout usage", "20");
        store.insert_item(&item).await.unwrap();
        store
            .append_transaction(&raw_entry(
                item.id,
                TransactionType::Purchase,
                "5",
                "15",
                "20",
            ))
            .await
            .unwrap();

        let report = admin.integrity_report().await.unwrap();
        assert_eq!(report.checked_items, 1);
        assert_eq!(report.checked_transactions, 1);
        assert!(report.violations.is_empty());
    }

    /// Test detection of entries whose arithmetic does not close
    #[tokio::test]
    async fn test_detects_broken_delta() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Farine tout usage", "20");
        store.insert_item(&item).await.unwrap();
        store
            .append_transaction(&raw_entry(
                item.id,
                TransactionType::Adjustment,
                "5",
                "10",
                "20",
            ))
            .await
            .unwrap();

        let report = admin.integrity_report().await.unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::BrokenDelta);
        assert_eq!(report.violations[0].item_id, Some(item.id));
    }

    /// Test detection of transfers that moved stock in or out
    #[tokio::test]
    async fn test_detects_transfer_with_delta() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Beurre doux", "25");
        store.insert_item(&item).await.unwrap();
        store
            .append_transaction(&raw_entry(
                item.id,
                TransactionType::Transfer,
                "5",
                "20",
                "25",
            ))
            .await
            .unwrap();

        let report = admin.integrity_report().await.unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::TransferWithDelta);
    }

    /// Test detection of cached stock diverging from the ledger head
    #[tokio::test]
    async fn test_detects_head_mismatch() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Saumon atlantique", "50");
        store.insert_item(&item).await.unwrap();
        let head = raw_entry(item.id, TransactionType::TaskUsage, "-2", "20", "18");
        store.append_transaction(&head).await.unwrap();

        let report = admin.integrity_report().await.unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::HeadMismatch);
        assert_eq!(report.violations[0].transaction_id, Some(head.id));
    }

    /// Test that a voided head does not count against the cache
    #[tokio::test]
    async fn test_voided_head_is_skipped() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Saumon atlantique", "20");
        store.insert_item(&item).await.unwrap();
        store
            .append_transaction(&raw_entry(
                item.id,
                TransactionType::Purchase,
                "5",
                "15",
                "20",
            ))
            .await
            .unwrap();
        let mut cancelled = raw_entry(item.id, TransactionType::Adjustment, "5", "20", "25");
        cancelled.void = true;
        cancelled.void_reason = Some("Entered twice".to_string());
        store.append_transaction(&cancelled).await.unwrap();

        let report = admin.integrity_report().await.unwrap();
        assert!(report.violations.is_empty());
    }

    /// Test detection of entries pointing at missing items
    #[tokio::test]
    async fn test_detects_orphaned_entry() {
        let store = new_store();
        let admin = service_for(&store);
        store
            .append_transaction(&raw_entry(
                Uuid::new_v4(),
                TransactionType::Adjustment,
                "5",
                "0",
                "5",
            ))
            .await
            .unwrap();

        let report = admin.integrity_report().await.unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::OrphanedEntry);
    }

    /// Test that a rebuild snaps cached stock back to the ledger head
    /// and leaves an audit trail
    #[tokio::test]
    async fn test_rebuild_corrects_drift() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Farine tout usage", "50");
        store.insert_item(&item).await.unwrap();
        store
            .append_transaction(&raw_entry(
                item.id,
                TransactionType::Purchase,
                "2",
                "40",
                "42",
            ))
            .await
            .unwrap();

        let outcome = admin.rebuild_stock(item.id, None).await.unwrap();
        assert!(outcome.corrected);
        assert_eq!(outcome.previous, dec("50"));
        assert_eq!(outcome.rebuilt, dec("42"));
        assert_eq!(outcome.unit, "lb");

        let current = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(current.stock_weight, dec("42"));

        let entries = store.transactions_for_item(item.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        let correction = entries.last().unwrap();
        assert_eq!(correction.transaction_type, TransactionType::CountCorrection);
        assert_eq!(correction.quantity_change, dec("-8"));
        assert_eq!(correction.reason.as_deref(), Some("Rebuilt from ledger"));
        assert_eq!(outcome.transaction_id, Some(correction.id));
    }

    /// Test that a consistent item rebuilds to a no-op
    #[tokio::test]
    async fn test_rebuild_noop_when_consistent() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Beurre doux", "20");
        store.insert_item(&item).await.unwrap();
        store
            .append_transaction(&raw_entry(
                item.id,
                TransactionType::Purchase,
                "5",
                "15",
                "20",
            ))
            .await
            .unwrap();

        let outcome = admin.rebuild_stock(item.id, None).await.unwrap();
        assert!(!outcome.corrected);
        assert_eq!(outcome.transaction_id, None);
        assert_eq!(store.transactions_for_item(item.id).await.unwrap().len(), 1);
    }

    /// Test that an item without history is left alone
    #[tokio::test]
    async fn test_rebuild_noop_without_history() {
        let store = new_store();
        let admin = service_for(&store);
        let item = weight_item("Beurre doux", "20");
        store.insert_item(&item).await.unwrap();

        let outcome = admin.rebuild_stock(item.id, None).await.unwrap();
        assert!(!outcome.corrected);
        assert_eq!(outcome.previous, dec("20"));
        assert_eq!(outcome.rebuilt, dec("20"));
    }

    /// Test that a rebuild can land on a negative head, which manual
    /// counts may not
    #[tokio::test]
    async fn test_rebuild_handles_negative_head() {
        let store = new_store();
        let admin = service_for(&store);
        let item = count_item("Boîtes à emporter", "5");
        store.insert_item(&item).await.unwrap();
        let mut drifted = raw_entry(item.id, TransactionType::TaskUsage, "-2", "-1", "-3");
        drifted.unit = "ea".to_string();
        store.append_transaction(&drifted).await.unwrap();

        let outcome = admin.rebuild_stock(item.id, None).await.unwrap();
        assert!(outcome.corrected);
        assert_eq!(outcome.rebuilt, dec("-3"));

        let current = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(current.stock_quantity, dec("-3"));
    }

    /// Test store-wide counts and the strategy breakdown
    #[tokio::test]
    async fn test_store_diagnostics_counts() {
        let store = new_store();
        let admin = service_for(&store);

        let flour = weight_item("Farine tout usage", "20");
        let mut oil = InventoryItem::new("Huile d'olive");
        oil.price_per_ml = Some(dec("0.002"));
        oil.stock_weight = dec("600");
        oil.stock_weight_unit = Some("ml".to_string());
        let mut retired = count_item("Pailles en plastique", "0");
        retired.active = false;
        store.insert_item(&flour).await.unwrap();
        store.insert_item(&oil).await.unwrap();
        store.insert_item(&retired).await.unwrap();

        store
            .append_transaction(&raw_entry(
                flour.id,
                TransactionType::Purchase,
                "5",
                "15",
                "20",
            ))
            .await
            .unwrap();
        let mut cancelled = raw_entry(flour.id, TransactionType::Adjustment, "1", "20", "21");
        cancelled.void = true;
        store.append_transaction(&cancelled).await.unwrap();

        store.insert_order(&draft_order("PO-2026-0001")).await.unwrap();

        let diagnostics = admin.store_diagnostics().await.unwrap();
        assert_eq!(diagnostics.counts.items, 3);
        assert_eq!(diagnostics.counts.transactions, 2);
        assert_eq!(diagnostics.counts.orders, 1);
        assert_eq!(diagnostics.active_items, 2);
        assert_eq!(diagnostics.inactive_items, 1);
        assert_eq!(diagnostics.items_by_strategy.weight, 1);
        assert_eq!(diagnostics.items_by_strategy.volume, 1);
        assert_eq!(diagnostics.items_by_strategy.count, 1);
        assert_eq!(diagnostics.voided_transactions, 1);
        assert_eq!(diagnostics.open_orders, 1);
    }
}
