//! Stock Ledger Tests
//!
//! Tests for the append-only ledger including:
//! - Entry validation (unit, transfer, stock_after consistency)
//! - Cost derivation from unit cost
//! - Voiding entries without rewriting amounts
//! - History with running balances that survive voids
//! - Period summaries and per-type breakdowns
//! - CSV export and reference lookups

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use kc_backend::error::AppError;
use kc_backend::services::ledger::{AppendEntryInput, LedgerService};
use kc_backend::store::{ItemStore, LedgerStore, MemoryStore, Store};
use shared::models::{InventoryItem, ReferenceType, StockReference, TransactionType};
use shared::types::DateRange;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn new_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

async fn seed_item(store: &Arc<dyn Store>, name: &str) -> InventoryItem {
    let mut item = InventoryItem::new(name);
    item.pricing_type = Some("weight".to_string());
    item.stock_weight = dec("20");
    item.stock_weight_unit = Some("lb".to_string());
    store.insert_item(&item).await.unwrap();
    item
}

fn entry_input(
    item_id: Uuid,
    transaction_type: TransactionType,
    quantity_change: &str,
    stock_before: &str,
) -> AppendEntryInput {
    AppendEntryInput {
        item_id,
        transaction_type,
        quantity_change: dec(quantity_change),
        stock_before: dec(stock_before),
        stock_after: None,
        unit: "lb".to_string(),
        reference: None,
        reason: Some("Manual entry".to_string()),
        notes: None,
        unit_cost: None,
        total_cost: None,
        performed_by: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test that stock_after and total_cost are derived when omitted
    #[tokio::test]
    async fn test_append_computes_stock_after_and_cost() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        let mut input = entry_input(item.id, TransactionType::TaskUsage, "-4", "20");
        input.unit_cost = Some(dec("2.00"));
        let txn = ledger.append(input).await.unwrap();

        assert_eq!(txn.stock_after, dec("16"));
        assert_eq!(txn.total_cost, Some(dec("8.00")));
        assert!(!txn.void);

        let stored = store.get_transaction(txn.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity_change, dec("-4"));
    }

    /// Test that an explicit stock_after must match the arithmetic
    #[tokio::test]
    async fn test_append_rejects_inconsistent_stock_after() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        let mut input = entry_input(item.id, TransactionType::TaskUsage, "-4", "20");
        input.stock_after = Some(dec("10"));
        let err = ledger.append(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "stock_after"));
    }

    /// Test that entries for unknown items are refused
    #[tokio::test]
    async fn test_append_rejects_missing_item() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());

        let input = entry_input(Uuid::new_v4(), TransactionType::Adjustment, "1", "0");
        let err = ledger.append(input).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// Test that the unit token is mandatory
    #[tokio::test]
    async fn test_append_requires_unit() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Beurre doux").await;

        let mut input = entry_input(item.id, TransactionType::Adjustment, "1", "20");
        input.unit = "  ".to_string();
        let err = ledger.append(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "unit"));
    }

    /// Test that transfers carry no stock delta
    #[tokio::test]
    async fn test_transfer_must_not_change_stock() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Saumon atlantique").await;

        let bad = entry_input(item.id, TransactionType::Transfer, "5", "20");
        let err = ledger.append(bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "quantity_change"));

        let good = entry_input(item.id, TransactionType::Transfer, "0", "20");
        let txn = ledger.append(good).await.unwrap();
        assert_eq!(txn.stock_after, dec("20"));
    }

    /// Test that voiding flags the entry and leaves amounts untouched
    #[tokio::test]
    async fn test_void_flags_entry() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        let txn = ledger
            .append(entry_input(item.id, TransactionType::Adjustment, "5", "20"))
            .await
            .unwrap();
        let voided = ledger
            .void(txn.id, "Entered against the wrong item", Some("chantal".to_string()))
            .await
            .unwrap();

        assert!(voided.void);
        assert_eq!(
            voided.void_reason.as_deref(),
            Some("Entered against the wrong item")
        );
        assert!(voided.voided_at.is_some());
        assert_eq!(voided.quantity_change, dec("5"));

        let stored = store.get_transaction(txn.id).await.unwrap().unwrap();
        assert!(stored.void);
    }

    /// Test that voiding twice conflicts
    #[tokio::test]
    async fn test_void_twice_conflicts() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        let txn = ledger
            .append(entry_input(item.id, TransactionType::Adjustment, "5", "20"))
            .await
            .unwrap();
        ledger.void(txn.id, "Duplicate entry", None).await.unwrap();

        let err = ledger.void(txn.id, "Duplicate entry", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    /// Test that voiding requires a reason
    #[tokio::test]
    async fn test_void_requires_reason() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        let txn = ledger
            .append(entry_input(item.id, TransactionType::Adjustment, "5", "20"))
            .await
            .unwrap();
        let err = ledger.void(txn.id, "   ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "reason"));
    }

    /// Test that running balances skip voided entries
    #[tokio::test]
    async fn test_history_balances_survive_void() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        ledger
            .append(entry_input(item.id, TransactionType::Purchase, "10", "20"))
            .await
            .unwrap();
        let middle = ledger
            .append(entry_input(item.id, TransactionType::TaskUsage, "-4", "30"))
            .await
            .unwrap();
        ledger
            .append(entry_input(item.id, TransactionType::Purchase, "2", "26"))
            .await
            .unwrap();
        ledger
            .void(middle.id, "Entered twice", None)
            .await
            .unwrap();

        let history = ledger.history_for(item.id, None).await.unwrap();
        assert_eq!(history.len(), 3);
        // Newest first; the voided middle entry no longer moves the balance
        assert_eq!(history[0].running_balance, dec("12"));
        assert!(history[1].transaction.void);
        assert_eq!(history[1].running_balance, dec("10"));
        assert_eq!(history[2].running_balance, dec("10"));
    }

    /// Test newest-first ordering and the limit
    #[tokio::test]
    async fn test_history_newest_first_with_limit() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Beurre doux").await;

        ledger
            .append(entry_input(item.id, TransactionType::Purchase, "10", "20"))
            .await
            .unwrap();
        ledger
            .append(entry_input(item.id, TransactionType::TaskUsage, "-4", "30"))
            .await
            .unwrap();
        let newest = ledger
            .append(entry_input(item.id, TransactionType::Waste, "-1", "26"))
            .await
            .unwrap();

        let history = ledger.history_for(item.id, Some(2)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].transaction.id, newest.id);
    }

    /// Test history for an unknown item
    #[tokio::test]
    async fn test_history_missing_item() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let err = ledger.history_for(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// Test summary totals, void counting, and the per-type breakdown
    #[tokio::test]
    async fn test_summary_totals_and_breakdown() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Saumon atlantique").await;

        let mut purchase = entry_input(item.id, TransactionType::Purchase, "10", "20");
        purchase.unit_cost = Some(dec("2.00"));
        ledger.append(purchase).await.unwrap();
        ledger
            .append(entry_input(item.id, TransactionType::TaskUsage, "-4", "30"))
            .await
            .unwrap();
        ledger
            .append(entry_input(item.id, TransactionType::Waste, "-1", "26"))
            .await
            .unwrap();
        let cancelled = ledger
            .append(entry_input(item.id, TransactionType::Adjustment, "5", "25"))
            .await
            .unwrap();
        ledger
            .void(cancelled.id, "Entered against the wrong item", None)
            .await
            .unwrap();

        let summary = ledger.summary_for(item.id, None).await.unwrap();
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.voided, 1);
        assert_eq!(summary.total_in, dec("10"));
        assert_eq!(summary.total_out, dec("5"));
        assert_eq!(summary.net_change, dec("5"));
        assert_eq!(summary.total_cost, dec("20.00"));

        assert_eq!(summary.by_type.len(), 3);
        assert_eq!(summary.by_type[0].transaction_type, TransactionType::Purchase);
        assert_eq!(summary.by_type[0].count, 1);
        assert_eq!(summary.by_type[0].quantity_change, dec("10"));
        assert_eq!(summary.by_type[1].transaction_type, TransactionType::TaskUsage);
        assert_eq!(summary.by_type[2].transaction_type, TransactionType::Waste);
    }

    /// Test that a date range excludes entries outside it
    #[tokio::test]
    async fn test_summary_respects_date_range() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Beurre doux").await;

        ledger
            .append(entry_input(item.id, TransactionType::Purchase, "10", "20"))
            .await
            .unwrap();

        let past = DateRange {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        };
        let summary = ledger.summary_for(item.id, Some(past)).await.unwrap();
        assert_eq!(summary.entries, 0);
        assert_eq!(summary.net_change, Decimal::ZERO);
    }

    /// Test the CSV export shape
    #[tokio::test]
    async fn test_csv_export_includes_header_and_rows() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Farine tout usage").await;

        ledger
            .append(entry_input(item.id, TransactionType::Purchase, "10", "20"))
            .await
            .unwrap();
        let voided = ledger
            .append(entry_input(item.id, TransactionType::Adjustment, "2", "30"))
            .await
            .unwrap();
        ledger
            .void(voided.id, "Entered twice", None)
            .await
            .unwrap();

        let csv = ledger.export_csv(item.id).await.unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("date,transaction_type,quantity_change"));
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("purchase"));
        assert!(csv.contains("adjustment"));
        assert!(csv.contains("true"));
    }

    /// Test lookups by causing document
    #[tokio::test]
    async fn test_entries_for_reference_filters() {
        let store = new_store();
        let ledger = LedgerService::new(store.clone());
        let item = seed_item(&store, "Saumon atlantique").await;

        let task_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();

        let mut first = entry_input(item.id, TransactionType::TaskUsage, "-2", "20");
        first.reference = Some(StockReference {
            reference_type: ReferenceType::Task,
            reference_id: task_id,
        });
        ledger.append(first).await.unwrap();

        let mut second = entry_input(item.id, TransactionType::TaskUsage, "-1", "18");
        second.reference = Some(StockReference {
            reference_type: ReferenceType::Task,
            reference_id: task_id,
        });
        ledger.append(second).await.unwrap();

        let mut other = entry_input(item.id, TransactionType::Purchase, "5", "17");
        other.reference = Some(StockReference {
            reference_type: ReferenceType::Invoice,
            reference_id: invoice_id,
        });
        ledger.append(other).await.unwrap();

        let entries = ledger
            .entries_for_reference(ReferenceType::Task, task_id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|txn| txn.reference.unwrap().reference_id == task_id));
    }
}
