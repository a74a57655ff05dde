//! Reorder Report Tests
//!
//! Tests for the procurement view including:
//! - Inclusion rules: below-par thresholds and explicit reorder points
//! - Severity ordering with alphabetical tie-breaks
//! - Suggested quantities from explicit settings or the gap to par
//! - Inactive items staying out of the report

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use kc_backend::services::reorder::ReorderService;
use kc_backend::store::{ItemStore, MemoryStore, Store};
use shared::models::InventoryItem;
use shared::types::ThresholdStatus;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn new_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

/// A weight-tracked item with a par target
fn stocked_item(name: &str, stock: &str, par: &str) -> InventoryItem {
    let mut item = InventoryItem::new(name);
    item.pricing_type = Some("weight".to_string());
    item.stock_weight = dec(stock);
    item.stock_weight_unit = Some("lb".to_string());
    item.par_weight = Some(dec(par));
    item
}

/// A count-tracked item without a par target
fn counted_item(name: &str, stock: &str) -> InventoryItem {
    let mut item = InventoryItem::new(name);
    item.price_per_unit = Some(dec("0.15"));
    item.stock_quantity = dec(stock);
    item
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test severity ordering, tie-breaks, and exclusion of healthy or
    /// inactive items
    #[tokio::test]
    async fn test_report_orders_most_urgent_first() {
        let store = new_store();
        let service = ReorderService::new(store.clone());

        store.insert_item(&stocked_item("Basilic", "8", "100")).await.unwrap();
        store.insert_item(&stocked_item("Ail", "5", "100")).await.unwrap();
        store
            .insert_item(&stocked_item("Beurre doux", "20", "100"))
            .await
            .unwrap();
        store
            .insert_item(&stocked_item("Farine tout usage", "30", "100"))
            .await
            .unwrap();
        store
            .insert_item(&stocked_item("Sel de mer", "80", "100"))
            .await
            .unwrap();
        let mut retired = stocked_item("Pailles", "1", "100");
        retired.active = false;
        store.insert_item(&retired).await.unwrap();

        let report = service.reorder_report().await.unwrap();
        assert_eq!(report.items_checked, 5);
        assert_eq!(report.lines.len(), 4);

        let names: Vec<&str> = report.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Ail", "Basilic", "Beurre doux", "Farine tout usage"]);
        assert_eq!(report.lines[0].threshold, ThresholdStatus::Critical);
        assert_eq!(report.lines[1].threshold, ThresholdStatus::Critical);
        assert_eq!(report.lines[2].threshold, ThresholdStatus::Low);
        assert_eq!(report.lines[3].threshold, ThresholdStatus::Warning);
    }

    /// Test that an explicit reorder point pulls in items with no par
    #[tokio::test]
    async fn test_reorder_point_flags_items_without_par() {
        let store = new_store();
        let service = ReorderService::new(store.clone());

        let mut low = counted_item("Gants nitrile", "8");
        low.reorder_point = Some(dec("10"));
        let mut healthy = counted_item("Boîtes à emporter", "50");
        healthy.reorder_point = Some(dec("10"));
        store.insert_item(&low).await.unwrap();
        store.insert_item(&healthy).await.unwrap();

        let report = service.reorder_report().await.unwrap();
        assert_eq!(report.lines.len(), 1);
        let line = &report.lines[0];
        assert_eq!(line.name, "Gants nitrile");
        assert_eq!(line.threshold, ThresholdStatus::Ok);
        assert!(line.below_reorder_point);
        assert_eq!(line.unit, "ea");
    }

    /// Test suggested quantities: explicit setting wins over the par gap
    #[tokio::test]
    async fn test_suggested_quantity_sources() {
        let store = new_store();
        let service = ReorderService::new(store.clone());

        let mut explicit = stocked_item("Beurre doux", "20", "100");
        explicit.reorder_quantity = Some(dec("40"));
        let derived = stocked_item("Farine tout usage", "20", "100");
        store.insert_item(&explicit).await.unwrap();
        store.insert_item(&derived).await.unwrap();

        let report = service.reorder_report().await.unwrap();
        let by_name = |name: &str| {
            report
                .lines
                .iter()
                .find(|l| l.name == name)
                .unwrap()
                .suggested_quantity
        };
        assert_eq!(by_name("Beurre doux"), Some(dec("40")));
        assert_eq!(by_name("Farine tout usage"), Some(dec("80")));
    }

    /// Test that the par gap clamps at zero for overstocked items below
    /// their reorder point
    #[tokio::test]
    async fn test_par_gap_never_negative() {
        let store = new_store();
        let service = ReorderService::new(store.clone());

        let mut item = stocked_item("Huile de canola", "120", "100");
        item.reorder_point = Some(dec("150"));
        store.insert_item(&item).await.unwrap();

        let report = service.reorder_report().await.unwrap();
        assert_eq!(report.lines.len(), 1);
        assert!(report.lines[0].below_reorder_point);
        assert_eq!(report.lines[0].suggested_quantity, Some(Decimal::ZERO));
    }
}
