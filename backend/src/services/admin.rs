//! Admin and integrity tooling
//!
//! Diagnostics over the store, structural checks on the ledger, and the
//! repair path that rebuilds an item's cached stock from its ledger head.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::models::{InventoryItem, StockTransaction, TransactionType};
use shared::strategy::{self, StockField, StrategyKind};

use crate::error::{AppError, AppResult};
use crate::services::engine::EngineService;
use crate::store::{Store, StoreCounts, WriteBatch};

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    engine: EngineService,
}

#[derive(Debug, Serialize)]
pub struct StoreDiagnostics {
    pub counts: StoreCounts,
    pub active_items: usize,
    pub inactive_items: usize,
    pub items_by_strategy: StrategyCounts,
    pub voided_transactions: usize,
    pub open_orders: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct StrategyCounts {
    pub weight: usize,
    pub volume: usize,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    pub checked_items: usize,
    pub checked_transactions: usize,
    pub violations: Vec<IntegrityViolation>,
}

#[derive(Debug, Serialize)]
pub struct IntegrityViolation {
    pub kind: ViolationKind,
    pub item_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// stock_after differs from stock_before + quantity_change
    BrokenDelta,
    /// A transfer entry carrying a nonzero delta
    TransferWithDelta,
    /// Cached stock differs from the latest non-void entry
    HeadMismatch,
    /// Ledger entry pointing at a missing item
    OrphanedEntry,
}

#[derive(Debug, Serialize)]
pub struct RebuildOutcome {
    pub item_id: Uuid,
    pub previous: Decimal,
    pub rebuilt: Decimal,
    pub unit: String,
    pub corrected: bool,
    pub transaction_id: Option<Uuid>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, engine: EngineService) -> Self {
        Self { store, engine }
    }

    pub async fn store_diagnostics(&self) -> AppResult<StoreDiagnostics> {
        let counts = self.store.counts().await?;
        let items = self.store.list_items(true).await?;
        let transactions = self.store.all_transactions().await?;
        let orders = self.store.list_orders(None).await?;

        let active_items = items.iter().filter(|item| item.active).count();
        let inactive_items = items.len() - active_items;

        let mut items_by_strategy = StrategyCounts::default();
        for item in &items {
            match strategy::resolve(item).kind {
                StrategyKind::Weight => items_by_strategy.weight += 1,
                StrategyKind::Volume => items_by_strategy.volume += 1,
                StrategyKind::Count => items_by_strategy.count += 1,
            }
        }

        Ok(StoreDiagnostics {
            counts,
            active_items,
            inactive_items,
            items_by_strategy,
            voided_transactions: transactions.iter().filter(|txn| txn.void).count(),
            open_orders: orders
                .iter()
                .filter(|order| !order.status.is_terminal())
                .count(),
        })
    }

    /// Structural checks across the whole ledger
    pub async fn integrity_report(&self) -> AppResult<IntegrityReport> {
        let items = self.store.list_items(true).await?;
        let transactions = self.store.all_transactions().await?;
        let item_map: HashMap<Uuid, &InventoryItem> =
            items.iter().map(|item| (item.id, item)).collect();

        let mut violations = Vec::new();

        for txn in &transactions {
            if !item_map.contains_key(&txn.item_id) {
                violations.push(IntegrityViolation {
                    kind: ViolationKind::OrphanedEntry,
                    item_id: Some(txn.item_id),
                    transaction_id: Some(txn.id),
                    detail: format!("entry {} references missing item {}", txn.id, txn.item_id),
                });
            }
            if txn.transaction_type == TransactionType::Transfer
                && txn.quantity_change != Decimal::ZERO
            {
                violations.push(IntegrityViolation {
                    kind: ViolationKind::TransferWithDelta,
                    item_id: Some(txn.item_id),
                    transaction_id: Some(txn.id),
                    detail: format!(
                        "transfer {} carries delta {}",
                        txn.id, txn.quantity_change
                    ),
                });
            }
            if txn.stock_after != txn.stock_before + txn.quantity_change {
                violations.push(IntegrityViolation {
                    kind: ViolationKind::BrokenDelta,
                    item_id: Some(txn.item_id),
                    transaction_id: Some(txn.id),
                    detail: format!(
                        "entry {}: {} + {} != {}",
                        txn.id, txn.stock_before, txn.quantity_change, txn.stock_after
                    ),
                });
            }
        }

        // Cached stock must match the latest surviving entry per item
        let mut latest: HashMap<Uuid, &StockTransaction> = HashMap::new();
        for txn in &transactions {
            if !txn.void {
                latest.insert(txn.item_id, txn);
            }
        }
        for item in &items {
            if let Some(head) = latest.get(&item.id) {
                let resolved = strategy::resolve(item);
                let cached = resolved.effective_stock(item);
                if cached != head.stock_after {
                    violations.push(IntegrityViolation {
                        kind: ViolationKind::HeadMismatch,
                        item_id: Some(item.id),
                        transaction_id: Some(head.id),
                        detail: format!(
                            "{}: cached {} differs from ledger head {}",
                            item.name, cached, head.stock_after
                        ),
                    });
                }
            }
        }

        Ok(IntegrityReport {
            checked_items: items.len(),
            checked_transactions: transactions.len(),
            violations,
        })
    }

    /// Reset an item's cached stock to its ledger head, recording the
    /// correction as a new ledger entry. No-op when already consistent
    /// or when the item has no ledger history.
    pub async fn rebuild_stock(
        &self,
        item_id: Uuid,
        performed_by: Option<String>,
    ) -> AppResult<RebuildOutcome> {
        let _guard = self.engine.locks().acquire(item_id).await;
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        let resolved = strategy::resolve(&item);
        let current = resolved.effective_stock(&item);

        let transactions = self.store.transactions_for_item(item_id).await?;
        let head = transactions.iter().rev().find(|txn| !txn.void);
        let target = match head {
            Some(head) => head.stock_after,
            None => {
                return Ok(RebuildOutcome {
                    item_id,
                    previous: current,
                    rebuilt: current,
                    unit: resolved.stock_unit,
                    corrected: false,
                    transaction_id: None,
                })
            }
        };

        if target == current {
            return Ok(RebuildOutcome {
                item_id,
                previous: current,
                rebuilt: current,
                unit: resolved.stock_unit,
                corrected: false,
                transaction_id: None,
            });
        }

        let mut updated = item.clone();
        match resolved.stock_field {
            StockField::Weight => updated.stock_weight = target,
            StockField::Quantity => updated.stock_quantity = target,
        }
        updated.updated_at = Utc::now();

        let transaction = StockTransaction {
            id: Uuid::new_v4(),
            item_id,
            transaction_type: TransactionType::CountCorrection,
            quantity_change: target - current,
            stock_before: current,
            stock_after: target,
            unit: resolved.stock_unit.clone(),
            reference: None,
            reason: Some("Rebuilt from ledger".to_string()),
            notes: None,
            unit_cost: None,
            total_cost: None,
            performed_by,
            created_at: Utc::now(),
            void: false,
            void_reason: None,
            voided_at: None,
        };
        let transaction_id = transaction.id;

        let mut batch = WriteBatch::new();
        batch.upsert_item(updated);
        batch.append_transaction(transaction);
        self.store.apply(batch).await?;

        tracing::warn!(
            item_id = %item_id,
            previous = %current,
            rebuilt = %target,
            "cached stock rebuilt from ledger"
        );

        Ok(RebuildOutcome {
            item_id,
            previous: current,
            rebuilt: target,
            unit: resolved.stock_unit,
            corrected: true,
            transaction_id: Some(transaction_id),
        })
    }
}
