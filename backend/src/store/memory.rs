//! In-memory store used by tests and demo deployments
//!
//! Single-process only. Atomicity of [`Store::apply`] comes from holding
//! the table write lock across the whole batch.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    InventoryItem, OrderStatus, PurchaseOrder, PurchaseOrderLine, ReferenceType,
    StockTransaction, TransactionType,
};
use shared::types::DateRange;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{
    ItemStore, LedgerStore, LineStore, OrderStore, Store, StoreCounts, WriteBatch, WriteOp,
};

#[derive(Default)]
struct Tables {
    items: BTreeMap<Uuid, InventoryItem>,
    transactions: BTreeMap<Uuid, StockTransaction>,
    /// Append order of the ledger; BTreeMap iteration order is by id,
    /// not by time
    transaction_log: Vec<Uuid>,
    orders: BTreeMap<Uuid, PurchaseOrder>,
    lines: BTreeMap<Uuid, PurchaseOrderLine>,
    order_sequences: HashMap<i32, i32>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get_item(&self, id: Uuid) -> AppResult<Option<InventoryItem>> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn insert_item(&self, item: &InventoryItem) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.items.contains_key(&item.id) {
            return Err(AppError::DuplicateEntry("item id".to_string()));
        }
        if let Some(sku) = &item.sku {
            let taken = tables
                .items
                .values()
                .any(|existing| existing.sku.as_deref() == Some(sku.as_str()));
            if taken {
                return Err(AppError::DuplicateEntry("SKU".to_string()));
            }
        }
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&self, item: &InventoryItem) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.items.contains_key(&item.id) {
            return Err(AppError::NotFound("Item".to_string()));
        }
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn list_items(&self, include_inactive: bool) -> AppResult<Vec<InventoryItem>> {
        let tables = self.tables.read().await;
        let mut items: Vec<InventoryItem> = tables
            .items
            .values()
            .filter(|item| include_inactive || item.active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_item_by_sku(&self, sku: &str) -> AppResult<Option<InventoryItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|item| item.sku.as_deref() == Some(sku))
            .cloned())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append_transaction(&self, txn: &StockTransaction) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.transactions.contains_key(&txn.id) {
            return Err(AppError::DuplicateEntry("transaction id".to_string()));
        }
        tables.transactions.insert(txn.id, txn.clone());
        tables.transaction_log.push(txn.id);
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<StockTransaction>> {
        let tables = self.tables.read().await;
        Ok(tables.transactions.get(&id).cloned())
    }

    async fn transactions_for_item(&self, item_id: Uuid) -> AppResult<Vec<StockTransaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transaction_log
            .iter()
            .filter_map(|id| tables.transactions.get(id))
            .filter(|txn| txn.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn transactions_by_type(
        &self,
        transaction_type: TransactionType,
        range: Option<DateRange>,
    ) -> AppResult<Vec<StockTransaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transaction_log
            .iter()
            .filter_map(|id| tables.transactions.get(id))
            .filter(|txn| txn.transaction_type == transaction_type)
            .filter(|txn| match &range {
                Some(r) => r.contains(txn.created_at.date_naive()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn transactions_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> AppResult<Vec<StockTransaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transaction_log
            .iter()
            .filter_map(|id| tables.transactions.get(id))
            .filter(|txn| {
                txn.reference.map_or(false, |r| {
                    r.reference_type == reference_type && r.reference_id == reference_id
                })
            })
            .cloned()
            .collect())
    }

    async fn mark_void(
        &self,
        id: Uuid,
        reason: &str,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.transactions.get_mut(&id) {
            Some(txn) => {
                txn.void = true;
                txn.void_reason = Some(reason.to_string());
                txn.voided_at = Some(at);
                if let Some(actor) = actor {
                    txn.performed_by = Some(actor.to_string());
                }
                Ok(())
            }
            None => Err(AppError::NotFound("Transaction".to_string())),
        }
    }

    async fn all_transactions(&self) -> AppResult<Vec<StockTransaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transaction_log
            .iter()
            .filter_map(|id| tables.transactions.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_order(&self, id: Uuid) -> AppResult<Option<PurchaseOrder>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn insert_order(&self, order: &PurchaseOrder) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(AppError::DuplicateEntry("order id".to_string()));
        }
        let number_taken = tables
            .orders
            .values()
            .any(|existing| existing.order_number == order.order_number);
        if number_taken {
            return Err(AppError::DuplicateEntry("order number".to_string()));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &PurchaseOrder) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&order.id) {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> AppResult<Vec<PurchaseOrder>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<PurchaseOrder> = tables
            .orders
            .values()
            .filter(|order| status.map_or(true, |s| order.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn next_order_sequence(&self, year: i32) -> AppResult<i32> {
        let mut tables = self.tables.write().await;
        let next = tables
            .order_sequences
            .entry(year)
            .and_modify(|last| *last += 1)
            .or_insert(1);
        Ok(*next)
    }
}

#[async_trait]
impl LineStore for MemoryStore {
    async fn get_line(&self, id: Uuid) -> AppResult<Option<PurchaseOrderLine>> {
        let tables = self.tables.read().await;
        Ok(tables.lines.get(&id).cloned())
    }

    async fn insert_line(&self, line: &PurchaseOrderLine) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&line.order_id) {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }
        tables.lines.insert(line.id, line.clone());
        Ok(())
    }

    async fn lines_for_order(&self, order_id: Uuid) -> AppResult<Vec<PurchaseOrderLine>> {
        let tables = self.tables.read().await;
        let mut lines: Vec<PurchaseOrderLine> = tables
            .lines
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect();
        lines.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(lines)
    }

    async fn update_line(&self, line: &PurchaseOrderLine) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.lines.contains_key(&line.id) {
            return Err(AppError::NotFound("Order line".to_string()));
        }
        tables.lines.insert(line.id, line.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn apply(&self, batch: WriteBatch) -> AppResult<()> {
        // One write lock for the whole batch makes it atomic
        let mut tables = self.tables.write().await;
        for op in batch.into_ops() {
            match op {
                WriteOp::UpsertItem(item) => {
                    tables.items.insert(item.id, item);
                }
                WriteOp::AppendTransaction(txn) => {
                    if !tables.transactions.contains_key(&txn.id) {
                        tables.transaction_log.push(txn.id);
                    }
                    tables.transactions.insert(txn.id, txn);
                }
                WriteOp::UpsertOrder(order) => {
                    tables.orders.insert(order.id, order);
                }
                WriteOp::UpsertLine(line) => {
                    tables.lines.insert(line.id, line);
                }
            }
        }
        Ok(())
    }

    async fn counts(&self) -> AppResult<StoreCounts> {
        let tables = self.tables.read().await;
        Ok(StoreCounts {
            items: tables.items.len() as i64,
            transactions: tables.transactions.len() as i64,
            orders: tables.orders.len() as i64,
            lines: tables.lines.len() as i64,
        })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
