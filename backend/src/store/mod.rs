//! Storage boundary for the stock core
//!
//! All persistence goes through four narrow traits plus an atomic batch
//! commit. `MemoryStore` backs tests and demos, `PgStore` backs the real
//! deployment, and the services only ever see `Arc<dyn Store>`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{
    InventoryItem, OrderStatus, PurchaseOrder, PurchaseOrderLine, ReferenceType,
    StockTransaction, TransactionType,
};
use shared::types::DateRange;
use uuid::Uuid;

use crate::error::AppResult;

/// Inventory item persistence
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, id: Uuid) -> AppResult<Option<InventoryItem>>;

    /// Fails with `DuplicateEntry` when the id or SKU is already taken
    async fn insert_item(&self, item: &InventoryItem) -> AppResult<()>;

    /// Fails with `NotFound` when the item does not exist
    async fn update_item(&self, item: &InventoryItem) -> AppResult<()>;

    async fn list_items(&self, include_inactive: bool) -> AppResult<Vec<InventoryItem>>;

    async fn find_item_by_sku(&self, sku: &str) -> AppResult<Option<InventoryItem>>;
}

/// Append-only stock transaction log
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append_transaction(&self, txn: &StockTransaction) -> AppResult<()>;

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<StockTransaction>>;

    /// All entries for an item, oldest first
    async fn transactions_for_item(&self, item_id: Uuid) -> AppResult<Vec<StockTransaction>>;

    /// Entries of one type, oldest first, optionally bounded by date
    async fn transactions_by_type(
        &self,
        transaction_type: TransactionType,
        range: Option<DateRange>,
    ) -> AppResult<Vec<StockTransaction>>;

    async fn transactions_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> AppResult<Vec<StockTransaction>>;

    /// Flags an entry as voided; never rewrites amounts
    async fn mark_void(
        &self,
        id: Uuid,
        reason: &str,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Full log scan, oldest first. Admin and integrity tooling only.
    async fn all_transactions(&self) -> AppResult<Vec<StockTransaction>>;
}

/// Purchase order persistence
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: Uuid) -> AppResult<Option<PurchaseOrder>>;

    async fn insert_order(&self, order: &PurchaseOrder) -> AppResult<()>;

    async fn update_order(&self, order: &PurchaseOrder) -> AppResult<()>;

    async fn list_orders(&self, status: Option<OrderStatus>) -> AppResult<Vec<PurchaseOrder>>;

    /// Next value of the per-year order number sequence, starting at 1
    async fn next_order_sequence(&self, year: i32) -> AppResult<i32>;
}

/// Purchase order line persistence
#[async_trait]
pub trait LineStore: Send + Sync {
    async fn get_line(&self, id: Uuid) -> AppResult<Option<PurchaseOrderLine>>;

    async fn insert_line(&self, line: &PurchaseOrderLine) -> AppResult<()>;

    /// Lines for an order in creation order
    async fn lines_for_order(&self, order_id: Uuid) -> AppResult<Vec<PurchaseOrderLine>>;

    async fn update_line(&self, line: &PurchaseOrderLine) -> AppResult<()>;
}

/// Combined storage interface with atomic multi-table writes
#[async_trait]
pub trait Store: ItemStore + LedgerStore + OrderStore + LineStore {
    /// Commits every operation in the batch, or none of them
    async fn apply(&self, batch: WriteBatch) -> AppResult<()>;

    /// Row counts across all tables
    async fn counts(&self) -> AppResult<StoreCounts>;

    /// Connectivity check for health reporting
    async fn ping(&self) -> AppResult<()>;
}

/// A single operation inside a [`WriteBatch`]
#[derive(Debug, Clone)]
pub enum WriteOp {
    UpsertItem(InventoryItem),
    AppendTransaction(StockTransaction),
    UpsertOrder(PurchaseOrder),
    UpsertLine(PurchaseOrderLine),
}

/// Ordered set of writes committed atomically by [`Store::apply`]
///
/// Callers validate before staging; the batch itself performs no checks
/// beyond what the backing store enforces.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_item(&mut self, item: InventoryItem) -> &mut Self {
        self.ops.push(WriteOp::UpsertItem(item));
        self
    }

    pub fn append_transaction(&mut self, txn: StockTransaction) -> &mut Self {
        self.ops.push(WriteOp::AppendTransaction(txn));
        self
    }

    pub fn upsert_order(&mut self, order: PurchaseOrder) -> &mut Self {
        self.ops.push(WriteOp::UpsertOrder(order));
        self
    }

    pub fn upsert_line(&mut self, line: PurchaseOrderLine) -> &mut Self {
        self.ops.push(WriteOp::UpsertLine(line));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Row counts reported by [`Store::counts`]
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreCounts {
    pub items: i64,
    pub transactions: i64,
    pub orders: i64,
    pub lines: i64,
}
