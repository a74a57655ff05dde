//! PostgreSQL store backed by sqlx
//!
//! Row structs mirror the migration schema and convert into the shared
//! models at the boundary. Enum columns are stored as text and parsed
//! back through the shared `FromStr` impls.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use shared::models::{
    InventoryItem, OrderStatus, PurchaseOrder, PurchaseOrderLine, ReferenceType, StockReference,
    StockTransaction, TransactionType,
};
use shared::types::DateRange;

use crate::error::{AppError, AppResult};

use super::{
    ItemStore, LedgerStore, LineStore, OrderStore, Store, StoreCounts, WriteBatch, WriteOp,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    sku: Option<String>,
    category: Option<String>,
    stock_quantity: Decimal,
    stock_quantity_unit: Option<String>,
    stock_weight: Decimal,
    stock_weight_unit: Option<String>,
    par_quantity: Option<Decimal>,
    par_weight: Option<Decimal>,
    reorder_point: Option<Decimal>,
    reorder_quantity: Option<Decimal>,
    price_per_g: Option<Decimal>,
    price_per_ml: Option<Decimal>,
    price_per_unit: Option<Decimal>,
    pricing_type: Option<String>,
    weight_per_unit: Option<Decimal>,
    units_per_case: Option<Decimal>,
    unit_size: Option<Decimal>,
    unit_size_unit: Option<String>,
    volume_per_pc: Option<Decimal>,
    purchase_qty: Option<Decimal>,
    purchase_unit: Option<String>,
    last_unit_cost: Option<Decimal>,
    last_purchase_at: Option<DateTime<Utc>>,
    preferred_vendor: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.id,
            name: row.name,
            sku: row.sku,
            category: row.category,
            stock_quantity: row.stock_quantity,
            stock_quantity_unit: row.stock_quantity_unit,
            stock_weight: row.stock_weight,
            stock_weight_unit: row.stock_weight_unit,
            par_quantity: row.par_quantity,
            par_weight: row.par_weight,
            reorder_point: row.reorder_point,
            reorder_quantity: row.reorder_quantity,
            price_per_g: row.price_per_g,
            price_per_ml: row.price_per_ml,
            price_per_unit: row.price_per_unit,
            pricing_type: row.pricing_type,
            weight_per_unit: row.weight_per_unit,
            units_per_case: row.units_per_case,
            unit_size: row.unit_size,
            unit_size_unit: row.unit_size_unit,
            volume_per_pc: row.volume_per_pc,
            purchase_qty: row.purchase_qty,
            purchase_unit: row.purchase_unit,
            last_unit_cost: row.last_unit_cost,
            last_purchase_at: row.last_purchase_at,
            preferred_vendor: row.preferred_vendor,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: Uuid,
    item_id: Uuid,
    transaction_type: String,
    quantity_change: Decimal,
    stock_before: Decimal,
    stock_after: Decimal,
    unit: String,
    reference_type: Option<String>,
    reference_id: Option<Uuid>,
    reason: Option<String>,
    notes: Option<String>,
    unit_cost: Option<Decimal>,
    total_cost: Option<Decimal>,
    performed_by: Option<String>,
    created_at: DateTime<Utc>,
    void: bool,
    void_reason: Option<String>,
    voided_at: Option<DateTime<Utc>>,
}

impl TryFrom<TransactionRow> for StockTransaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let transaction_type: TransactionType = row
            .transaction_type
            .parse()
            .map_err(AppError::Internal)?;
        let reference = match (row.reference_type, row.reference_id) {
            (Some(rt), Some(rid)) => {
                let reference_type: ReferenceType = rt.parse().map_err(AppError::Internal)?;
                Some(StockReference {
                    reference_type,
                    reference_id: rid,
                })
            }
            _ => None,
        };
        Ok(StockTransaction {
            id: row.id,
            item_id: row.item_id,
            transaction_type,
            quantity_change: row.quantity_change,
            stock_before: row.stock_before,
            stock_after: row.stock_after,
            unit: row.unit,
            reference,
            reason: row.reason,
            notes: row.notes,
            unit_cost: row.unit_cost,
            total_cost: row.total_cost,
            performed_by: row.performed_by,
            created_at: row.created_at,
            void: row.void,
            void_reason: row.void_reason,
            voided_at: row.voided_at,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    vendor: Option<String>,
    status: String,
    subtotal: Decimal,
    gst: Decimal,
    qst: Decimal,
    total: Decimal,
    expected_at: Option<NaiveDate>,
    received_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for PurchaseOrder {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(AppError::Internal)?;
        Ok(PurchaseOrder {
            id: row.id,
            order_number: row.order_number,
            vendor: row.vendor,
            status,
            subtotal: row.subtotal,
            gst: row.gst,
            qst: row.qst,
            total: row.total,
            expected_at: row.expected_at,
            received_at: row.received_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LineRow {
    id: Uuid,
    order_id: Uuid,
    item_id: Option<Uuid>,
    description: String,
    sku: Option<String>,
    quantity: Decimal,
    unit: Option<String>,
    unit_price: Decimal,
    quantity_received: Decimal,
    created_at: DateTime<Utc>,
}

impl From<LineRow> for PurchaseOrderLine {
    fn from(row: LineRow) -> Self {
        PurchaseOrderLine {
            id: row.id,
            order_id: row.order_id,
            item_id: row.item_id,
            description: row.description,
            sku: row.sku,
            quantity: row.quantity,
            unit: row.unit,
            unit_price: row.unit_price,
            quantity_received: row.quantity_received,
            created_at: row.created_at,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

// ============================================================================
// Write Helpers
// ============================================================================
// Shared between the trait methods and the transactional batch path.

async fn upsert_item<'e>(
    exec: impl sqlx::PgExecutor<'e>,
    item: &InventoryItem,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO inventory_items (
            id, name, sku, category,
            stock_quantity, stock_quantity_unit, stock_weight, stock_weight_unit,
            par_quantity, par_weight, reorder_point, reorder_quantity,
            price_per_g, price_per_ml, price_per_unit, pricing_type,
            weight_per_unit, units_per_case, unit_size, unit_size_unit,
            volume_per_pc, purchase_qty, purchase_unit,
            last_unit_cost, last_purchase_at, preferred_vendor,
            active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                $27, $28, $29)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            sku = EXCLUDED.sku,
            category = EXCLUDED.category,
            stock_quantity = EXCLUDED.stock_quantity,
            stock_quantity_unit = EXCLUDED.stock_quantity_unit,
            stock_weight = EXCLUDED.stock_weight,
            stock_weight_unit = EXCLUDED.stock_weight_unit,
            par_quantity = EXCLUDED.par_quantity,
            par_weight = EXCLUDED.par_weight,
            reorder_point = EXCLUDED.reorder_point,
            reorder_quantity = EXCLUDED.reorder_quantity,
            price_per_g = EXCLUDED.price_per_g,
            price_per_ml = EXCLUDED.price_per_ml,
            price_per_unit = EXCLUDED.price_per_unit,
            pricing_type = EXCLUDED.pricing_type,
            weight_per_unit = EXCLUDED.weight_per_unit,
            units_per_case = EXCLUDED.units_per_case,
            unit_size = EXCLUDED.unit_size,
            unit_size_unit = EXCLUDED.unit_size_unit,
            volume_per_pc = EXCLUDED.volume_per_pc,
            purchase_qty = EXCLUDED.purchase_qty,
            purchase_unit = EXCLUDED.purchase_unit,
            last_unit_cost = EXCLUDED.last_unit_cost,
            last_purchase_at = EXCLUDED.last_purchase_at,
            preferred_vendor = EXCLUDED.preferred_vendor,
            active = EXCLUDED.active,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(item.id)
    .bind(&item.name)
    .bind(&item.sku)
    .bind(&item.category)
    .bind(item.stock_quantity)
    .bind(&item.stock_quantity_unit)
    .bind(item.stock_weight)
    .bind(&item.stock_weight_unit)
    .bind(item.par_quantity)
    .bind(item.par_weight)
    .bind(item.reorder_point)
    .bind(item.reorder_quantity)
    .bind(item.price_per_g)
    .bind(item.price_per_ml)
    .bind(item.price_per_unit)
    .bind(&item.pricing_type)
    .bind(item.weight_per_unit)
    .bind(item.units_per_case)
    .bind(item.unit_size)
    .bind(&item.unit_size_unit)
    .bind(item.volume_per_pc)
    .bind(item.purchase_qty)
    .bind(&item.purchase_unit)
    .bind(item.last_unit_cost)
    .bind(item.last_purchase_at)
    .bind(&item.preferred_vendor)
    .bind(item.active)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

async fn insert_transaction<'e>(
    exec: impl sqlx::PgExecutor<'e>,
    txn: &StockTransaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_transactions (
            id, item_id, transaction_type, quantity_change,
            stock_before, stock_after, unit,
            reference_type, reference_id, reason, notes,
            unit_cost, total_cost, performed_by, created_at,
            void, void_reason, voided_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18)
        "#,
    )
    .bind(txn.id)
    .bind(txn.item_id)
    .bind(txn.transaction_type.as_str())
    .bind(txn.quantity_change)
    .bind(txn.stock_before)
    .bind(txn.stock_after)
    .bind(&txn.unit)
    .bind(txn.reference.map(|r| r.reference_type.as_str()))
    .bind(txn.reference.map(|r| r.reference_id))
    .bind(&txn.reason)
    .bind(&txn.notes)
    .bind(txn.unit_cost)
    .bind(txn.total_cost)
    .bind(&txn.performed_by)
    .bind(txn.created_at)
    .bind(txn.void)
    .bind(&txn.void_reason)
    .bind(txn.voided_at)
    .execute(exec)
    .await?;
    Ok(())
}

async fn upsert_order<'e>(
    exec: impl sqlx::PgExecutor<'e>,
    order: &PurchaseOrder,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO purchase_orders (
            id, order_number, vendor, status,
            subtotal, gst, qst, total,
            expected_at, received_at, notes, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE SET
            vendor = EXCLUDED.vendor,
            status = EXCLUDED.status,
            subtotal = EXCLUDED.subtotal,
            gst = EXCLUDED.gst,
            qst = EXCLUDED.qst,
            total = EXCLUDED.total,
            expected_at = EXCLUDED.expected_at,
            received_at = EXCLUDED.received_at,
            notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(&order.vendor)
    .bind(order.status.as_str())
    .bind(order.subtotal)
    .bind(order.gst)
    .bind(order.qst)
    .bind(order.total)
    .bind(order.expected_at)
    .bind(order.received_at)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

async fn upsert_line<'e>(
    exec: impl sqlx::PgExecutor<'e>,
    line: &PurchaseOrderLine,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO purchase_order_lines (
            id, order_id, item_id, description, sku,
            quantity, unit, unit_price, quantity_received, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            item_id = EXCLUDED.item_id,
            description = EXCLUDED.description,
            sku = EXCLUDED.sku,
            quantity = EXCLUDED.quantity,
            unit = EXCLUDED.unit,
            unit_price = EXCLUDED.unit_price,
            quantity_received = EXCLUDED.quantity_received
        "#,
    )
    .bind(line.id)
    .bind(line.order_id)
    .bind(line.item_id)
    .bind(&line.description)
    .bind(&line.sku)
    .bind(line.quantity)
    .bind(&line.unit)
    .bind(line.unit_price)
    .bind(line.quantity_received)
    .bind(line.created_at)
    .execute(exec)
    .await?;
    Ok(())
}

// ============================================================================
// Trait Implementations
// ============================================================================

#[async_trait]
impl ItemStore for PgStore {
    async fn get_item(&self, id: Uuid) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(InventoryItem::from))
    }

    async fn insert_item(&self, item: &InventoryItem) -> AppResult<()> {
        // The write helper upserts on id, so a duplicate id must be
        // caught here rather than by the primary key
        if self.get_item(item.id).await?.is_some() {
            return Err(AppError::DuplicateEntry("item id".to_string()));
        }
        upsert_item(&self.db, item).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("SKU".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })
    }

    async fn update_item(&self, item: &InventoryItem) -> AppResult<()> {
        let existing = self.get_item(item.id).await?;
        if existing.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }
        upsert_item(&self.db, item).await?;
        Ok(())
    }

    async fn list_items(&self, include_inactive: bool) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM inventory_items WHERE active = TRUE OR $1 ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    async fn find_item_by_sku(&self, sku: &str) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM inventory_items WHERE sku = $1")
            .bind(sku)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(InventoryItem::from))
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn append_transaction(&self, txn: &StockTransaction) -> AppResult<()> {
        insert_transaction(&self.db, txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("transaction id".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })
    }

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<StockTransaction>> {
        let row =
            sqlx::query_as::<_, TransactionRow>("SELECT * FROM stock_transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        row.map(StockTransaction::try_from).transpose()
    }

    async fn transactions_for_item(&self, item_id: Uuid) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM stock_transactions WHERE item_id = $1 ORDER BY created_at, id",
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(StockTransaction::try_from).collect()
    }

    async fn transactions_by_type(
        &self,
        transaction_type: TransactionType,
        range: Option<DateRange>,
    ) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM stock_transactions
            WHERE transaction_type = $1
              AND ($2::date IS NULL OR created_at::date >= $2)
              AND ($3::date IS NULL OR created_at::date <= $3)
            ORDER BY created_at, id
            "#,
        )
        .bind(transaction_type.as_str())
        .bind(range.as_ref().map(|r| r.start))
        .bind(range.as_ref().map(|r| r.end))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(StockTransaction::try_from).collect()
    }

    async fn transactions_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM stock_transactions
            WHERE reference_type = $1 AND reference_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(reference_type.as_str())
        .bind(reference_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(StockTransaction::try_from).collect()
    }

    async fn mark_void(
        &self,
        id: Uuid,
        reason: &str,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE stock_transactions
            SET void = TRUE,
                void_reason = $2,
                voided_at = $3,
                performed_by = COALESCE($4, performed_by)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(at)
        .bind(actor)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transaction".to_string()));
        }
        Ok(())
    }

    async fn all_transactions(&self) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM stock_transactions ORDER BY created_at, id",
        )
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(StockTransaction::try_from).collect()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn get_order(&self, id: Uuid) -> AppResult<Option<PurchaseOrder>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM purchase_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(PurchaseOrder::try_from).transpose()
    }

    async fn insert_order(&self, order: &PurchaseOrder) -> AppResult<()> {
        if self.get_order(order.id).await?.is_some() {
            return Err(AppError::DuplicateEntry("order id".to_string()));
        }
        upsert_order(&self.db, order).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("order number".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })
    }

    async fn update_order(&self, order: &PurchaseOrder) -> AppResult<()> {
        let existing = self.get_order(order.id).await?;
        if existing.is_none() {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }
        upsert_order(&self.db, order).await?;
        Ok(())
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT * FROM purchase_orders
            WHERE $1::text IS NULL OR status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(PurchaseOrder::try_from).collect()
    }

    async fn next_order_sequence(&self, year: i32) -> AppResult<i32> {
        let next = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO order_sequences (year, last_value)
            VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE SET last_value = order_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(&self.db)
        .await?;
        Ok(next)
    }
}

#[async_trait]
impl LineStore for PgStore {
    async fn get_line(&self, id: Uuid) -> AppResult<Option<PurchaseOrderLine>> {
        let row = sqlx::query_as::<_, LineRow>("SELECT * FROM purchase_order_lines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(PurchaseOrderLine::from))
    }

    async fn insert_line(&self, line: &PurchaseOrderLine) -> AppResult<()> {
        upsert_line(&self.db, line).await?;
        Ok(())
    }

    async fn lines_for_order(&self, order_id: Uuid) -> AppResult<Vec<PurchaseOrderLine>> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT * FROM purchase_order_lines WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(PurchaseOrderLine::from).collect())
    }

    async fn update_line(&self, line: &PurchaseOrderLine) -> AppResult<()> {
        let existing = self.get_line(line.id).await?;
        if existing.is_none() {
            return Err(AppError::NotFound("Order line".to_string()));
        }
        upsert_line(&self.db, line).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn apply(&self, batch: WriteBatch) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        for op in batch.into_ops() {
            match op {
                WriteOp::UpsertItem(item) => upsert_item(&mut *tx, &item).await?,
                WriteOp::AppendTransaction(txn) => insert_transaction(&mut *tx, &txn).await?,
                WriteOp::UpsertOrder(order) => upsert_order(&mut *tx, &order).await?,
                WriteOp::UpsertLine(line) => upsert_line(&mut *tx, &line).await?,
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn counts(&self) -> AppResult<StoreCounts> {
        let items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.db)
            .await?;
        let transactions = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_transactions")
            .fetch_one(&self.db)
            .await?;
        let orders = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_orders")
            .fetch_one(&self.db)
            .await?;
        let lines = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_order_lines")
            .fetch_one(&self.db)
            .await?;
        Ok(StoreCounts {
            items,
            transactions,
            orders,
            lines,
        })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
