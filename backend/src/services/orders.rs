//! Purchase order service
//!
//! Order lifecycle, line management, Québec tax totals, and receiving.
//! Receiving is the bridge into the stock engine: every received line
//! stages an item update plus its ledger entry, and the default mode
//! commits all lines, the order, and the stock in one batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::{
    generate_order_number, InventoryItem, OrderStatus, OrderTotals, PurchaseOrder,
    PurchaseOrderLine, ReferenceType, StockReference,
};
use shared::types::ThresholdBreakpoints;
use shared::units::{self, BaseUnit};
use shared::validation::{
    validate_name, validate_positive_quantity, validate_unit_price, validate_vendor,
};

use crate::error::{AppError, AppResult};
use crate::services::engine::{
    stage_receipt, EngineService, MutationOutcome, ReceiptInput, StagedMutation,
};
use crate::store::{Store, WriteBatch};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    engine: EngineService,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub vendor: Option<String>,
    pub expected_at: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub lines: Vec<NewLineInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLineInput {
    pub item_id: Option<Uuid>,
    pub description: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
}

/// An order together with its lines
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub lines: Vec<PurchaseOrderLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveLineInput {
    pub line_id: Uuid,
    /// Units received; weight in storage units for weight-tracked items
    /// without `total_weight`
    pub quantity: Decimal,
    /// Split receipts: total weight when `quantity` counts containers
    pub total_weight: Option<Decimal>,
    /// Overrides the ordered unit price when the invoice differs
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveInput {
    pub receipts: Vec<ReceiveLineInput>,
    /// Commit each line independently instead of all-or-nothing
    #[serde(default)]
    pub continue_on_error: bool,
    pub performed_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReceiveOutcome {
    pub order: PurchaseOrder,
    pub received: Vec<ReceivedLine>,
    pub failed: Vec<ReceiveFailure>,
    /// True when the whole receipt batch was discarded
    pub aborted: bool,
}

#[derive(Debug, Serialize)]
pub struct ReceivedLine {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub outcome: MutationOutcome,
}

#[derive(Debug, Serialize)]
pub struct ReceiveFailure {
    pub line_id: Uuid,
    pub error: String,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, engine: EngineService) -> Self {
        Self { store, engine }
    }

    /// Create a draft order, numbered `PO-YYYY-NNNN`
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<OrderWithLines> {
        if let Some(vendor) = &input.vendor {
            if let Err(msg) = validate_vendor(vendor) {
                return Err(AppError::Validation {
                    field: "vendor".to_string(),
                    message: msg.to_string(),
                    message_fr: "Nom de fournisseur invalide".to_string(),
                });
            }
        }
        for line in &input.lines {
            validate_line(line)?;
        }

        let now = Utc::now();
        let year = now.year();
        let sequence = self.store.next_order_sequence(year).await?;
        let order_id = Uuid::new_v4();

        let lines: Vec<PurchaseOrderLine> = input
            .lines
            .iter()
            .map(|line| PurchaseOrderLine {
                id: Uuid::new_v4(),
                order_id,
                item_id: line.item_id,
                description: line.description.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                unit: line.unit.clone(),
                unit_price: line.unit_price,
                quantity_received: Decimal::ZERO,
                created_at: now,
            })
            .collect();

        let totals = OrderTotals::from_lines(&lines);
        let order = PurchaseOrder {
            id: order_id,
            order_number: generate_order_number(year, sequence),
            vendor: input.vendor,
            status: OrderStatus::Draft,
            subtotal: totals.subtotal,
            gst: totals.gst,
            qst: totals.qst,
            total: totals.total,
            expected_at: input.expected_at,
            received_at: None,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.upsert_order(order.clone());
        for line in &lines {
            batch.upsert_line(line.clone());
        }
        self.store.apply(batch).await?;

        tracing::info!(order_number = %order.order_number, "purchase order created");
        Ok(OrderWithLines { order, lines })
    }

    /// Add a line to a draft order and recompute totals
    pub async fn add_line(&self, order_id: Uuid, input: NewLineInput) -> AppResult<OrderWithLines> {
        validate_line(&input)?;

        let mut order = self.load_order(order_id).await?;
        if order.status != OrderStatus::Draft {
            return Err(AppError::Conflict {
                resource: "purchase_order".to_string(),
                message: "Lines can only be added to draft orders".to_string(),
                message_fr: "Des lignes ne peuvent être ajoutées qu'aux commandes en brouillon"
                    .to_string(),
            });
        }

        let now = Utc::now();
        let line = PurchaseOrderLine {
            id: Uuid::new_v4(),
            order_id,
            item_id: input.item_id,
            description: input.description,
            sku: input.sku,
            quantity: input.quantity,
            unit: input.unit,
            unit_price: input.unit_price,
            quantity_received: Decimal::ZERO,
            created_at: now,
        };

        let mut lines = self.store.lines_for_order(order_id).await?;
        lines.push(line.clone());

        let totals = OrderTotals::from_lines(&lines);
        order.subtotal = totals.subtotal;
        order.gst = totals.gst;
        order.qst = totals.qst;
        order.total = totals.total;
        order.updated_at = now;

        let mut batch = WriteBatch::new();
        batch.upsert_line(line);
        batch.upsert_order(order.clone());
        self.store.apply(batch).await?;

        Ok(OrderWithLines { order, lines })
    }

    /// Move an order along its lifecycle
    pub async fn update_status(
        &self,
        order_id: Uuid,
        next: OrderStatus,
    ) -> AppResult<PurchaseOrder> {
        let mut order = self.load_order(order_id).await?;
        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "order {} cannot move from {} to {}",
                order.order_number, order.status, next
            )));
        }

        let now = Utc::now();
        order.status = next;
        if next == OrderStatus::Received {
            order.received_at = Some(now);
        }
        order.updated_at = now;
        self.store.update_order(&order).await?;

        tracing::info!(
            order_number = %order.order_number,
            status = %order.status,
            "order status updated"
        );
        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid) -> AppResult<OrderWithLines> {
        let order = self.load_order(order_id).await?;
        let lines = self.store.lines_for_order(order_id).await?;
        Ok(OrderWithLines { order, lines })
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> AppResult<Vec<PurchaseOrder>> {
        self.store.list_orders(status).await
    }

    /// Receive goods against order lines.
    ///
    /// Stock, ledger entries, line progress, totals, and order status all
    /// move together. Lines without a linked item get one created from
    /// the line data. The default mode is all-or-nothing; with
    /// `continue_on_error` each line commits on its own and failures are
    /// reported per line.
    pub async fn receive_lines(
        &self,
        order_id: Uuid,
        input: ReceiveInput,
    ) -> AppResult<ReceiveOutcome> {
        let order = self.load_order(order_id).await?;
        if !order.status.can_receive() {
            return Err(AppError::InvalidTransition(format!(
                "order {} in status {} cannot receive goods",
                order.order_number, order.status
            )));
        }
        if input.receipts.is_empty() {
            return Err(AppError::Validation {
                field: "receipts".to_string(),
                message: "At least one receipt line is required".to_string(),
                message_fr: "Au moins une ligne de réception est requise".to_string(),
            });
        }

        let lines = self.store.lines_for_order(order_id).await?;
        let mut line_map: HashMap<Uuid, PurchaseOrderLine> =
            lines.into_iter().map(|line| (line.id, line)).collect();

        let mut seen = HashSet::new();
        for receipt in &input.receipts {
            if !line_map.contains_key(&receipt.line_id) {
                return Err(AppError::NotFound("Order line".to_string()));
            }
            if !seen.insert(receipt.line_id) {
                return Err(AppError::ValidationError(
                    "Duplicate line in receipt batch".to_string(),
                ));
            }
        }

        if input.continue_on_error {
            self.receive_incremental(order, line_map, input).await
        } else {
            self.receive_atomic(order, line_map, input).await
        }
    }

    async fn receive_atomic(
        &self,
        order: PurchaseOrder,
        mut line_map: HashMap<Uuid, PurchaseOrderLine>,
        input: ReceiveInput,
    ) -> AppResult<ReceiveOutcome> {
        // Unlinked lines get a fresh item, staged but not yet persisted
        let mut staged_items: HashMap<Uuid, InventoryItem> = HashMap::new();
        for receipt in &input.receipts {
            let line = line_map
                .get_mut(&receipt.line_id)
                .ok_or_else(|| AppError::NotFound("Order line".to_string()))?;
            if line.item_id.is_none() {
                let item = item_from_line(line, order.vendor.as_deref());
                line.item_id = Some(item.id);
                staged_items.insert(item.id, item);
            }
        }

        let mut item_ids: Vec<Uuid> = input
            .receipts
            .iter()
            .filter_map(|r| line_map.get(&r.line_id).and_then(|l| l.item_id))
            .collect();
        item_ids.sort();
        item_ids.dedup();

        let mut guards = Vec::with_capacity(item_ids.len());
        for id in &item_ids {
            guards.push(self.engine.locks().acquire(*id).await);
        }

        let mut transactions = Vec::new();
        let mut received = Vec::new();
        let mut failed = Vec::new();
        let touched: HashSet<Uuid> = input.receipts.iter().map(|r| r.line_id).collect();

        for receipt in &input.receipts {
            let line = line_map[&receipt.line_id].clone();
            let item_id = match line.item_id {
                Some(id) => id,
                None => continue,
            };
            let current = match staged_items.get(&item_id) {
                Some(item) => item.clone(),
                None => match self.store.get_item(item_id).await? {
                    Some(item) => item,
                    None => {
                        failed.push(ReceiveFailure {
                            line_id: receipt.line_id,
                            error: "linked item not found".to_string(),
                        });
                        continue;
                    }
                },
            };

            match stage_line_receipt(
                &current,
                &line,
                receipt,
                &order,
                &input.performed_by,
                self.engine.breakpoints(),
            ) {
                Ok((staged, updated_line)) => {
                    staged_items.insert(item_id, staged.item);
                    transactions.push(staged.transaction);
                    received.push(ReceivedLine {
                        line_id: receipt.line_id,
                        item_id,
                        outcome: staged.outcome,
                    });
                    line_map.insert(updated_line.id, updated_line);
                }
                Err(e) => failed.push(ReceiveFailure {
                    line_id: receipt.line_id,
                    error: e.to_string(),
                }),
            }
        }

        if !failed.is_empty() {
            return Ok(ReceiveOutcome {
                order,
                received: Vec::new(),
                failed,
                aborted: true,
            });
        }

        let now = Utc::now();
        let mut updated_order = order;
        let all_lines: Vec<PurchaseOrderLine> = line_map.values().cloned().collect();
        apply_receipt_state(&mut updated_order, &all_lines, now);

        let mut batch = WriteBatch::new();
        for item in staged_items.into_values() {
            batch.upsert_item(item);
        }
        for txn in transactions {
            batch.append_transaction(txn);
        }
        for line_id in &touched {
            batch.upsert_line(line_map[line_id].clone());
        }
        batch.upsert_order(updated_order.clone());
        self.store.apply(batch).await?;

        tracing::info!(
            order_number = %updated_order.order_number,
            lines = received.len(),
            "goods received"
        );
        Ok(ReceiveOutcome {
            order: updated_order,
            received,
            failed: Vec::new(),
            aborted: false,
        })
    }

    async fn receive_incremental(
        &self,
        order: PurchaseOrder,
        mut line_map: HashMap<Uuid, PurchaseOrderLine>,
        input: ReceiveInput,
    ) -> AppResult<ReceiveOutcome> {
        let mut received = Vec::new();
        let mut failed = Vec::new();

        for receipt in &input.receipts {
            let mut line = line_map[&receipt.line_id].clone();

            let mut created_item: Option<InventoryItem> = None;
            let item_id = match line.item_id {
                Some(id) => id,
                None => {
                    let item = item_from_line(&line, order.vendor.as_deref());
                    line.item_id = Some(item.id);
                    let id = item.id;
                    created_item = Some(item);
                    id
                }
            };

            let _guard = self.engine.locks().acquire(item_id).await;
            let current = match created_item.clone() {
                Some(item) => item,
                None => match self.store.get_item(item_id).await? {
                    Some(item) => item,
                    None => {
                        failed.push(ReceiveFailure {
                            line_id: receipt.line_id,
                            error: "linked item not found".to_string(),
                        });
                        continue;
                    }
                },
            };

            match stage_line_receipt(
                &current,
                &line,
                receipt,
                &order,
                &input.performed_by,
                self.engine.breakpoints(),
            ) {
                Ok((staged, updated_line)) => {
                    let mut batch = WriteBatch::new();
                    batch.upsert_item(staged.item);
                    batch.append_transaction(staged.transaction);
                    batch.upsert_line(updated_line.clone());
                    self.store.apply(batch).await?;
                    received.push(ReceivedLine {
                        line_id: receipt.line_id,
                        item_id,
                        outcome: staged.outcome,
                    });
                    line_map.insert(updated_line.id, updated_line);
                }
                Err(e) => failed.push(ReceiveFailure {
                    line_id: receipt.line_id,
                    error: e.to_string(),
                }),
            }
        }

        let now = Utc::now();
        let mut updated_order = order;
        let all_lines: Vec<PurchaseOrderLine> = line_map.values().cloned().collect();
        apply_receipt_state(&mut updated_order, &all_lines, now);
        self.store.update_order(&updated_order).await?;

        Ok(ReceiveOutcome {
            order: updated_order,
            received,
            failed,
            aborted: false,
        })
    }

    async fn load_order(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))
    }
}

fn validate_line(line: &NewLineInput) -> AppResult<()> {
    if let Err(msg) = validate_name(&line.description) {
        return Err(AppError::Validation {
            field: "description".to_string(),
            message: msg.to_string(),
            message_fr: "Description de ligne invalide".to_string(),
        });
    }
    if let Err(msg) = validate_positive_quantity(line.quantity) {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_fr: "La quantité commandée doit être positive".to_string(),
        });
    }
    if let Err(msg) = validate_unit_price(line.unit_price) {
        return Err(AppError::Validation {
            field: "unit_price".to_string(),
            message: msg.to_string(),
            message_fr: "Prix unitaire invalide".to_string(),
        });
    }
    Ok(())
}

/// Seed an inventory item from an order line being received for the
/// first time. Weight and volume unit tokens carry over; count tokens
/// leave the resolver on its count default.
fn item_from_line(line: &PurchaseOrderLine, vendor: Option<&str>) -> InventoryItem {
    let mut item = InventoryItem::new(line.description.clone());
    item.sku = line.sku.clone();
    if let Some(unit) = &line.unit {
        match units::unit_dimension(unit) {
            Some(BaseUnit::Grams) | Some(BaseUnit::Milliliters) => {
                item.stock_weight_unit = Some(unit.clone());
            }
            _ => {}
        }
    }
    if line.unit_price > Decimal::ZERO {
        item.last_unit_cost = Some(line.unit_price);
    }
    item.preferred_vendor = vendor.map(|v| v.to_string());
    item
}

fn stage_line_receipt(
    item: &InventoryItem,
    line: &PurchaseOrderLine,
    receipt: &ReceiveLineInput,
    order: &PurchaseOrder,
    performed_by: &Option<String>,
    breakpoints: &ThresholdBreakpoints,
) -> AppResult<(StagedMutation, PurchaseOrderLine)> {
    let fallback_cost = if line.unit_price > Decimal::ZERO {
        Some(line.unit_price)
    } else {
        None
    };
    let receipt_input = ReceiptInput {
        quantity: receipt.quantity,
        total_weight: receipt.total_weight,
        unit_cost: receipt.unit_cost.or(fallback_cost),
        notes: Some(format!("Received against {}", order.order_number)),
        performed_by: performed_by.clone(),
    };
    let reference = StockReference {
        reference_type: ReferenceType::Invoice,
        reference_id: order.id,
    };
    let staged = stage_receipt(item, &receipt_input, Some(reference), breakpoints)?;

    let mut updated_line = line.clone();
    updated_line.item_id = Some(item.id);
    updated_line.quantity_received += receipt.quantity;
    if let Some(cost) = receipt.unit_cost {
        updated_line.unit_price = cost;
    }
    Ok((staged, updated_line))
}

/// Recompute totals and derive the post-receipt status
fn apply_receipt_state(
    order: &mut PurchaseOrder,
    lines: &[PurchaseOrderLine],
    now: DateTime<Utc>,
) {
    let totals = OrderTotals::from_lines(lines);
    order.subtotal = totals.subtotal;
    order.gst = totals.gst;
    order.qst = totals.qst;
    order.total = totals.total;

    let fully = !lines.is_empty() && lines.iter().all(|line| line.is_fully_received());
    let any = lines
        .iter()
        .any(|line| line.quantity_received > Decimal::ZERO);
    if fully {
        if order.status != OrderStatus::Received {
            order.status = OrderStatus::Received;
            order.received_at = Some(now);
        }
    } else if any {
        order.status = OrderStatus::PartiallyReceived;
    }
    order.updated_at = now;
}
