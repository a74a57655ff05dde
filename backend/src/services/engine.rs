//! Stock deduction engine
//!
//! Single choke point for every cached-stock mutation. Each operation
//! runs under a per-item async lock, re-resolves the item's tracking
//! strategy, applies the change, and commits the item update together
//! with its ledger entry in one atomic batch. Nothing else in the
//! backend writes `stock_weight` or `stock_quantity`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use shared::models::{InventoryItem, StockReference, StockTransaction, TransactionType};
use shared::strategy::{self, DeductionStrategy, StockField, StrategyKind};
use shared::types::{ThresholdBreakpoints, ThresholdStatus};
use shared::units;
use shared::validation::{validate_positive_quantity, validate_reason};

use crate::error::{AppError, AppResult};
use crate::store::{Store, WriteBatch};

/// Registry of per-item async locks serializing read-modify-write cycles
///
/// Locks are created on first use and never dropped; the registry grows
/// with the number of distinct items touched, which is bounded by the
/// catalog size.
#[derive(Default)]
pub struct ItemLocks {
    registry: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, item_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.registry.lock().await;
            registry
                .entry(item_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Result of one stock mutation
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub item_id: Uuid,
    /// `None` when the operation was a no-op and wrote nothing
    pub transaction_id: Option<Uuid>,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub unit: String,
    pub no_change: bool,
    pub threshold: ThresholdStatus,
    /// Case-tracked deductions: whether a container boundary was crossed
    pub case_opened: bool,
    /// Case-tracked deductions: containers consumed by this mutation
    pub units_consumed: Decimal,
    pub warnings: Vec<StockWarning>,
}

/// Non-fatal conditions raised by a mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockWarning {
    LowStock {
        item_id: Uuid,
        status: ThresholdStatus,
    },
    CaseOpened {
        item_id: Uuid,
        units_consumed: Decimal,
    },
    InsufficientPartial {
        item_id: Uuid,
        requested: Decimal,
        available: Decimal,
    },
}

/// One receipt of goods against an item
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptInput {
    /// Units received; for weight-tracked items without `total_weight`
    /// this is the weight itself in storage units
    pub quantity: Decimal,
    /// Split receipts: total weight in storage units when `quantity`
    /// counts discrete containers
    pub total_weight: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub performed_by: Option<String>,
}

/// Options for usage deductions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeductOptions {
    /// Packaging-style items may legitimately go negative between counts
    #[serde(default)]
    pub allow_negative: bool,
    pub performed_by: Option<String>,
}

/// One line of a bulk adjustment
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustRequest {
    pub item_id: Uuid,
    pub delta: Decimal,
    pub reason: String,
    pub performed_by: Option<String>,
}

/// Structured result of a bulk mutation
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub success: Vec<MutationOutcome>,
    pub failed: Vec<BulkFailure>,
    /// True when the whole batch was rolled back
    pub aborted: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkFailure {
    pub item_id: Uuid,
    pub error: String,
}

/// A computed mutation not yet committed: the updated item, its ledger
/// entry, and the outcome to report once the batch lands.
pub(crate) struct StagedMutation {
    pub item: InventoryItem,
    pub transaction: StockTransaction,
    pub outcome: MutationOutcome,
}

#[derive(Clone)]
pub struct EngineService {
    store: Arc<dyn Store>,
    locks: Arc<ItemLocks>,
    breakpoints: ThresholdBreakpoints,
}

impl EngineService {
    pub fn new(store: Arc<dyn Store>, locks: Arc<ItemLocks>) -> Self {
        Self {
            store,
            locks,
            breakpoints: ThresholdBreakpoints::default(),
        }
    }

    pub fn with_breakpoints(mut self, breakpoints: ThresholdBreakpoints) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub(crate) fn locks(&self) -> &Arc<ItemLocks> {
        &self.locks
    }

    pub(crate) fn breakpoints(&self) -> &ThresholdBreakpoints {
        &self.breakpoints
    }

    async fn load_item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        self.store
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    async fn commit(&self, staged: StagedMutation) -> AppResult<MutationOutcome> {
        let mut batch = WriteBatch::new();
        batch.upsert_item(staged.item);
        batch.append_transaction(staged.transaction);
        self.store.apply(batch).await?;
        Ok(staged.outcome)
    }

    /// Apply a signed delta to the item's tracked stock field
    pub async fn adjust(
        &self,
        item_id: Uuid,
        delta: Decimal,
        reason: &str,
        performed_by: Option<String>,
    ) -> AppResult<MutationOutcome> {
        if let Err(msg) = validate_reason(reason) {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: msg.to_string(),
                message_fr: "Un motif est requis pour tout ajustement".to_string(),
            });
        }

        let _guard = self.locks.acquire(item_id).await;
        let item = self.load_item(item_id).await?;
        let staged = stage_adjust(&item, delta, reason, performed_by, &self.breakpoints)?;
        tracing::debug!(
            item_id = %item_id,
            delta = %delta,
            "stock adjustment"
        );
        self.commit(staged).await
    }

    /// Set the tracked stock field to an absolute counted level.
    /// Writes nothing when the level already matches.
    pub async fn set_absolute(
        &self,
        item_id: Uuid,
        new_level: Decimal,
        reason: &str,
        performed_by: Option<String>,
    ) -> AppResult<MutationOutcome> {
        if let Err(msg) = validate_reason(reason) {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: msg.to_string(),
                message_fr: "Un motif est requis pour toute correction".to_string(),
            });
        }
        if new_level < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "new_level".to_string(),
                message: "Counted stock cannot be negative".to_string(),
                message_fr: "Le stock compté ne peut pas être négatif".to_string(),
            });
        }

        let _guard = self.locks.acquire(item_id).await;
        let item = self.load_item(item_id).await?;
        let strategy = strategy::resolve(&item);
        let before = strategy.effective_stock(&item);

        if new_level == before {
            // Idempotent count: no ledger entry, no item write
            return Ok(MutationOutcome {
                item_id,
                transaction_id: None,
                stock_before: before,
                stock_after: before,
                unit: strategy.stock_unit.clone(),
                no_change: true,
                threshold: self
                    .breakpoints
                    .classify(before, strategy.effective_par(&item)),
                case_opened: false,
                units_consumed: Decimal::ZERO,
                warnings: Vec::new(),
            });
        }

        let delta = new_level - before;
        let mut updated = item.clone();
        set_effective_stock(&mut updated, &strategy, new_level);
        updated.updated_at = Utc::now();

        let transaction = build_transaction(
            &item,
            TransactionType::CountCorrection,
            delta,
            before,
            new_level,
            &strategy.stock_unit,
            Some(StockReferenceFields {
                reference: None,
                reason: Some(reason.to_string()),
                notes: Some(format!(
                    "Counted {} {}, book level was {} {}",
                    new_level, strategy.stock_unit, before, strategy.stock_unit
                )),
                unit_cost: None,
                total_cost: None,
                performed_by,
            }),
        );

        let threshold = self
            .breakpoints
            .classify(new_level, strategy.effective_par(&item));
        let outcome = MutationOutcome {
            item_id,
            transaction_id: Some(transaction.id),
            stock_before: before,
            stock_after: new_level,
            unit: strategy.stock_unit.clone(),
            no_change: false,
            threshold,
            case_opened: false,
            units_consumed: Decimal::ZERO,
            warnings: low_stock_warnings(item_id, threshold),
        };

        self.commit(StagedMutation {
            item: updated,
            transaction,
            outcome,
        })
        .await
    }

    /// Add received goods, handling split count-plus-weight receipts
    pub async fn add_from_receipt(
        &self,
        item_id: Uuid,
        receipt: ReceiptInput,
        reference: Option<StockReference>,
    ) -> AppResult<MutationOutcome> {
        let _guard = self.locks.acquire(item_id).await;
        let item = self.load_item(item_id).await?;
        let staged = stage_receipt(&item, &receipt, reference, &self.breakpoints)?;
        tracing::debug!(
            item_id = %item_id,
            quantity = %receipt.quantity,
            "stock receipt"
        );
        self.commit(staged).await
    }

    /// Deduct stock consumed by production, crossing case boundaries
    /// where the item tracks them
    pub async fn deduct_for_usage(
        &self,
        item_id: Uuid,
        quantity: Decimal,
        reference: Option<StockReference>,
        options: DeductOptions,
    ) -> AppResult<MutationOutcome> {
        let _guard = self.locks.acquire(item_id).await;
        let item = self.load_item(item_id).await?;
        let staged = stage_decrease(
            &item,
            quantity,
            TransactionType::TaskUsage,
            None,
            reference,
            &options,
            &self.breakpoints,
        )?;
        self.commit(staged).await
    }

    /// Record spoilage or loss. Never allowed to drive stock negative.
    pub async fn record_waste(
        &self,
        item_id: Uuid,
        quantity: Decimal,
        reason: &str,
        performed_by: Option<String>,
    ) -> AppResult<MutationOutcome> {
        if let Err(msg) = validate_reason(reason) {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: msg.to_string(),
                message_fr: "Un motif est requis pour toute perte".to_string(),
            });
        }

        let _guard = self.locks.acquire(item_id).await;
        let item = self.load_item(item_id).await?;
        let staged = stage_decrease(
            &item,
            quantity,
            TransactionType::Waste,
            Some(reason.to_string()),
            None,
            &DeductOptions {
                allow_negative: false,
                performed_by,
            },
            &self.breakpoints,
        )?;
        self.commit(staged).await
    }

    /// Adjust many items at once.
    ///
    /// Default mode is all-or-nothing: every line is staged first and a
    /// single failure discards the whole batch. With `continue_on_error`
    /// each line commits independently and failures are collected.
    pub async fn bulk_adjust(
        &self,
        requests: Vec<AdjustRequest>,
        continue_on_error: bool,
    ) -> AppResult<BulkOutcome> {
        if continue_on_error {
            let mut success = Vec::new();
            let mut failed = Vec::new();
            for request in requests {
                match self
                    .adjust(
                        request.item_id,
                        request.delta,
                        &request.reason,
                        request.performed_by.clone(),
                    )
                    .await
                {
                    Ok(outcome) => success.push(outcome),
                    Err(e) => failed.push(BulkFailure {
                        item_id: request.item_id,
                        error: e.to_string(),
                    }),
                }
            }
            return Ok(BulkOutcome {
                success,
                failed,
                aborted: false,
            });
        }

        // Atomic mode: lock every item in sorted order, stage every
        // line, then commit once
        let mut ids: Vec<Uuid> = requests.iter().map(|r| r.item_id).collect();
        ids.sort();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(AppError::ValidationError(
                "Duplicate item in atomic bulk adjustment".to_string(),
            ));
        }

        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            guards.push(self.locks.acquire(*id).await);
        }

        let mut batch = WriteBatch::new();
        let mut success = Vec::new();
        let mut failed = Vec::new();
        for request in &requests {
            let staged = match self.load_item(request.item_id).await {
                Ok(item) => stage_adjust(
                    &item,
                    request.delta,
                    &request.reason,
                    request.performed_by.clone(),
                    &self.breakpoints,
                ),
                Err(e) => Err(e),
            };
            match staged {
                Ok(staged) => {
                    batch.upsert_item(staged.item);
                    batch.append_transaction(staged.transaction);
                    success.push(staged.outcome);
                }
                Err(e) => failed.push(BulkFailure {
                    item_id: request.item_id,
                    error: e.to_string(),
                }),
            }
        }

        if !failed.is_empty() {
            return Ok(BulkOutcome {
                success: Vec::new(),
                failed,
                aborted: true,
            });
        }

        self.store.apply(batch).await?;
        Ok(BulkOutcome {
            success,
            failed,
            aborted: false,
        })
    }
}

// ============================================================================
// Staging
// ============================================================================
// Pure mutation math, shared with the order receiving path. Staging never
// touches the store; callers hold the item lock and commit the result.

struct StockReferenceFields {
    reference: Option<StockReference>,
    reason: Option<String>,
    notes: Option<String>,
    unit_cost: Option<Decimal>,
    total_cost: Option<Decimal>,
    performed_by: Option<String>,
}

fn build_transaction(
    item: &InventoryItem,
    transaction_type: TransactionType,
    quantity_change: Decimal,
    stock_before: Decimal,
    stock_after: Decimal,
    unit: &str,
    fields: Option<StockReferenceFields>,
) -> StockTransaction {
    let fields = fields.unwrap_or(StockReferenceFields {
        reference: None,
        reason: None,
        notes: None,
        unit_cost: None,
        total_cost: None,
        performed_by: None,
    });
    let total_cost = fields
        .total_cost
        .or_else(|| fields.unit_cost.map(|c| quantity_change.abs() * c));
    StockTransaction {
        id: Uuid::new_v4(),
        item_id: item.id,
        transaction_type,
        quantity_change,
        stock_before,
        stock_after,
        unit: unit.to_string(),
        reference: fields.reference,
        reason: fields.reason,
        notes: fields.notes,
        unit_cost: fields.unit_cost,
        total_cost,
        performed_by: fields.performed_by,
        created_at: Utc::now(),
        void: false,
        void_reason: None,
        voided_at: None,
    }
}

fn set_effective_stock(item: &mut InventoryItem, strategy: &DeductionStrategy, value: Decimal) {
    match strategy.stock_field {
        StockField::Weight => item.stock_weight = value,
        StockField::Quantity => item.stock_quantity = value,
    }
}

fn low_stock_warnings(item_id: Uuid, status: ThresholdStatus) -> Vec<StockWarning> {
    if status.is_alert() {
        vec![StockWarning::LowStock { item_id, status }]
    } else {
        Vec::new()
    }
}

/// Cost of one storage unit, derived from the item's pricing fields
fn usage_unit_cost(item: &InventoryItem, strategy: &DeductionStrategy) -> Option<Decimal> {
    match strategy.kind {
        StrategyKind::Weight => item
            .price_per_g
            .and_then(|p| units::to_base(Decimal::ONE, &strategy.stock_unit).map(|(g, _)| p * g)),
        StrategyKind::Volume => item
            .price_per_ml
            .and_then(|p| units::to_base(Decimal::ONE, &strategy.stock_unit).map(|(ml, _)| p * ml)),
        StrategyKind::Count => item.price_per_unit,
    }
}

pub(crate) fn stage_adjust(
    item: &InventoryItem,
    delta: Decimal,
    reason: &str,
    performed_by: Option<String>,
    breakpoints: &ThresholdBreakpoints,
) -> AppResult<StagedMutation> {
    let strategy = strategy::resolve(item);
    let before = strategy.effective_stock(item);
    let after = before + delta;
    if after < Decimal::ZERO {
        return Err(AppError::InsufficientStock {
            item: item.name.clone(),
            requested: delta.abs(),
            available: before,
        });
    }

    let mut updated = item.clone();
    set_effective_stock(&mut updated, &strategy, after);
    updated.updated_at = Utc::now();

    let transaction = build_transaction(
        item,
        TransactionType::Adjustment,
        delta,
        before,
        after,
        &strategy.stock_unit,
        Some(StockReferenceFields {
            reference: None,
            reason: Some(reason.to_string()),
            notes: None,
            unit_cost: None,
            total_cost: None,
            performed_by,
        }),
    );

    let threshold = breakpoints.classify(after, strategy.effective_par(item));
    let outcome = MutationOutcome {
        item_id: item.id,
        transaction_id: Some(transaction.id),
        stock_before: before,
        stock_after: after,
        unit: strategy.stock_unit.clone(),
        no_change: false,
        threshold,
        case_opened: false,
        units_consumed: Decimal::ZERO,
        warnings: low_stock_warnings(item.id, threshold),
    };

    Ok(StagedMutation {
        item: updated,
        transaction,
        outcome,
    })
}

pub(crate) fn stage_receipt(
    item: &InventoryItem,
    receipt: &ReceiptInput,
    reference: Option<StockReference>,
    breakpoints: &ThresholdBreakpoints,
) -> AppResult<StagedMutation> {
    if let Err(msg) = validate_positive_quantity(receipt.quantity) {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_fr: "La quantité reçue doit être positive".to_string(),
        });
    }
    if let Some(weight) = receipt.total_weight {
        if weight <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "total_weight".to_string(),
                message: "Total weight must be greater than zero".to_string(),
                message_fr: "Le poids total doit être supérieur à zéro".to_string(),
            });
        }
    }

    let strategy = strategy::resolve(item);
    let before = strategy.effective_stock(item);
    let mut updated = item.clone();

    // Split receipts carry both a container count and a total weight;
    // the count lands on stock_quantity, the weight on the tracked field
    let mut split_units: Option<Decimal> = None;
    let delta = match (strategy.stock_field, receipt.total_weight) {
        (StockField::Weight, Some(weight)) => {
            split_units = Some(receipt.quantity);
            updated.stock_quantity += receipt.quantity;
            weight
        }
        (StockField::Weight, None) => receipt.quantity,
        (StockField::Quantity, weight) => {
            if let Some(weight) = weight {
                updated.stock_weight += weight;
            }
            receipt.quantity
        }
    };

    let after = before + delta;
    set_effective_stock(&mut updated, &strategy, after);
    let now = Utc::now();
    if receipt.unit_cost.is_some() {
        updated.last_unit_cost = receipt.unit_cost;
    }
    updated.last_purchase_at = Some(now);
    updated.updated_at = now;

    let total_cost = receipt.unit_cost.map(|cost| match split_units {
        // Per-container price on split receipts
        Some(units) => units * cost,
        None => delta * cost,
    });
    let notes = receipt.notes.clone().or_else(|| {
        split_units.map(|units| {
            format!(
                "Received {} units as {} {}",
                units, delta, strategy.stock_unit
            )
        })
    });

    let transaction = build_transaction(
        item,
        TransactionType::Purchase,
        delta,
        before,
        after,
        &strategy.stock_unit,
        Some(StockReferenceFields {
            reference,
            reason: None,
            notes,
            unit_cost: receipt.unit_cost,
            total_cost,
            performed_by: receipt.performed_by.clone(),
        }),
    );

    let threshold = breakpoints.classify(after, strategy.effective_par(item));
    let outcome = MutationOutcome {
        item_id: item.id,
        transaction_id: Some(transaction.id),
        stock_before: before,
        stock_after: after,
        unit: strategy.stock_unit.clone(),
        no_change: false,
        threshold,
        case_opened: false,
        units_consumed: Decimal::ZERO,
        warnings: low_stock_warnings(item.id, threshold),
    };

    Ok(StagedMutation {
        item: updated,
        transaction,
        outcome,
    })
}

pub(crate) fn stage_decrease(
    item: &InventoryItem,
    quantity: Decimal,
    transaction_type: TransactionType,
    reason: Option<String>,
    reference: Option<StockReference>,
    options: &DeductOptions,
    breakpoints: &ThresholdBreakpoints,
) -> AppResult<StagedMutation> {
    if let Err(msg) = validate_positive_quantity(quantity) {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_fr: "La quantité à déduire doit être positive".to_string(),
        });
    }

    let strategy = strategy::resolve(item);
    let before = strategy.effective_stock(item);
    let mut updated = item.clone();
    let mut warnings = Vec::new();
    let mut case_opened = false;
    let mut units_consumed = Decimal::ZERO;

    let case_threshold = match strategy.stock_field {
        StockField::Weight => strategy.case_threshold(),
        StockField::Quantity => None,
    };

    let after = match case_threshold {
        Some(threshold) => {
            // Case-tracked: clamp at zero rather than fail, and cross
            // container boundaries by floor division
            let mut after = before - quantity;
            if after < Decimal::ZERO {
                warnings.push(StockWarning::InsufficientPartial {
                    item_id: item.id,
                    requested: quantity,
                    available: before,
                });
                after = Decimal::ZERO;
            }
            let crossed =
                (before / threshold).floor() - (after / threshold).floor();
            units_consumed = crossed.max(Decimal::ZERO);
            if units_consumed > Decimal::ZERO {
                case_opened = true;
                warnings.push(StockWarning::CaseOpened {
                    item_id: item.id,
                    units_consumed,
                });
                updated.stock_quantity =
                    (updated.stock_quantity - units_consumed).max(Decimal::ZERO);
            }
            after
        }
        None => {
            let after = before - quantity;
            if after < Decimal::ZERO && !options.allow_negative {
                return Err(AppError::InsufficientStock {
                    item: item.name.clone(),
                    requested: quantity,
                    available: before,
                });
            }
            after
        }
    };

    set_effective_stock(&mut updated, &strategy, after);
    updated.updated_at = Utc::now();

    let unit_cost = usage_unit_cost(item, &strategy);
    let transaction = build_transaction(
        item,
        transaction_type,
        after - before,
        before,
        after,
        &strategy.stock_unit,
        Some(StockReferenceFields {
            reference,
            reason,
            notes: None,
            unit_cost,
            total_cost: None,
            performed_by: options.performed_by.clone(),
        }),
    );

    let threshold = breakpoints.classify(after, strategy.effective_par(item));
    if threshold.is_alert() {
        warnings.push(StockWarning::LowStock {
            item_id: item.id,
            status: threshold,
        });
    }

    let outcome = MutationOutcome {
        item_id: item.id,
        transaction_id: Some(transaction.id),
        stock_before: before,
        stock_after: after,
        unit: strategy.stock_unit.clone(),
        no_change: false,
        threshold,
        case_opened,
        units_consumed,
        warnings,
    };

    Ok(StagedMutation {
        item: updated,
        transaction,
        outcome,
    })
}
