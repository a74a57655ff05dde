//! Stock ledger service
//!
//! Owns the append-only audit trail: raw appends, voiding, history with
//! running balances, period summaries, and CSV export. Stock mutations
//! normally reach the ledger through the engine, which pairs each entry
//! with the matching item update; the raw append here is for imports,
//! transfers, and opening balances.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::{ReferenceType, StockReference, StockTransaction, TransactionType};
use shared::types::DateRange;
use shared::validation::validate_reason;

use crate::error::{AppError, AppResult};
use crate::store::Store;

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

/// Input for a raw ledger append
#[derive(Debug, Clone, Deserialize)]
pub struct AppendEntryInput {
    pub item_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_change: Decimal,
    pub stock_before: Decimal,
    /// Computed as `stock_before + quantity_change` when omitted
    pub stock_after: Option<Decimal>,
    pub unit: String,
    pub reference: Option<StockReference>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub unit_cost: Option<Decimal>,
    /// Computed as `|quantity_change| * unit_cost` when omitted
    pub total_cost: Option<Decimal>,
    pub performed_by: Option<String>,
}

/// A ledger entry paired with the balance after it was applied
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub transaction: StockTransaction,
    pub running_balance: Decimal,
}

/// Aggregate movement for one item over a period
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    pub item_id: Uuid,
    pub entries: usize,
    pub voided: usize,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub net_change: Decimal,
    pub total_cost: Decimal,
    pub by_type: Vec<TypeBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeBreakdown {
    pub transaction_type: TransactionType,
    pub count: usize,
    pub quantity_change: Decimal,
}

#[derive(Serialize)]
struct CsvRow {
    date: String,
    transaction_type: &'static str,
    quantity_change: Decimal,
    stock_before: Decimal,
    stock_after: Decimal,
    unit: String,
    reason: String,
    notes: String,
    unit_cost: String,
    total_cost: String,
    performed_by: String,
    void: bool,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append a new entry to the ledger
    pub async fn append(&self, input: AppendEntryInput) -> AppResult<StockTransaction> {
        if self.store.get_item(input.item_id).await?.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        if input.unit.trim().is_empty() {
            return Err(AppError::Validation {
                field: "unit".to_string(),
                message: "Unit is required".to_string(),
                message_fr: "L'unité est requise".to_string(),
            });
        }

        // Transfers move stock between locations, never in or out
        if input.transaction_type == TransactionType::Transfer
            && input.quantity_change != Decimal::ZERO
        {
            return Err(AppError::Validation {
                field: "quantity_change".to_string(),
                message: "Transfers must not change total stock".to_string(),
                message_fr: "Les transferts ne doivent pas modifier le stock total".to_string(),
            });
        }

        let stock_after = input
            .stock_after
            .unwrap_or(input.stock_before + input.quantity_change);
        if stock_after != input.stock_before + input.quantity_change {
            return Err(AppError::Validation {
                field: "stock_after".to_string(),
                message: "stock_after must equal stock_before + quantity_change".to_string(),
                message_fr: "stock_after doit être égal à stock_before + quantity_change"
                    .to_string(),
            });
        }

        let total_cost = input
            .total_cost
            .or_else(|| input.unit_cost.map(|c| input.quantity_change.abs() * c));

        let txn = StockTransaction {
            id: Uuid::new_v4(),
            item_id: input.item_id,
            transaction_type: input.transaction_type,
            quantity_change: input.quantity_change,
            stock_before: input.stock_before,
            stock_after,
            unit: input.unit,
            reference: input.reference,
            reason: input.reason,
            notes: input.notes,
            unit_cost: input.unit_cost,
            total_cost,
            performed_by: input.performed_by,
            created_at: Utc::now(),
            void: false,
            void_reason: None,
            voided_at: None,
        };

        self.store.append_transaction(&txn).await?;
        Ok(txn)
    }

    /// Fetch a single entry
    pub async fn entry(&self, transaction_id: Uuid) -> AppResult<StockTransaction> {
        self.store
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))
    }

    /// Void an entry. Amounts stay untouched; the entry is only excluded
    /// from balance math from now on.
    pub async fn void(
        &self,
        transaction_id: Uuid,
        reason: &str,
        actor: Option<String>,
    ) -> AppResult<StockTransaction> {
        if let Err(msg) = validate_reason(reason) {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: msg.to_string(),
                message_fr: "Un motif d'annulation est requis".to_string(),
            });
        }

        let mut txn = self.entry(transaction_id).await?;
        if txn.void {
            return Err(AppError::Conflict {
                resource: "transaction".to_string(),
                message: "Entry is already voided".to_string(),
                message_fr: "L'écriture est déjà annulée".to_string(),
            });
        }

        let at = Utc::now();
        self.store
            .mark_void(transaction_id, reason, actor.as_deref(), at)
            .await?;

        txn.void = true;
        txn.void_reason = Some(reason.to_string());
        txn.voided_at = Some(at);
        if let Some(actor) = actor {
            txn.performed_by = Some(actor);
        }
        Ok(txn)
    }

    /// Item history, newest first, each entry carrying the running balance
    /// at that point. Balances are re-derived from the deltas, skipping
    /// voided entries, so they stay correct after a void.
    pub async fn history_for(
        &self,
        item_id: Uuid,
        limit: Option<usize>,
    ) -> AppResult<Vec<HistoryEntry>> {
        if self.store.get_item(item_id).await?.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let transactions = self.store.transactions_for_item(item_id).await?;
        let mut balance = Decimal::ZERO;
        let mut history: Vec<HistoryEntry> = transactions
            .into_iter()
            .map(|txn| {
                if !txn.void {
                    balance += txn.quantity_change;
                }
                HistoryEntry {
                    running_balance: balance,
                    transaction: txn,
                }
            })
            .collect();

        history.reverse();
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        Ok(history)
    }

    /// Aggregate in/out movement for one item, optionally date-bounded
    pub async fn summary_for(
        &self,
        item_id: Uuid,
        range: Option<DateRange>,
    ) -> AppResult<LedgerSummary> {
        if self.store.get_item(item_id).await?.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let transactions: Vec<StockTransaction> = self
            .store
            .transactions_for_item(item_id)
            .await?
            .into_iter()
            .filter(|txn| match &range {
                Some(r) => r.contains(txn.created_at.date_naive()),
                None => true,
            })
            .collect();

        let mut summary = LedgerSummary {
            item_id,
            entries: transactions.len(),
            voided: 0,
            total_in: Decimal::ZERO,
            total_out: Decimal::ZERO,
            net_change: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            by_type: Vec::new(),
        };

        for txn in &transactions {
            if txn.void {
                summary.voided += 1;
                continue;
            }
            if txn.quantity_change > Decimal::ZERO {
                summary.total_in += txn.quantity_change;
            } else {
                summary.total_out += txn.quantity_change.abs();
            }
            if let Some(cost) = txn.total_cost {
                summary.total_cost += cost;
            }
        }
        summary.net_change = summary.total_in - summary.total_out;

        for transaction_type in TransactionType::all() {
            let matching: Vec<&StockTransaction> = transactions
                .iter()
                .filter(|txn| !txn.void && txn.transaction_type == *transaction_type)
                .collect();
            if matching.is_empty() {
                continue;
            }
            summary.by_type.push(TypeBreakdown {
                transaction_type: *transaction_type,
                count: matching.len(),
                quantity_change: matching.iter().map(|txn| txn.quantity_change).sum(),
            });
        }

        Ok(summary)
    }

    /// Entries caused by one document (an invoice, a task, ...)
    pub async fn entries_for_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> AppResult<Vec<StockTransaction>> {
        self.store
            .transactions_by_reference(reference_type, reference_id)
            .await
    }

    /// Full item history as CSV, oldest first, voided entries included
    pub async fn export_csv(&self, item_id: Uuid) -> AppResult<String> {
        if self.store.get_item(item_id).await?.is_none() {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let transactions = self.store.transactions_for_item(item_id).await?;
        let mut writer = csv::Writer::from_writer(vec![]);
        for txn in &transactions {
            let row = CsvRow {
                date: txn.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                transaction_type: txn.transaction_type.as_str(),
                quantity_change: txn.quantity_change,
                stock_before: txn.stock_before,
                stock_after: txn.stock_after,
                unit: txn.unit.clone(),
                reason: txn.reason.clone().unwrap_or_default(),
                notes: txn.notes.clone().unwrap_or_default(),
                unit_cost: txn.unit_cost.map(|c| c.to_string()).unwrap_or_default(),
                total_cost: txn.total_cost.map(|c| c.to_string()).unwrap_or_default(),
                performed_by: txn.performed_by.clone().unwrap_or_default(),
                void: txn.void,
            };
            writer
                .serialize(row)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer flush failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding: {}", e)))
    }
}
