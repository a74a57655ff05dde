//! Stock ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable stock ledger entry
///
/// Entries are never edited after creation; the only later mutation is the
/// void flag with its reason and timestamp, which excludes the entry from
/// balance math but keeps it for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub transaction_type: TransactionType,
    /// Signed delta applied to the item's tracked stock field;
    /// zero for transfers
    pub quantity_change: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    /// Storage-unit token the amounts are expressed in
    pub unit: String,
    pub reference: Option<StockReference>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub void: bool,
    pub void_reason: Option<String>,
    pub voided_at: Option<DateTime<Utc>>,
}

/// Types of stock transactions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    TaskUsage,
    Adjustment,
    Waste,
    Transfer,
    CountCorrection,
    Return,
    Sample,
    Theft,
    Initial,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::TaskUsage => "task_usage",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Waste => "waste",
            TransactionType::Transfer => "transfer",
            TransactionType::CountCorrection => "count_correction",
            TransactionType::Return => "return",
            TransactionType::Sample => "sample",
            TransactionType::Theft => "theft",
            TransactionType::Initial => "initial",
        }
    }

    pub fn all() -> &'static [TransactionType] {
        &[
            TransactionType::Purchase,
            TransactionType::TaskUsage,
            TransactionType::Adjustment,
            TransactionType::Waste,
            TransactionType::Transfer,
            TransactionType::CountCorrection,
            TransactionType::Return,
            TransactionType::Sample,
            TransactionType::Theft,
            TransactionType::Initial,
        ]
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(TransactionType::Purchase),
            "task_usage" => Ok(TransactionType::TaskUsage),
            "adjustment" => Ok(TransactionType::Adjustment),
            "waste" => Ok(TransactionType::Waste),
            "transfer" => Ok(TransactionType::Transfer),
            "count_correction" => Ok(TransactionType::CountCorrection),
            "return" => Ok(TransactionType::Return),
            "sample" => Ok(TransactionType::Sample),
            "theft" => Ok(TransactionType::Theft),
            "initial" => Ok(TransactionType::Initial),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loose foreign key from a ledger entry to the document that caused it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockReference {
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
}

/// Document kinds a ledger entry may reference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Invoice,
    Task,
    Recipe,
    Count,
    Transfer,
    Manual,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Invoice => "invoice",
            ReferenceType::Task => "task",
            ReferenceType::Recipe => "recipe",
            ReferenceType::Count => "count",
            ReferenceType::Transfer => "transfer",
            ReferenceType::Manual => "manual",
        }
    }
}

impl std::str::FromStr for ReferenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(ReferenceType::Invoice),
            "task" => Ok(ReferenceType::Task),
            "recipe" => Ok(ReferenceType::Recipe),
            "count" => Ok(ReferenceType::Count),
            "transfer" => Ok(ReferenceType::Transfer),
            "manual" => Ok(ReferenceType::Manual),
            other => Err(format!("unknown reference type: {}", other)),
        }
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
