//! Inventory item model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inventory item tracked by the stock ledger
///
/// Items carry two cached stock fields: `stock_quantity` for discrete
/// counts (cases, bottles, pieces) and `stock_weight` for continuous
/// weight or volume, tagged by `stock_weight_unit`. Which field is
/// authoritative for a given item is decided by the strategy resolver
/// from the pricing and unit metadata below; the decision is never
/// stored, so it cannot drift from the fields it is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    /// Discrete count on hand (cases, bottles, pieces)
    pub stock_quantity: Decimal,
    /// Legacy unit tag for count-field tracking
    pub stock_quantity_unit: Option<String>,
    /// Continuous weight/volume on hand, in `stock_weight_unit`
    pub stock_weight: Decimal,
    pub stock_weight_unit: Option<String>,
    pub par_quantity: Option<Decimal>,
    pub par_weight: Option<Decimal>,
    pub reorder_point: Option<Decimal>,
    pub reorder_quantity: Option<Decimal>,
    /// Pricing fields double as tracking-type discriminators
    pub price_per_g: Option<Decimal>,
    pub price_per_ml: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub pricing_type: Option<String>,
    /// Case geometry: weight of one case/unit in storage units
    pub weight_per_unit: Option<Decimal>,
    pub units_per_case: Option<Decimal>,
    pub unit_size: Option<Decimal>,
    pub unit_size_unit: Option<String>,
    /// Volume of one piece in storage units
    pub volume_per_pc: Option<Decimal>,
    pub purchase_qty: Option<Decimal>,
    pub purchase_unit: Option<String>,
    pub last_unit_cost: Option<Decimal>,
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub preferred_vendor: Option<String>,
    /// Soft-delete flag; items with ledger history are never hard-deleted
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// A fresh item with zero stock; callers fill in metadata before insert
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sku: None,
            category: None,
            stock_quantity: Decimal::ZERO,
            stock_quantity_unit: None,
            stock_weight: Decimal::ZERO,
            stock_weight_unit: None,
            par_quantity: None,
            par_weight: None,
            reorder_point: None,
            reorder_quantity: None,
            price_per_g: None,
            price_per_ml: None,
            price_per_unit: None,
            pricing_type: None,
            weight_per_unit: None,
            units_per_case: None,
            unit_size: None,
            unit_size_unit: None,
            volume_per_pc: None,
            purchase_qty: None,
            purchase_unit: None,
            last_unit_cost: None,
            last_purchase_at: None,
            preferred_vendor: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
