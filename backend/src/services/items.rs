//! Inventory item catalog service
//!
//! Item CRUD and presentation. Stock fields are read-only here; every
//! stock mutation goes through the engine, including the opening balance
//! written when an item is created with initial stock.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::{InventoryItem, StockTransaction, TransactionType};
use shared::strategy::{self, DeductionStrategy, StockField};
use shared::types::{ThresholdBreakpoints, ThresholdStatus};
use shared::validation::{validate_name, validate_sku, validate_vendor};

use crate::error::{AppError, AppResult};
use crate::store::{Store, WriteBatch};

#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn Store>,
    breakpoints: ThresholdBreakpoints,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub stock_quantity_unit: Option<String>,
    pub stock_weight_unit: Option<String>,
    pub par_quantity: Option<Decimal>,
    pub par_weight: Option<Decimal>,
    pub reorder_point: Option<Decimal>,
    pub reorder_quantity: Option<Decimal>,
    pub price_per_g: Option<Decimal>,
    pub price_per_ml: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub pricing_type: Option<String>,
    pub weight_per_unit: Option<Decimal>,
    pub units_per_case: Option<Decimal>,
    pub unit_size: Option<Decimal>,
    pub unit_size_unit: Option<String>,
    pub volume_per_pc: Option<Decimal>,
    pub purchase_qty: Option<Decimal>,
    pub purchase_unit: Option<String>,
    pub preferred_vendor: Option<String>,
    /// Opening balance in the resolved strategy's storage unit
    pub initial_stock: Option<Decimal>,
    pub performed_by: Option<String>,
}

/// Metadata update; stock fields deliberately absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub par_quantity: Option<Decimal>,
    pub par_weight: Option<Decimal>,
    pub reorder_point: Option<Decimal>,
    pub reorder_quantity: Option<Decimal>,
    pub price_per_g: Option<Decimal>,
    pub price_per_ml: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub pricing_type: Option<String>,
    pub weight_per_unit: Option<Decimal>,
    pub units_per_case: Option<Decimal>,
    pub unit_size: Option<Decimal>,
    pub unit_size_unit: Option<String>,
    pub volume_per_pc: Option<Decimal>,
    pub purchase_qty: Option<Decimal>,
    pub purchase_unit: Option<String>,
    pub preferred_vendor: Option<String>,
}

/// An item with its resolved tracking strategy and level status
#[derive(Debug, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub strategy: DeductionStrategy,
    pub effective_stock: Decimal,
    pub effective_par: Option<Decimal>,
    pub threshold: ThresholdStatus,
}

impl ItemService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            breakpoints: ThresholdBreakpoints::default(),
        }
    }

    /// Create an item, writing an opening-balance ledger entry when
    /// initial stock is given
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<ItemDetail> {
        if let Err(msg) = validate_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
                message_fr: "Nom d'article invalide".to_string(),
            });
        }
        if let Some(sku) = &input.sku {
            if let Err(msg) = validate_sku(sku) {
                return Err(AppError::Validation {
                    field: "sku".to_string(),
                    message: msg.to_string(),
                    message_fr: "Code article (SKU) invalide".to_string(),
                });
            }
            if self.store.find_item_by_sku(sku).await?.is_some() {
                return Err(AppError::DuplicateEntry("SKU".to_string()));
            }
        }
        if let Some(vendor) = &input.preferred_vendor {
            if let Err(msg) = validate_vendor(vendor) {
                return Err(AppError::Validation {
                    field: "preferred_vendor".to_string(),
                    message: msg.to_string(),
                    message_fr: "Nom de fournisseur invalide".to_string(),
                });
            }
        }
        if let Some(pricing) = input.pricing_type.as_deref() {
            if !matches!(pricing, "weight" | "volume" | "unit") {
                return Err(AppError::Validation {
                    field: "pricing_type".to_string(),
                    message: "pricing_type must be weight, volume, or unit".to_string(),
                    message_fr: "pricing_type doit être weight, volume ou unit".to_string(),
                });
            }
        }
        if let Some(initial) = input.initial_stock {
            if initial < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "initial_stock".to_string(),
                    message: "Initial stock cannot be negative".to_string(),
                    message_fr: "Le stock initial ne peut pas être négatif".to_string(),
                });
            }
        }

        let mut item = InventoryItem::new(input.name);
        item.sku = input.sku;
        item.category = input.category;
        item.stock_quantity_unit = input.stock_quantity_unit;
        item.stock_weight_unit = input.stock_weight_unit;
        item.par_quantity = input.par_quantity;
        item.par_weight = input.par_weight;
        item.reorder_point = input.reorder_point;
        item.reorder_quantity = input.reorder_quantity;
        item.price_per_g = input.price_per_g;
        item.price_per_ml = input.price_per_ml;
        item.price_per_unit = input.price_per_unit;
        item.pricing_type = input.pricing_type;
        item.weight_per_unit = input.weight_per_unit;
        item.units_per_case = input.units_per_case;
        item.unit_size = input.unit_size;
        item.unit_size_unit = input.unit_size_unit;
        item.volume_per_pc = input.volume_per_pc;
        item.purchase_qty = input.purchase_qty;
        item.purchase_unit = input.purchase_unit;
        item.preferred_vendor = input.preferred_vendor;

        match input.initial_stock {
            Some(initial) if initial > Decimal::ZERO => {
                let resolved = strategy::resolve(&item);
                match resolved.stock_field {
                    StockField::Weight => item.stock_weight = initial,
                    StockField::Quantity => item.stock_quantity = initial,
                }
                let transaction = StockTransaction {
                    id: Uuid::new_v4(),
                    item_id: item.id,
                    transaction_type: TransactionType::Initial,
                    quantity_change: initial,
                    stock_before: Decimal::ZERO,
                    stock_after: initial,
                    unit: resolved.stock_unit.clone(),
                    reference: None,
                    reason: None,
                    notes: Some("Opening balance".to_string()),
                    unit_cost: None,
                    total_cost: None,
                    performed_by: input.performed_by,
                    created_at: Utc::now(),
                    void: false,
                    void_reason: None,
                    voided_at: None,
                };
                let mut batch = WriteBatch::new();
                batch.upsert_item(item.clone());
                batch.append_transaction(transaction);
                self.store.apply(batch).await?;
            }
            _ => {
                self.store.insert_item(&item).await?;
            }
        }

        tracing::info!(item = %item.name, "inventory item created");
        Ok(self.detail(item))
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<ItemDetail> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        Ok(self.detail(item))
    }

    pub async fn list_items(&self, include_inactive: bool) -> AppResult<Vec<ItemDetail>> {
        let items = self.store.list_items(include_inactive).await?;
        Ok(items.into_iter().map(|item| self.detail(item)).collect())
    }

    /// Update item metadata. Stock fields are owned by the engine and
    /// cannot be set here.
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<ItemDetail> {
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        if let Some(name) = input.name {
            if let Err(msg) = validate_name(&name) {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: msg.to_string(),
                    message_fr: "Nom d'article invalide".to_string(),
                });
            }
            item.name = name;
        }
        if let Some(category) = input.category {
            item.category = Some(category);
        }
        if let Some(v) = input.par_quantity {
            item.par_quantity = Some(v);
        }
        if let Some(v) = input.par_weight {
            item.par_weight = Some(v);
        }
        if let Some(v) = input.reorder_point {
            item.reorder_point = Some(v);
        }
        if let Some(v) = input.reorder_quantity {
            item.reorder_quantity = Some(v);
        }
        if let Some(v) = input.price_per_g {
            item.price_per_g = Some(v);
        }
        if let Some(v) = input.price_per_ml {
            item.price_per_ml = Some(v);
        }
        if let Some(v) = input.price_per_unit {
            item.price_per_unit = Some(v);
        }
        if let Some(pricing) = input.pricing_type {
            if !matches!(pricing.as_str(), "weight" | "volume" | "unit") {
                return Err(AppError::Validation {
                    field: "pricing_type".to_string(),
                    message: "pricing_type must be weight, volume, or unit".to_string(),
                    message_fr: "pricing_type doit être weight, volume ou unit".to_string(),
                });
            }
            item.pricing_type = Some(pricing);
        }
        if let Some(v) = input.weight_per_unit {
            item.weight_per_unit = Some(v);
        }
        if let Some(v) = input.units_per_case {
            item.units_per_case = Some(v);
        }
        if let Some(v) = input.unit_size {
            item.unit_size = Some(v);
        }
        if let Some(v) = input.unit_size_unit {
            item.unit_size_unit = Some(v);
        }
        if let Some(v) = input.volume_per_pc {
            item.volume_per_pc = Some(v);
        }
        if let Some(v) = input.purchase_qty {
            item.purchase_qty = Some(v);
        }
        if let Some(v) = input.purchase_unit {
            item.purchase_unit = Some(v);
        }
        if let Some(vendor) = input.preferred_vendor {
            if let Err(msg) = validate_vendor(&vendor) {
                return Err(AppError::Validation {
                    field: "preferred_vendor".to_string(),
                    message: msg.to_string(),
                    message_fr: "Nom de fournisseur invalide".to_string(),
                });
            }
            item.preferred_vendor = Some(vendor);
        }

        item.updated_at = Utc::now();
        self.store.update_item(&item).await?;
        Ok(self.detail(item))
    }

    /// Soft-delete. Items with ledger history are never removed, so the
    /// audit trail stays intact.
    pub async fn deactivate_item(&self, item_id: Uuid) -> AppResult<ItemDetail> {
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        item.active = false;
        item.updated_at = Utc::now();
        self.store.update_item(&item).await?;
        Ok(self.detail(item))
    }

    fn detail(&self, item: InventoryItem) -> ItemDetail {
        let resolved = strategy::resolve(&item);
        let effective_stock = resolved.effective_stock(&item);
        let effective_par = resolved.effective_par(&item);
        let threshold = self.breakpoints.classify(effective_stock, effective_par);
        ItemDetail {
            strategy: resolved,
            effective_stock,
            effective_par,
            threshold,
            item,
        }
    }
}
