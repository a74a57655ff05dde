//! Reorder reporting
//!
//! Procurement view over the catalog: every active item below its
//! warning threshold or reorder point, with a suggested order quantity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::strategy::{self, StrategyKind};
use shared::types::{ThresholdBreakpoints, ThresholdStatus};

use crate::error::AppResult;
use crate::store::Store;

#[derive(Clone)]
pub struct ReorderService {
    store: Arc<dyn Store>,
    breakpoints: ThresholdBreakpoints,
}

#[derive(Debug, Serialize)]
pub struct ReorderReport {
    pub generated_at: DateTime<Utc>,
    pub items_checked: usize,
    pub lines: Vec<ReorderLine>,
}

#[derive(Debug, Serialize)]
pub struct ReorderLine {
    pub item_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub preferred_vendor: Option<String>,
    pub kind: StrategyKind,
    pub stock: Decimal,
    pub par: Option<Decimal>,
    pub unit: String,
    pub threshold: ThresholdStatus,
    pub below_reorder_point: bool,
    /// Explicit reorder quantity when set, otherwise the gap to par
    pub suggested_quantity: Option<Decimal>,
}

impl ReorderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            breakpoints: ThresholdBreakpoints::default(),
        }
    }

    /// Items needing attention, most urgent first
    pub async fn reorder_report(&self) -> AppResult<ReorderReport> {
        let items = self.store.list_items(false).await?;
        let items_checked = items.len();

        let mut lines = Vec::new();
        for item in items {
            let resolved = strategy::resolve(&item);
            let stock = resolved.effective_stock(&item);
            let par = resolved.effective_par(&item);
            let threshold = self.breakpoints.classify(stock, par);
            let below_reorder_point = item.reorder_point.map_or(false, |point| stock <= point);

            if threshold == ThresholdStatus::Ok && !below_reorder_point {
                continue;
            }

            let suggested_quantity = item
                .reorder_quantity
                .or_else(|| par.map(|p| (p - stock).max(Decimal::ZERO)));

            lines.push(ReorderLine {
                item_id: item.id,
                name: item.name,
                sku: item.sku,
                preferred_vendor: item.preferred_vendor,
                kind: resolved.kind,
                stock,
                par,
                unit: resolved.stock_unit,
                threshold,
                below_reorder_point,
                suggested_quantity,
            });
        }

        lines.sort_by(|a, b| {
            severity(a.threshold)
                .cmp(&severity(b.threshold))
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(ReorderReport {
            generated_at: Utc::now(),
            items_checked,
            lines,
        })
    }
}

fn severity(status: ThresholdStatus) -> u8 {
    match status {
        ThresholdStatus::Critical => 0,
        ThresholdStatus::Low => 1,
        ThresholdStatus::Warning => 2,
        ThresholdStatus::Ok => 3,
    }
}
