//! Deduction strategy resolution
//!
//! How an item is tracked — by weight, volume, or discrete count — is never
//! stored. It is derived on demand from the item's pricing and unit
//! metadata, so the answer always reflects the current fields and cannot
//! drift. The decision chain terminates in a count default, making the
//! resolver total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::InventoryItem;
use crate::units::{self, BaseUnit, ParsedMetric, StorageAmount};

/// Tracking dimension of an item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Weight,
    Volume,
    Count,
}

/// Which cached item field the strategy reads and writes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockField {
    Weight,
    Quantity,
}

/// The resolved tracking strategy for one item, at one instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeductionStrategy {
    pub kind: StrategyKind,
    pub stock_field: StockField,
    /// Storage-unit token stock is kept in (e.g., "lb", "l", "ea")
    pub stock_unit: String,
    pub base_unit: BaseUnit,
    /// Whether the item derives a discrete count from continuous stock
    pub has_case: bool,
    /// Size of one case/container in storage units
    pub weight_per_case: Option<Decimal>,
}

impl DeductionStrategy {
    /// The current-stock value used for checks and status math
    pub fn effective_stock(&self, item: &InventoryItem) -> Decimal {
        match self.stock_field {
            StockField::Weight => item.stock_weight,
            StockField::Quantity => item.stock_quantity,
        }
    }

    /// The par target matching the tracked field
    pub fn effective_par(&self, item: &InventoryItem) -> Option<Decimal> {
        match self.stock_field {
            StockField::Weight => item.par_weight,
            StockField::Quantity => item.par_quantity,
        }
    }

    /// Case tracking is live only when a usable threshold exists
    pub fn case_threshold(&self) -> Option<Decimal> {
        if !self.has_case {
            return None;
        }
        self.weight_per_case.filter(|t| *t > Decimal::ZERO)
    }

    /// Project a parsed base-unit amount into this strategy's storage unit.
    ///
    /// `None` is a hard unit-mismatch signal (e.g., grams into a
    /// volume-tracked item), never a silent coercion.
    pub fn convert_to_storage(&self, metric: &ParsedMetric) -> Option<StorageAmount> {
        if metric.unit != self.base_unit {
            return None;
        }
        let amount = units::from_base(metric.value, metric.unit, &self.stock_unit)?;
        Some(StorageAmount {
            amount,
            unit: self.stock_unit.clone(),
        })
    }
}

/// Decide how an item is tracked. First match wins; explicit pricing
/// signals outrank unit-token fallbacks.
pub fn resolve(item: &InventoryItem) -> DeductionStrategy {
    let (kind, stock_field, stock_unit) = classify(item);
    let base_unit = match kind {
        StrategyKind::Weight => BaseUnit::Grams,
        StrategyKind::Volume => BaseUnit::Milliliters,
        StrategyKind::Count => BaseUnit::Each,
    };
    DeductionStrategy {
        has_case: detect_case(item),
        weight_per_case: derive_weight_per_case(item, &stock_unit),
        kind,
        stock_field,
        stock_unit,
        base_unit,
    }
}

fn classify(item: &InventoryItem) -> (StrategyKind, StockField, String) {
    let pricing = item.pricing_type.as_deref();

    // 1. Volume signals
    if positive(item.price_per_ml) || positive(item.volume_per_pc) || pricing == Some("volume") {
        let unit = item.stock_weight_unit.clone().unwrap_or_else(|| "ml".to_string());
        return (StrategyKind::Volume, StockField::Weight, unit);
    }
    // 2. Weight signals
    if positive(item.price_per_g) || positive(item.weight_per_unit) || pricing == Some("weight") {
        let unit = item.stock_weight_unit.clone().unwrap_or_else(|| "lb".to_string());
        return (StrategyKind::Weight, StockField::Weight, unit);
    }
    // 3. Count signals
    if positive(item.price_per_unit) || pricing == Some("unit") {
        return (StrategyKind::Count, StockField::Quantity, "ea".to_string());
    }
    // 4. Storage-unit token fallback
    if let Some(unit) = &item.stock_weight_unit {
        let kind = if units::is_volume_token(unit) {
            StrategyKind::Volume
        } else {
            StrategyKind::Weight
        };
        return (kind, StockField::Weight, unit.clone());
    }
    // 5. Legacy count-field token fallback
    if let Some(unit) = &item.stock_quantity_unit {
        let kind = if units::is_volume_token(unit) {
            StrategyKind::Volume
        } else {
            StrategyKind::Weight
        };
        return (kind, StockField::Quantity, unit.clone());
    }
    // 6. Count default
    (StrategyKind::Count, StockField::Quantity, "ea".to_string())
}

/// Case tracking needs non-negative continuous stock plus any source a
/// threshold could be derived from.
fn detect_case(item: &InventoryItem) -> bool {
    if item.stock_weight < Decimal::ZERO {
        return false;
    }
    positive(item.weight_per_unit)
        || (positive(item.purchase_qty) && item.purchase_unit.is_some())
        || (positive(item.units_per_case)
            && positive(item.unit_size)
            && item.unit_size_unit.is_some())
        || positive(item.volume_per_pc)
        || (item.stock_weight > Decimal::ZERO && item.stock_quantity > Decimal::ZERO)
}

/// Case size in storage units, from the first applicable source.
///
/// The final ratio fallback assumes the current weight/quantity ratio is
/// already in storage units; legacy rows predate the explicit
/// case-geometry fields. New data should set `units_per_case` +
/// `unit_size` instead.
fn derive_weight_per_case(item: &InventoryItem, stock_unit: &str) -> Option<Decimal> {
    if let Some(v) = item.volume_per_pc.filter(|v| *v > Decimal::ZERO) {
        return Some(v);
    }
    if let Some(w) = item.weight_per_unit.filter(|w| *w > Decimal::ZERO) {
        return Some(w);
    }
    if let (Some(qty), Some(unit)) = (item.purchase_qty, item.purchase_unit.as_deref()) {
        if qty > Decimal::ZERO {
            if let Some(amount) = convert_token_amount(qty, unit, stock_unit) {
                return Some(amount);
            }
        }
    }
    if let (Some(count), Some(size), Some(size_unit)) =
        (item.units_per_case, item.unit_size, item.unit_size_unit.as_deref())
    {
        if count > Decimal::ZERO && size > Decimal::ZERO {
            if let Some(amount) = convert_token_amount(count * size, size_unit, stock_unit) {
                return Some(amount);
            }
        }
    }
    if item.stock_weight > Decimal::ZERO && item.stock_quantity > Decimal::ZERO {
        return Some(item.stock_weight / item.stock_quantity);
    }
    None
}

fn convert_token_amount(amount: Decimal, from_token: &str, to_token: &str) -> Option<Decimal> {
    let (value, base) = units::to_base(amount, from_token)?;
    units::from_base(value, base, to_token)
}

fn positive(value: Option<Decimal>) -> bool {
    value.map_or(false, |v| v > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item() -> InventoryItem {
        InventoryItem::new("Test item")
    }

    // ========================================================================
    // Decision order
    // ========================================================================

    #[test]
    fn test_price_per_ml_wins() {
        let mut it = item();
        it.price_per_ml = Some(dec("0.02"));
        it.stock_weight_unit = Some("l".to_string());
        let s = resolve(&it);
        assert_eq!(s.kind, StrategyKind::Volume);
        assert_eq!(s.stock_field, StockField::Weight);
        assert_eq!(s.stock_unit, "l");
        assert_eq!(s.base_unit, BaseUnit::Milliliters);
    }

    #[test]
    fn test_volume_default_unit_is_ml() {
        let mut it = item();
        it.pricing_type = Some("volume".to_string());
        assert_eq!(resolve(&it).stock_unit, "ml");
    }

    #[test]
    fn test_volume_signal_outranks_weight_signal() {
        let mut it = item();
        it.price_per_ml = Some(dec("0.02"));
        it.price_per_g = Some(dec("0.01"));
        assert_eq!(resolve(&it).kind, StrategyKind::Volume);
    }

    #[test]
    fn test_price_per_g_gives_weight() {
        let mut it = item();
        it.price_per_g = Some(dec("0.03"));
        it.stock_weight_unit = Some("kg".to_string());
        let s = resolve(&it);
        assert_eq!(s.kind, StrategyKind::Weight);
        assert_eq!(s.stock_unit, "kg");
        assert_eq!(s.base_unit, BaseUnit::Grams);
    }

    #[test]
    fn test_weight_default_unit_is_lb() {
        let mut it = item();
        it.pricing_type = Some("weight".to_string());
        assert_eq!(resolve(&it).stock_unit, "lb");
    }

    #[test]
    fn test_price_per_unit_gives_count() {
        let mut it = item();
        it.price_per_unit = Some(dec("1.25"));
        let s = resolve(&it);
        assert_eq!(s.kind, StrategyKind::Count);
        assert_eq!(s.stock_field, StockField::Quantity);
        assert_eq!(s.stock_unit, "ea");
    }

    #[test]
    fn test_zero_price_is_not_a_signal() {
        let mut it = item();
        it.price_per_ml = Some(Decimal::ZERO);
        it.price_per_g = Some(Decimal::ZERO);
        it.price_per_unit = Some(Decimal::ZERO);
        assert_eq!(resolve(&it).kind, StrategyKind::Count);
    }

    #[test]
    fn test_weight_unit_token_fallback() {
        let mut it = item();
        it.stock_weight_unit = Some("ml".to_string());
        assert_eq!(resolve(&it).kind, StrategyKind::Volume);

        let mut it = item();
        it.stock_weight_unit = Some("kg".to_string());
        let s = resolve(&it);
        assert_eq!(s.kind, StrategyKind::Weight);
        assert_eq!(s.stock_field, StockField::Weight);
    }

    #[test]
    fn test_legacy_quantity_unit_fallback_keeps_quantity_field() {
        let mut it = item();
        it.stock_quantity_unit = Some("l".to_string());
        let s = resolve(&it);
        assert_eq!(s.kind, StrategyKind::Volume);
        assert_eq!(s.stock_field, StockField::Quantity);
        assert_eq!(s.stock_unit, "l");
    }

    #[test]
    fn test_bare_item_defaults_to_count() {
        let s = resolve(&item());
        assert_eq!(s.kind, StrategyKind::Count);
        assert_eq!(s.stock_field, StockField::Quantity);
        assert_eq!(s.stock_unit, "ea");
        assert!(!s.has_case);
        assert!(s.weight_per_case.is_none());
    }

    // ========================================================================
    // Case detection and threshold derivation
    // ========================================================================

    #[test]
    fn test_volume_per_pc_is_direct_threshold() {
        let mut it = item();
        it.price_per_ml = Some(dec("0.05"));
        it.stock_weight_unit = Some("ml".to_string());
        it.volume_per_pc = Some(dec("150"));
        it.stock_weight = dec("600");
        it.stock_quantity = dec("4");
        let s = resolve(&it);
        assert!(s.has_case);
        assert_eq!(s.weight_per_case, Some(dec("150")));
        assert_eq!(s.case_threshold(), Some(dec("150")));
    }

    #[test]
    fn test_weight_per_unit_is_direct_threshold() {
        let mut it = item();
        it.price_per_g = Some(dec("0.01"));
        it.stock_weight_unit = Some("lb".to_string());
        it.weight_per_unit = Some(dec("50"));
        let s = resolve(&it);
        assert!(s.has_case);
        assert_eq!(s.weight_per_case, Some(dec("50")));
    }

    #[test]
    fn test_purchase_fields_convert_to_storage_units() {
        // Purchased as 10 kg, stock kept in pounds
        let mut it = item();
        it.pricing_type = Some("weight".to_string());
        it.stock_weight_unit = Some("lb".to_string());
        it.purchase_qty = Some(dec("10"));
        it.purchase_unit = Some("kg".to_string());
        let s = resolve(&it);
        assert!(s.has_case);
        let threshold = s.weight_per_case.unwrap();
        assert!((threshold - dec("22.0462")).abs() < dec("0.001"));
    }

    #[test]
    fn test_case_geometry_product() {
        // 24 bottles x 330 ml, stock kept in liters
        let mut it = item();
        it.pricing_type = Some("volume".to_string());
        it.stock_weight_unit = Some("l".to_string());
        it.units_per_case = Some(dec("24"));
        it.unit_size = Some(dec("330"));
        it.unit_size_unit = Some("ml".to_string());
        let s = resolve(&it);
        assert_eq!(s.weight_per_case, Some(dec("7.92")));
    }

    #[test]
    fn test_ratio_fallback() {
        let mut it = item();
        it.pricing_type = Some("weight".to_string());
        it.stock_weight_unit = Some("lb".to_string());
        it.stock_weight = dec("100");
        it.stock_quantity = dec("4");
        let s = resolve(&it);
        assert!(s.has_case);
        assert_eq!(s.weight_per_case, Some(dec("25")));
    }

    #[test]
    fn test_negative_stock_disables_case() {
        let mut it = item();
        it.pricing_type = Some("volume".to_string());
        it.volume_per_pc = Some(dec("150"));
        it.stock_weight = dec("-10");
        assert!(!resolve(&it).has_case);
    }

    #[test]
    fn test_no_case_sources_means_no_threshold() {
        let mut it = item();
        it.pricing_type = Some("weight".to_string());
        it.stock_weight = dec("80");
        // quantity zero: ratio source unavailable
        let s = resolve(&it);
        assert!(!s.has_case);
        assert!(s.weight_per_case.is_none());
        assert_eq!(s.case_threshold(), None);
    }

    // ========================================================================
    // Effective stock and conversion
    // ========================================================================

    #[test]
    fn test_effective_fields_follow_strategy() {
        let mut it = item();
        it.pricing_type = Some("weight".to_string());
        it.stock_weight = dec("12");
        it.stock_quantity = dec("3");
        it.par_weight = Some(dec("40"));
        it.par_quantity = Some(dec("10"));
        let s = resolve(&it);
        assert_eq!(s.effective_stock(&it), dec("12"));
        assert_eq!(s.effective_par(&it), Some(dec("40")));

        let mut it = item();
        it.price_per_unit = Some(dec("2"));
        it.stock_quantity = dec("7");
        it.par_quantity = Some(dec("20"));
        let s = resolve(&it);
        assert_eq!(s.effective_stock(&it), dec("7"));
        assert_eq!(s.effective_par(&it), Some(dec("20")));
    }

    #[test]
    fn test_convert_to_storage() {
        let mut it = item();
        it.price_per_g = Some(dec("0.01"));
        it.stock_weight_unit = Some("lb".to_string());
        let s = resolve(&it);

        let metric = crate::units::parse_metric("500g").unwrap();
        let storage = s.convert_to_storage(&metric).unwrap();
        assert_eq!(storage.unit, "lb");
        assert!((storage.amount - dec("1.1023")).abs() < dec("0.0001"));
    }

    #[test]
    fn test_convert_rejects_dimension_mismatch() {
        let mut it = item();
        it.pricing_type = Some("volume".to_string());
        let s = resolve(&it);
        let metric = crate::units::parse_metric("500g").unwrap();
        assert!(s.convert_to_storage(&metric).is_none());
    }
}
