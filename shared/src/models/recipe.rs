//! Recipe and task input contracts for stock deduction
//!
//! These mirror what the recipe module hands over when a production task
//! completes; the deduction orchestrator consumes them read-only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingredient line of a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeLine {
    pub name: String,
    /// Free-text quantity as typed by the chef (e.g., "300g", "1,5 l")
    pub metric: String,
    pub linked_ingredient_id: Option<Uuid>,
    /// Section headers structure the recipe; they carry no quantity
    #[serde(default)]
    pub is_section: bool,
}

/// One packaging line of a recipe; packaging is always count-tracked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingLine {
    pub linked_package_id: Option<Uuid>,
    pub unit: Option<String>,
    /// Packaging units consumed per portion produced
    #[serde(default = "default_per_portion")]
    pub quantity_per_portion: Decimal,
}

fn default_per_portion() -> Decimal {
    Decimal::ONE
}

/// A production task that consumes a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    pub id: Uuid,
    pub portions: Decimal,
    /// Extra multiplier on top of the portion ratio
    #[serde(default = "default_scale_factor")]
    pub scale_factor: Decimal,
}

fn default_scale_factor() -> Decimal {
    Decimal::ONE
}

/// A recipe presented for deduction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeContext {
    pub id: Option<Uuid>,
    pub name: String,
    pub base_portions: Decimal,
    #[serde(default)]
    pub ingredients: Vec<RecipeLine>,
    #[serde(default)]
    pub packaging: Vec<PackagingLine>,
}
