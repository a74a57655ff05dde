//! Recipe deduction orchestrator
//!
//! Walks a recipe when a production task completes and deducts every
//! linked line through the engine. One bad line never aborts the batch:
//! each line lands in the report as skipped, failed, or success, and the
//! kitchen reviews failures instead of losing the whole deduction.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::{RecipeContext, ReferenceType, StockReference, TaskContext};
use shared::strategy;
use shared::units::{self, ParsedMetric};

use crate::error::{AppError, AppResult};
use crate::services::engine::{DeductOptions, EngineService, StockWarning};
use crate::store::Store;

#[derive(Clone)]
pub struct DeductionService {
    store: Arc<dyn Store>,
    engine: EngineService,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeductForTaskInput {
    pub task: TaskContext,
    pub recipe: RecipeContext,
    pub performed_by: Option<String>,
}

/// Fate of one recipe line
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineOutcome {
    /// Line was never a deduction candidate
    Skipped { name: String, reason: String },
    /// Line should have deducted but could not
    Failed { name: String, error: String },
    Success {
        name: String,
        item_id: Uuid,
        amount: Decimal,
        unit: String,
        stock_before: Decimal,
        stock_after: Decimal,
        case_opened: bool,
    },
}

/// Full account of one task deduction
#[derive(Debug, Serialize)]
pub struct DeductionReport {
    pub task_id: Uuid,
    pub recipe: String,
    pub scale: Decimal,
    pub total_lines: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub lines: Vec<LineOutcome>,
    pub warnings: Vec<StockWarning>,
}

impl DeductionService {
    pub fn new(store: Arc<dyn Store>, engine: EngineService) -> Self {
        Self { store, engine }
    }

    /// Deduct every line of a recipe for a completed task
    pub async fn deduct_for_task(&self, input: DeductForTaskInput) -> AppResult<DeductionReport> {
        if input.recipe.base_portions <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "base_portions".to_string(),
                message: "Recipe base portions must be greater than zero".to_string(),
                message_fr: "Les portions de base de la recette doivent être supérieures à zéro"
                    .to_string(),
            });
        }
        if input.task.portions <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "portions".to_string(),
                message: "Task portions must be greater than zero".to_string(),
                message_fr: "Les portions de la tâche doivent être supérieures à zéro"
                    .to_string(),
            });
        }

        let scale = input.task.portions / input.recipe.base_portions * input.task.scale_factor;
        let task_reference = StockReference {
            reference_type: ReferenceType::Task,
            reference_id: input.task.id,
        };

        let mut lines = Vec::new();
        let mut warnings = Vec::new();

        for line in &input.recipe.ingredients {
            let outcome = self
                .deduct_ingredient(line, scale, task_reference, &input.performed_by, &mut warnings)
                .await?;
            lines.push(outcome);
        }

        for line in &input.recipe.packaging {
            let outcome = self
                .deduct_packaging(
                    line,
                    &input.task,
                    task_reference,
                    &input.performed_by,
                    &mut warnings,
                )
                .await?;
            lines.push(outcome);
        }

        let succeeded = lines
            .iter()
            .filter(|l| matches!(l, LineOutcome::Success { .. }))
            .count();
        let failed = lines
            .iter()
            .filter(|l| matches!(l, LineOutcome::Failed { .. }))
            .count();
        let skipped = lines
            .iter()
            .filter(|l| matches!(l, LineOutcome::Skipped { .. }))
            .count();

        tracing::info!(
            task_id = %input.task.id,
            recipe = %input.recipe.name,
            succeeded,
            failed,
            skipped,
            "task deduction complete"
        );

        Ok(DeductionReport {
            task_id: input.task.id,
            recipe: input.recipe.name.clone(),
            scale,
            total_lines: lines.len(),
            succeeded,
            failed,
            skipped,
            lines,
            warnings,
        })
    }

    async fn deduct_ingredient(
        &self,
        line: &shared::models::RecipeLine,
        scale: Decimal,
        reference: StockReference,
        performed_by: &Option<String>,
        warnings: &mut Vec<StockWarning>,
    ) -> AppResult<LineOutcome> {
        if line.is_section {
            return Ok(LineOutcome::Skipped {
                name: line.name.clone(),
                reason: "section header".to_string(),
            });
        }
        let item_id = match line.linked_ingredient_id {
            Some(id) => id,
            None => {
                return Ok(LineOutcome::Skipped {
                    name: line.name.clone(),
                    reason: "not linked to inventory".to_string(),
                })
            }
        };
        let metric = match units::parse_metric(&line.metric) {
            Some(metric) => metric,
            None => {
                return Ok(LineOutcome::Failed {
                    name: line.name.clone(),
                    error: format!("unparsable metric '{}'", line.metric),
                })
            }
        };

        let item = match self.store.get_item(item_id).await? {
            Some(item) => item,
            None => {
                return Ok(LineOutcome::Failed {
                    name: line.name.clone(),
                    error: "linked item not found".to_string(),
                })
            }
        };

        let strategy = strategy::resolve(&item);
        let scaled = ParsedMetric {
            value: metric.value * scale,
            unit: metric.unit,
            original: metric.original.clone(),
        };
        let storage = match strategy.convert_to_storage(&scaled) {
            Some(storage) => storage,
            None => {
                // Dimension clash between the recipe metric and how the
                // item tracks stock, or an unconvertible storage token
                let error = if units::unit_dimension(&strategy.stock_unit).is_none() {
                    AppError::StrategyUnresolved(format!(
                        "storage unit '{}' of {} is not convertible",
                        strategy.stock_unit, item.name
                    ))
                } else {
                    AppError::UnitMismatch {
                        item: item.name.clone(),
                        from: metric.original.clone(),
                        to: strategy.stock_unit.clone(),
                    }
                };
                return Ok(LineOutcome::Failed {
                    name: line.name.clone(),
                    error: error.to_string(),
                });
            }
        };

        match self
            .engine
            .deduct_for_usage(
                item_id,
                storage.amount,
                Some(reference),
                DeductOptions {
                    allow_negative: false,
                    performed_by: performed_by.clone(),
                },
            )
            .await
        {
            Ok(outcome) => {
                warnings.extend(outcome.warnings.iter().cloned());
                Ok(LineOutcome::Success {
                    name: line.name.clone(),
                    item_id,
                    amount: storage.amount,
                    unit: outcome.unit.clone(),
                    stock_before: outcome.stock_before,
                    stock_after: outcome.stock_after,
                    case_opened: outcome.case_opened,
                })
            }
            Err(e) => Ok(LineOutcome::Failed {
                name: line.name.clone(),
                error: e.to_string(),
            }),
        }
    }

    async fn deduct_packaging(
        &self,
        line: &shared::models::PackagingLine,
        task: &TaskContext,
        reference: StockReference,
        performed_by: &Option<String>,
        warnings: &mut Vec<StockWarning>,
    ) -> AppResult<LineOutcome> {
        let item_id = match line.linked_package_id {
            Some(id) => id,
            None => {
                return Ok(LineOutcome::Skipped {
                    name: "packaging".to_string(),
                    reason: "not linked to inventory".to_string(),
                })
            }
        };

        let item = match self.store.get_item(item_id).await? {
            Some(item) => item,
            None => {
                return Ok(LineOutcome::Failed {
                    name: "packaging".to_string(),
                    error: "linked package not found".to_string(),
                })
            }
        };

        let quantity = task.portions * line.quantity_per_portion;
        if quantity <= Decimal::ZERO {
            return Ok(LineOutcome::Skipped {
                name: item.name.clone(),
                reason: "zero quantity".to_string(),
            });
        }

        // Packaging counts drift between counts; going negative is
        // tolerated and corrected at the next count
        match self
            .engine
            .deduct_for_usage(
                item_id,
                quantity,
                Some(reference),
                DeductOptions {
                    allow_negative: true,
                    performed_by: performed_by.clone(),
                },
            )
            .await
        {
            Ok(outcome) => {
                warnings.extend(outcome.warnings.iter().cloned());
                Ok(LineOutcome::Success {
                    name: item.name.clone(),
                    item_id,
                    amount: quantity,
                    unit: outcome.unit.clone(),
                    stock_before: outcome.stock_before,
                    stock_after: outcome.stock_after,
                    case_opened: outcome.case_opened,
                })
            }
            Err(e) => Ok(LineOutcome::Failed {
                name: item.name.clone(),
                error: e.to_string(),
            }),
        }
    }
}
