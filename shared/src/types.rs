//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Stock level relative to the item's par target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    Critical,
    Low,
    Warning,
    Ok,
}

impl ThresholdStatus {
    /// Levels that should surface as an alert to the kitchen
    pub fn is_alert(&self) -> bool {
        matches!(self, ThresholdStatus::Critical | ThresholdStatus::Low)
    }
}

/// Percentage-of-par breakpoints for stock level classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdBreakpoints {
    pub critical_percent: Decimal,
    pub low_percent: Decimal,
    pub warning_percent: Decimal,
}

impl Default for ThresholdBreakpoints {
    fn default() -> Self {
        Self {
            critical_percent: Decimal::from(10),
            low_percent: Decimal::from(25),
            warning_percent: Decimal::from(50),
        }
    }
}

impl ThresholdBreakpoints {
    /// Classify current stock against a par target. Items without a
    /// positive par cannot be classified and report `Ok`.
    pub fn classify(&self, stock: Decimal, par: Option<Decimal>) -> ThresholdStatus {
        let par = match par {
            Some(p) if p > Decimal::ZERO => p,
            _ => return ThresholdStatus::Ok,
        };
        let percent = stock / par * Decimal::from(100);
        if percent < self.critical_percent {
            ThresholdStatus::Critical
        } else if percent < self.low_percent {
            ThresholdStatus::Low
        } else if percent < self.warning_percent {
            ThresholdStatus::Warning
        } else {
            ThresholdStatus::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_breakpoints() {
        let bp = ThresholdBreakpoints::default();
        let par = Some(Decimal::from(100));
        assert_eq!(bp.classify(Decimal::from(5), par), ThresholdStatus::Critical);
        assert_eq!(bp.classify(Decimal::from(15), par), ThresholdStatus::Low);
        assert_eq!(bp.classify(Decimal::from(40), par), ThresholdStatus::Warning);
        assert_eq!(bp.classify(Decimal::from(80), par), ThresholdStatus::Ok);
    }

    #[test]
    fn test_classify_boundaries_are_exclusive() {
        let bp = ThresholdBreakpoints::default();
        let par = Some(Decimal::from(100));
        assert_eq!(bp.classify(Decimal::from(10), par), ThresholdStatus::Low);
        assert_eq!(bp.classify(Decimal::from(25), par), ThresholdStatus::Warning);
        assert_eq!(bp.classify(Decimal::from(50), par), ThresholdStatus::Ok);
    }

    #[test]
    fn test_classify_without_par() {
        let bp = ThresholdBreakpoints::default();
        assert_eq!(bp.classify(Decimal::ZERO, None), ThresholdStatus::Ok);
        assert_eq!(bp.classify(Decimal::from(5), Some(Decimal::ZERO)), ThresholdStatus::Ok);
    }

    #[test]
    fn test_negative_stock_is_critical() {
        let bp = ThresholdBreakpoints::default();
        assert_eq!(
            bp.classify(Decimal::from(-3), Some(Decimal::from(100))),
            ThresholdStatus::Critical
        );
    }
}
