//! Metric parsing and unit conversion
//!
//! Recipes carry free-text quantities ("300g", "1,5 l", "2 pcs"). This
//! module normalizes them into one of three base units — grams,
//! milliliters, each — and projects base amounts into an item's declared
//! storage unit (e.g., grams into pounds).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical unit for conversion arithmetic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaseUnit {
    Grams,
    Milliliters,
    Each,
}

impl BaseUnit {
    pub fn is_weight(&self) -> bool {
        matches!(self, BaseUnit::Grams)
    }

    pub fn is_volume(&self) -> bool {
        matches!(self, BaseUnit::Milliliters)
    }

    pub fn is_count(&self) -> bool {
        matches!(self, BaseUnit::Each)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BaseUnit::Grams => "g",
            BaseUnit::Milliliters => "ml",
            BaseUnit::Each => "ea",
        }
    }
}

impl std::fmt::Display for BaseUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A parsed free-text metric, normalized to its base unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedMetric {
    /// Amount expressed in the base unit
    pub value: Decimal,
    pub unit: BaseUnit,
    /// Input as received, kept for error reporting
    pub original: String,
}

/// A base-unit amount projected into a storage unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageAmount {
    pub amount: Decimal,
    pub unit: String,
}

/// Dimension and to-base multiplier for a normalized unit token
fn unit_factor(token: &str) -> Option<(BaseUnit, Decimal)> {
    let entry = match token {
        "g" | "gr" => (BaseUnit::Grams, Decimal::ONE),
        "kg" => (BaseUnit::Grams, Decimal::from(1000)),
        // 1 lb = 453.592 g, 1 oz = 28.3495 g
        "lb" | "lbs" => (BaseUnit::Grams, Decimal::new(453_592, 3)),
        "oz" => (BaseUnit::Grams, Decimal::new(283_495, 4)),
        "ml" => (BaseUnit::Milliliters, Decimal::ONE),
        "l" => (BaseUnit::Milliliters, Decimal::from(1000)),
        "cl" => (BaseUnit::Milliliters, Decimal::from(10)),
        "dl" => (BaseUnit::Milliliters, Decimal::from(100)),
        "ea" | "pc" | "pcs" | "piece" | "pieces" | "unit" | "units" | "portion" | "portions" => {
            (BaseUnit::Each, Decimal::ONE)
        }
        _ => return None,
    };
    Some(entry)
}

/// Classify a unit token into its base dimension
pub fn unit_dimension(token: &str) -> Option<BaseUnit> {
    unit_factor(&token.trim().to_lowercase()).map(|(base, _)| base)
}

/// Volume tokens used by the strategy resolver's fallback rules
pub fn is_volume_token(token: &str) -> bool {
    matches!(token.trim().to_lowercase().as_str(), "l" | "ml" | "cl" | "dl")
}

/// Parse a free-text metric like "300g", "1.5kg" or "2 pcs".
///
/// Accepts a dot or comma decimal separator and an optional unit token;
/// a missing token defaults to grams. Returns `None` for empty or
/// non-numeric input, negative values, and unknown unit tokens.
pub fn parse_metric(text: &str) -> Option<ParsedMetric> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        let numeric = c.is_ascii_digit() || c == '.' || c == ',' || (i == 0 && c == '-');
        if !numeric {
            break;
        }
        end = i + c.len_utf8();
    }

    let (number_part, unit_part) = trimmed.split_at(end);
    if number_part.is_empty() || number_part == "-" {
        return None;
    }
    let value: Decimal = number_part.replace(',', ".").parse().ok()?;
    if value < Decimal::ZERO {
        return None;
    }

    let token = unit_part.trim().to_lowercase();
    let (unit, factor) = if token.is_empty() {
        (BaseUnit::Grams, Decimal::ONE)
    } else {
        unit_factor(&token)?
    };

    Some(ParsedMetric {
        value: value * factor,
        unit,
        original: trimmed.to_string(),
    })
}

/// Convert an amount expressed in `token` units into its base unit
pub fn to_base(amount: Decimal, token: &str) -> Option<(Decimal, BaseUnit)> {
    let (base, factor) = unit_factor(&token.trim().to_lowercase())?;
    Some((amount * factor, base))
}

/// Project a base-unit amount into a storage unit.
///
/// `None` when the storage token belongs to a different dimension; callers
/// treat that as a unit mismatch, never as a silent coercion.
pub fn from_base(amount: Decimal, base: BaseUnit, storage_token: &str) -> Option<Decimal> {
    let (storage_base, factor) = unit_factor(&storage_token.trim().to_lowercase())?;
    if storage_base != base {
        return None;
    }
    Some(amount / factor)
}
