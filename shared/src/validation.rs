//! Validation utilities for KitchenCommand
//!
//! Field-level checks shared by the API layer and the stock services.
//! Includes Québec-specific checks for supplier invoice references.

use rust_decimal::Decimal;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate an item or recipe display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.len() > 200 {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

/// Validate a stock-keeping unit code (3-32 chars, alphanumeric plus dashes)
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.len() < 3 {
        return Err("SKU must be at least 3 characters");
    }
    if sku.len() > 32 {
        return Err("SKU must be at most 32 characters");
    }
    if !sku.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("SKU must be alphanumeric with optional dashes");
    }
    Ok(())
}

/// Adjustments and corrections must say why
pub fn validate_reason(reason: &str) -> Result<(), &'static str> {
    if reason.trim().is_empty() {
        return Err("Reason cannot be empty");
    }
    if reason.len() > 500 {
        return Err("Reason must be at most 500 characters");
    }
    Ok(())
}

/// Quantities entering the engine must be strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Stock targets and prices may be zero but never negative
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Procurement Validations
// ============================================================================

/// Validate an order number format: PO-YYYY-NNNN
pub fn validate_order_number(number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = number.split('-').collect();

    if parts.len() != 3 {
        return Err("Order number must be in format PO-YYYY-NNNN");
    }
    if parts[0] != "PO" {
        return Err("Order number must start with 'PO'");
    }
    if parts[1].len() != 4 || !parts[1].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid year in order number");
    }
    if parts[2].len() < 4 || !parts[2].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid sequence number in order number");
    }
    Ok(())
}

/// Unit price sanity check for order lines
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    if price > Decimal::from(1_000_000) {
        return Err("Unit price exceeds maximum");
    }
    Ok(())
}

/// Validate a vendor name
pub fn validate_vendor(vendor: &str) -> Result<(), &'static str> {
    let trimmed = vendor.trim();
    if trimmed.is_empty() {
        return Err("Vendor cannot be empty");
    }
    if trimmed.len() > 120 {
        return Err("Vendor must be at most 120 characters");
    }
    Ok(())
}

/// Validate a Québec supplier invoice number
/// Accepts alphanumeric references with dashes/slashes, 3-40 chars
/// (e.g., "NOR-48213", "DB/2025/0117")
pub fn validate_invoice_reference(reference: &str) -> Result<(), &'static str> {
    if reference.len() < 3 {
        return Err("Invoice reference must be at least 3 characters");
    }
    if reference.len() > 40 {
        return Err("Invoice reference must be at most 40 characters");
    }
    if !reference
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
    {
        return Err("Invoice reference contains invalid characters");
    }
    Ok(())
}
