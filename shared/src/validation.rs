//! Validation utilities for the Branch Inventory Platform
//!
//! Required-field checks run before any side effect is attempted.

use rust_decimal::Decimal;

use crate::models::{BillLineItem, StoreOrderLine};

// ============================================================================
// Document Validations
// ============================================================================

/// Validate a user-entered document number (bill or credit number)
pub fn validate_document_number(number: &str) -> Result<(), &'static str> {
    let number = number.trim();
    if number.is_empty() {
        return Err("Document number is required");
    }
    if number.len() > 64 {
        return Err("Document number must be at most 64 characters");
    }
    Ok(())
}

/// Validate vendor display name on a document
pub fn validate_vendor_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Vendor name is required");
    }
    Ok(())
}

/// Validate a warehouse name before resolution
pub fn validate_warehouse_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Warehouse is required");
    }
    Ok(())
}

/// Validate bill/credit lines: at least one, non-negative, identifiable
pub fn validate_line_items(items: &[BillLineItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("At least one line item is required");
    }
    for item in items {
        if item.quantity < Decimal::ZERO {
            return Err("Line quantity cannot be negative");
        }
        if item.rate < Decimal::ZERO {
            return Err("Line rate cannot be negative");
        }
        let has_id = item
            .item_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !has_id && item.item_group_id.is_none() && item.item_name.trim().is_empty() {
            return Err("Each line needs an item id, item group id or item name");
        }
    }
    Ok(())
}

// ============================================================================
// Store Order Validations
// ============================================================================

/// Validate store order lines: at least one positive quantity
pub fn validate_order_lines(items: &[StoreOrderLine]) -> Result<(), &'static str> {
    if items.iter().any(|item| item.quantity < Decimal::ZERO) {
        return Err("Requested quantity cannot be negative");
    }
    if !items.iter().any(|item| item.quantity > Decimal::ZERO) {
        return Err("At least one line must request a positive quantity");
    }
    if items.iter().any(|item| {
        item.item_name.trim().is_empty()
            && item.item_sku.as_deref().map_or(true, |s| s.trim().is_empty())
            && item.item_id.as_deref().map_or(true, |s| s.trim().is_empty())
    }) {
        return Err("Each line needs an item id, name or SKU");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: i64) -> BillLineItem {
        BillLineItem {
            item_name: name.to_string(),
            quantity: Decimal::from(quantity),
            rate: Decimal::from(10),
            ..Default::default()
        }
    }

    fn order_line(sku: &str, quantity: i64) -> StoreOrderLine {
        StoreOrderLine {
            item_id: None,
            item_group_id: None,
            item_name: String::new(),
            item_sku: Some(sku.to_string()),
            quantity: Decimal::from(quantity),
            current_stock: Decimal::ZERO,
        }
    }

    #[test]
    fn test_validate_document_number() {
        assert!(validate_document_number("BILL-001").is_ok());
        assert!(validate_document_number("   ").is_err());
        assert!(validate_document_number(&"9".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_vendor_name() {
        assert!(validate_vendor_name("Kerala Traders").is_ok());
        assert!(validate_vendor_name("").is_err());
    }

    #[test]
    fn test_validate_line_items_valid() {
        assert!(validate_line_items(&[line("Sugar 1kg", 5)]).is_ok());
        // Zero-quantity lines are allowed; they just move no stock
        assert!(validate_line_items(&[line("Sugar 1kg", 0)]).is_ok());
    }

    #[test]
    fn test_validate_line_items_invalid() {
        assert!(validate_line_items(&[]).is_err());
        assert!(validate_line_items(&[line("Sugar 1kg", -1)]).is_err());
        assert!(validate_line_items(&[line("  ", 1)]).is_err());
    }

    #[test]
    fn test_validate_order_lines() {
        assert!(validate_order_lines(&[order_line("X1", 10)]).is_ok());
        assert!(validate_order_lines(&[order_line("X1", 0)]).is_err());
        assert!(validate_order_lines(&[]).is_err());
        assert!(validate_order_lines(&[order_line("", 3)]).is_err());
    }
}
