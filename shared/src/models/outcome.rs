//! Results of document transitions: shortfalls and non-fatal warnings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Requested quantity that a warehouse cannot cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockShortfall {
    pub item: String,
    pub warehouse: String,
    pub available: Decimal,
    pub requested: Decimal,
    pub shortfall: Decimal,
}

impl StockShortfall {
    pub fn new(
        item: impl Into<String>,
        warehouse: impl Into<String>,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        Self {
            item: item.into(),
            warehouse: warehouse.into(),
            available,
            requested,
            shortfall: (requested - available).max(Decimal::ZERO),
        }
    }
}

/// Category of a side effect that failed without aborting the transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    ItemNotFound,
    InsufficientStock,
    StockUpdate,
    VendorBalance,
    SecondaryStoreWrite,
    UnmatchedLine,
}

/// A non-fatal failure reported next to a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationWarning {
    pub kind: WarningKind,
    /// Item, vendor or document the warning is about
    pub reference: String,
    pub message: String,
}

impl OperationWarning {
    pub fn new(kind: WarningKind, reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// A persisted document plus every inventory/balance side effect that failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome<T> {
    #[serde(flatten)]
    pub document: T,
    pub warnings: Vec<OperationWarning>,
}

impl<T> DocumentOutcome<T> {
    pub fn new(document: T, warnings: Vec<OperationWarning>) -> Self {
        Self { document, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}
