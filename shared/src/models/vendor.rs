//! Vendors, payables and vendor credits

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BillLineItem;

/// A supplier with an outstanding payable balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub display_name: String,
    /// Never negative; subtraction is floored at zero
    pub payables: Decimal,
}

/// Direction of a payables adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayablesOp {
    Add,
    Subtract,
}

impl PayablesOp {
    /// Apply to a balance, flooring at zero on subtraction
    pub fn apply(&self, balance: Decimal, amount: Decimal) -> Decimal {
        match self {
            PayablesOp::Add => balance + amount,
            PayablesOp::Subtract => (balance - amount).max(Decimal::ZERO),
        }
    }

    /// Pick the op for a signed change, returning the magnitude
    pub fn for_change(change: Decimal) -> (Self, Decimal) {
        if change.is_sign_negative() {
            (PayablesOp::Subtract, -change)
        } else {
            (PayablesOp::Add, change)
        }
    }
}

/// Lifecycle status of a vendor credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorCreditStatus {
    Draft,
    Open,
    Closed,
    Cancelled,
}

impl VendorCreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorCreditStatus::Draft => "draft",
            VendorCreditStatus::Open => "open",
            VendorCreditStatus::Closed => "closed",
            VendorCreditStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(VendorCreditStatus::Draft),
            "open" => Some(VendorCreditStatus::Open),
            "closed" => Some(VendorCreditStatus::Closed),
            "cancelled" => Some(VendorCreditStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VendorCreditStatus::Closed | VendorCreditStatus::Cancelled)
    }

    pub fn holds_ledger_effects(&self) -> bool {
        matches!(self, VendorCreditStatus::Open | VendorCreditStatus::Closed)
    }

    pub fn can_transition_to(&self, next: VendorCreditStatus) -> bool {
        use VendorCreditStatus::*;
        matches!(
            (self, next),
            (Draft, Draft) | (Draft, Open) | (Open, Open) | (Open, Draft) | (Open, Closed) | (Open, Cancelled)
        )
    }
}

impl std::fmt::Display for VendorCreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goods returned to a vendor; the inverse of a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorCredit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub credit_number: String,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub items: Vec<BillLineItem>,
    pub status: VendorCreditStatus,
    pub warehouse: String,
    pub final_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
