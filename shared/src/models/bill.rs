//! Purchase bill models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BillLineItem;

/// Lifecycle status of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Draft,
    Open,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Draft => "draft",
            BillStatus::Open => "open",
            BillStatus::Paid => "paid",
            BillStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BillStatus::Draft),
            "open" => Some(BillStatus::Open),
            "paid" => Some(BillStatus::Paid),
            "cancelled" => Some(BillStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BillStatus::Paid | BillStatus::Cancelled)
    }

    /// Whether stock and payables currently reflect this bill
    pub fn holds_ledger_effects(&self) -> bool {
        matches!(self, BillStatus::Open | BillStatus::Paid)
    }

    /// Edges of the bill state graph (same-state edits included)
    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        use BillStatus::*;
        matches!(
            (self, next),
            (Draft, Draft) | (Draft, Open) | (Open, Open) | (Open, Draft) | (Open, Paid) | (Open, Cancelled)
        )
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a bill came from; decides who owns the stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Direct,
    FromPo,
    FromReceive,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Direct => "direct",
            SourceType::FromPo => "from_po",
            SourceType::FromReceive => "from_receive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(SourceType::Direct),
            "from_po" => Some(SourceType::FromPo),
            "from_receive" => Some(SourceType::FromReceive),
            _ => None,
        }
    }

    /// Upstream-derived bills never move stock; the PO/receive already did
    pub fn moves_stock(&self) -> bool {
        matches!(self, SourceType::Direct)
    }
}

/// A vendor bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    /// Owner; bill numbers are unique per user
    pub user_id: Uuid,
    pub bill_number: String,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub items: Vec<BillLineItem>,
    pub status: BillStatus,
    pub source_type: SourceType,
    pub warehouse: String,
    pub final_total: Decimal,
    pub purchase_order_id: Option<Uuid>,
    pub purchase_receive_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
