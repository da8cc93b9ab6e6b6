//! Store orders and the transfer orders that fulfil them

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemRef;

/// Status of a branch's stock request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOrderStatus {
    Pending,
    Approved,
    Rejected,
    Transferred,
}

impl StoreOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOrderStatus::Pending => "pending",
            StoreOrderStatus::Approved => "approved",
            StoreOrderStatus::Rejected => "rejected",
            StoreOrderStatus::Transferred => "transferred",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(StoreOrderStatus::Pending),
            "approved" => Some(StoreOrderStatus::Approved),
            "rejected" => Some(StoreOrderStatus::Rejected),
            "transferred" => Some(StoreOrderStatus::Transferred),
            _ => None,
        }
    }

    pub fn can_decide(&self) -> bool {
        matches!(self, StoreOrderStatus::Pending)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, StoreOrderStatus::Pending | StoreOrderStatus::Rejected)
    }
}

impl std::fmt::Display for StoreOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested line of a store order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOrderLine {
    pub item_id: Option<String>,
    pub item_group_id: Option<Uuid>,
    pub item_name: String,
    pub item_sku: Option<String>,
    pub quantity: Decimal,
    /// Requesting store's stock when the order was raised
    #[serde(default)]
    pub current_stock: Decimal,
}

impl StoreOrderLine {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            item_id: self.item_id.clone().filter(|id| !id.trim().is_empty()),
            group_id: self.item_group_id,
            name: Some(self.item_name.clone()).filter(|n| !n.trim().is_empty()),
            sku: self.item_sku.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

/// A branch's request to draw stock from the central warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOrder {
    pub id: Uuid,
    pub order_number: String,
    pub store_warehouse: String,
    pub destination_warehouse: String,
    pub items: Vec<StoreOrderLine>,
    pub status: StoreOrderStatus,
    pub transfer_order_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a stock movement between warehouses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOrderStatus {
    Draft,
    InTransit,
    Transferred,
}

impl TransferOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOrderStatus::Draft => "draft",
            TransferOrderStatus::InTransit => "in_transit",
            TransferOrderStatus::Transferred => "transferred",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(TransferOrderStatus::Draft),
            "in_transit" => Some(TransferOrderStatus::InTransit),
            "transferred" => Some(TransferOrderStatus::Transferred),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransferOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a transfer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOrderLine {
    pub item_id: Option<String>,
    pub item_group_id: Option<Uuid>,
    pub item_name: String,
    pub item_sku: Option<String>,
    pub quantity: Decimal,
}

impl TransferOrderLine {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            item_id: self.item_id.clone().filter(|id| !id.trim().is_empty()),
            group_id: self.item_group_id,
            name: Some(self.item_name.clone()).filter(|n| !n.trim().is_empty()),
            sku: self.item_sku.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

impl From<&StoreOrderLine> for TransferOrderLine {
    fn from(line: &StoreOrderLine) -> Self {
        Self {
            item_id: line.item_id.clone(),
            item_group_id: line.item_group_id,
            item_name: line.item_name.clone(),
            item_sku: line.item_sku.clone(),
            quantity: line.quantity,
        }
    }
}

/// Fulfilment record moving stock from one warehouse to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOrder {
    pub id: Uuid,
    pub transfer_order_number: String,
    pub store_order_id: Option<Uuid>,
    pub source_warehouse: String,
    pub destination_warehouse: String,
    pub items: Vec<TransferOrderLine>,
    pub status: TransferOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
