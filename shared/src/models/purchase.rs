//! Upstream purchase documents consumed when deriving bills

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{same_text, BillLineItem};

/// A purchase order line as ordered (quantities may differ from receipt)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub item_id: Option<String>,
    pub item_group_id: Option<Uuid>,
    pub item_name: String,
    pub item_sku: Option<String>,
    pub quantity: Decimal,
    pub rate: Decimal,
    #[serde(default)]
    pub cgst_percent: Decimal,
    #[serde(default)]
    pub sgst_percent: Decimal,
    #[serde(default)]
    pub igst_percent: Decimal,
    /// Amounts as stored upstream; never trusted for billing
    #[serde(default)]
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub purchase_order_number: String,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub warehouse: String,
    pub items: Vec<PurchaseOrderLine>,
}

/// A received quantity against a purchase order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceivedLine {
    pub item_id: Option<String>,
    pub item_group_id: Option<Uuid>,
    pub item_name: String,
    pub item_sku: Option<String>,
    pub received_quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceive {
    pub id: Uuid,
    pub receive_number: String,
    pub purchase_order_id: Uuid,
    pub warehouse: Option<String>,
    pub items: Vec<ReceivedLine>,
}

/// Find the PO line a received line came from.
///
/// Tried in order: item id, name, SKU, then group id plus name.
pub fn match_order_line<'a>(
    received: &ReceivedLine,
    order_lines: &'a [PurchaseOrderLine],
) -> Option<&'a PurchaseOrderLine> {
    let by_id = || {
        let id = received.item_id.as_deref().filter(|id| !id.trim().is_empty())?;
        order_lines
            .iter()
            .find(|line| line.item_id.as_deref().map(str::trim) == Some(id.trim()))
    };
    let by_name = || {
        order_lines
            .iter()
            .find(|line| same_text(Some(&line.item_name), Some(&received.item_name)))
    };
    let by_sku = || {
        order_lines
            .iter()
            .find(|line| same_text(line.item_sku.as_deref(), received.item_sku.as_deref()))
    };
    let by_group = || {
        let group = received.item_group_id?;
        order_lines.iter().find(|line| {
            line.item_group_id == Some(group)
                && same_text(Some(&line.item_name), Some(&received.item_name))
        })
    };

    by_id().or_else(by_name).or_else(by_sku).or_else(by_group)
}

/// Price a bill line for `quantity` units using a PO line's rate and taxes
pub fn bill_line_from_order(
    order_line: &PurchaseOrderLine,
    identity: BillLineItem,
    quantity: Decimal,
) -> BillLineItem {
    let mut line = BillLineItem {
        quantity,
        rate: order_line.rate,
        cgst_percent: Some(order_line.cgst_percent),
        sgst_percent: Some(order_line.sgst_percent),
        igst_percent: Some(order_line.igst_percent),
        ..identity
    };
    line.reprice();
    line
}

impl PurchaseOrderLine {
    /// Identity fields only, as an unpriced bill line
    pub fn identity(&self) -> BillLineItem {
        BillLineItem {
            item_id: self.item_id.clone(),
            item_group_id: self.item_group_id,
            item_sku: self.item_sku.clone(),
            item_name: self.item_name.clone(),
            ..Default::default()
        }
    }
}

impl ReceivedLine {
    pub fn identity(&self) -> BillLineItem {
        BillLineItem {
            item_id: self.item_id.clone(),
            item_group_id: self.item_group_id,
            item_sku: self.item_sku.clone(),
            item_name: self.item_name.clone(),
            ..Default::default()
        }
    }
}
