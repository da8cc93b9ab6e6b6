//! Items, item groups and per-warehouse stock records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock position of one item in one warehouse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseStockRecord {
    pub warehouse: String,
    #[serde(default)]
    pub opening_stock: Decimal,
    #[serde(default)]
    pub opening_stock_value: Decimal,
    #[serde(default)]
    pub stock_on_hand: Decimal,
    #[serde(default)]
    pub committed_stock: Decimal,
    #[serde(default)]
    pub available_for_sale: Decimal,
    #[serde(default)]
    pub physical_opening_stock: Decimal,
    #[serde(default)]
    pub physical_stock_on_hand: Decimal,
    #[serde(default)]
    pub physical_committed_stock: Decimal,
    #[serde(default)]
    pub physical_available_for_sale: Decimal,
}

impl WarehouseStockRecord {
    /// A zeroed record for a warehouse that has never held the item
    pub fn empty(warehouse: impl Into<String>) -> Self {
        Self {
            warehouse: warehouse.into(),
            ..Default::default()
        }
    }

    /// Add received quantity to the on-hand and sellable counters
    pub fn receive(&mut self, quantity: Decimal) {
        self.stock_on_hand += quantity;
        self.available_for_sale += quantity;
        self.physical_stock_on_hand += quantity;
        self.physical_available_for_sale += quantity;
    }

    /// Remove quantity from the same counters, never going below zero
    pub fn release(&mut self, quantity: Decimal) {
        self.stock_on_hand = floor_zero(self.stock_on_hand - quantity);
        self.available_for_sale = floor_zero(self.available_for_sale - quantity);
        self.physical_stock_on_hand = floor_zero(self.physical_stock_on_hand - quantity);
        self.physical_available_for_sale =
            floor_zero(self.physical_available_for_sale - quantity);
    }
}

fn floor_zero(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// A standalone inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub is_active: bool,
    pub warehouse_stocks: Vec<WarehouseStockRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A container of variant items sharing one parent record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemGroup {
    pub id: Uuid,
    /// Sequence number such as "GRP-00001"
    pub group_number: String,
    pub name: String,
    pub is_active: bool,
    pub items: Vec<GroupItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of an item group; carries its own stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupItem {
    pub name: String,
    pub sku: Option<String>,
    #[serde(default)]
    pub warehouse_stocks: Vec<WarehouseStockRecord>,
}

impl ItemGroup {
    /// Find a nested item by name or SKU (case-insensitive)
    pub fn position_of(&self, name: Option<&str>, sku: Option<&str>) -> Option<usize> {
        if let Some(sku) = sku.filter(|s| !s.trim().is_empty()) {
            if let Some(pos) = self
                .items
                .iter()
                .position(|item| same_text(item.sku.as_deref(), Some(sku)))
            {
                return Some(pos);
            }
        }
        let name = name.filter(|n| !n.trim().is_empty())?;
        self.items
            .iter()
            .position(|item| same_text(Some(&item.name), Some(name)))
    }
}

/// Composite id of a nested group item, e.g. "<group uuid>_2"
pub fn group_item_key(group_id: Uuid, position: usize) -> String {
    format!("{}_{}", group_id, position)
}

/// Parse a composite group-item id back into its parts
pub fn parse_group_item_key(key: &str) -> Option<(Uuid, usize)> {
    let (group, position) = key.rsplit_once('_')?;
    Some((Uuid::parse_str(group).ok()?, position.parse().ok()?))
}

/// Case-insensitive comparison of optional free-text identifiers
pub fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let a = a.trim();
            !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
        }
        _ => false,
    }
}

/// Every identifier a document line carries for its backing item.
///
/// Historical records rarely carry one stable id, so resolution tries
/// each field in turn (see the backend's item resolution strategy).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub item_id: Option<String>,
    pub group_id: Option<Uuid>,
    pub name: Option<String>,
    pub sku: Option<String>,
}

impl ItemRef {
    pub fn standalone(item_id: Uuid) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            ..Default::default()
        }
    }

    pub fn grouped(group_id: Uuid, name: impl Into<String>, sku: Option<String>) -> Self {
        Self {
            group_id: Some(group_id),
            name: Some(name.into()),
            sku,
            ..Default::default()
        }
    }

    pub fn by_sku(sku: impl Into<String>) -> Self {
        Self {
            sku: Some(sku.into()),
            ..Default::default()
        }
    }

    /// Human-readable label for logs and warnings
    pub fn describe(&self) -> String {
        self.sku
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .or(self.item_id.as_deref())
            .map(str::to_string)
            .or_else(|| self.group_id.map(|g| format!("group {}", g)))
            .unwrap_or_else(|| "unidentified item".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_receive_and_release() {
        let mut record = WarehouseStockRecord::empty("Warehouse");
        record.receive(dec!(10));
        assert_eq!(record.stock_on_hand, dec!(10));
        assert_eq!(record.physical_available_for_sale, dec!(10));

        record.release(dec!(4));
        assert_eq!(record.stock_on_hand, dec!(6));
        assert_eq!(record.available_for_sale, dec!(6));
    }

    #[test]
    fn test_release_floors_each_counter() {
        let mut record = WarehouseStockRecord::empty("Warehouse");
        record.stock_on_hand = dec!(5);
        record.available_for_sale = dec!(2);
        record.release(dec!(5));
        assert_eq!(record.stock_on_hand, Decimal::ZERO);
        assert_eq!(record.available_for_sale, Decimal::ZERO);
    }

    #[test]
    fn test_group_item_key_round_trip() {
        let group = Uuid::new_v4();
        let key = group_item_key(group, 3);
        assert_eq!(parse_group_item_key(&key), Some((group, 3)));
        assert_eq!(parse_group_item_key("not-a-key"), None);
    }

    #[test]
    fn test_position_prefers_sku() {
        let group = ItemGroup {
            id: Uuid::new_v4(),
            group_number: "GRP-00001".to_string(),
            name: "Shirts".to_string(),
            is_active: true,
            items: vec![
                GroupItem {
                    name: "Shirt M".to_string(),
                    sku: Some("SH-M".to_string()),
                    warehouse_stocks: vec![],
                },
                GroupItem {
                    name: "Shirt L".to_string(),
                    sku: Some("SH-L".to_string()),
                    warehouse_stocks: vec![],
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(group.position_of(Some("Shirt M"), Some("sh-l")), Some(1));
        assert_eq!(group.position_of(Some("shirt m"), None), Some(0));
        assert_eq!(group.position_of(None, None), None);
    }
}
