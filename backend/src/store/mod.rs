//! Persistence seams
//!
//! Services only talk to the traits in this module. Postgres implementations
//! live in [`postgres`] (primary relational store) and [`document`]
//! (secondary JSONB document store holding mirrors and legacy vendors).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    Bill, Item, ItemGroup, Pagination, PurchaseOrder, PurchaseReceive, StoreOrder,
    StoreOrderStatus, TransferOrder, TransferOrderStatus, Vendor, VendorCredit,
    WarehouseStockRecord,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

pub mod document;
pub mod postgres;

pub use document::PgDocumentStore;
pub use postgres::{
    PgActivityLog, PgBillStore, PgDocumentNumberGenerator, PgItemStore, PgPurchaseDocumentReader,
    PgStoreOrderStore, PgTransferOrderStore, PgVendorCreditStore, PgVendorStore,
};

/// Document-store collection names
pub mod collections {
    pub const STORE_ORDERS: &str = "store_orders";
    pub const TRANSFER_ORDERS: &str = "transfer_orders";
    pub const VENDORS: &str = "vendors";
}

/// Items and item groups with their per-warehouse stock lists
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>>;

    /// First active standalone item whose SKU or name matches (case-insensitive)
    async fn find_item(&self, name: Option<&str>, sku: Option<&str>) -> AppResult<Option<Item>>;

    async fn save_item_stocks(&self, id: Uuid, stocks: &[WarehouseStockRecord]) -> AppResult<()>;

    async fn get_group(&self, id: Uuid) -> AppResult<Option<ItemGroup>>;

    async fn list_active_groups(&self) -> AppResult<Vec<ItemGroup>>;

    /// Replace one nested item's stock list, leaving its siblings untouched
    async fn save_group_item_stocks(
        &self,
        group_id: Uuid,
        position: usize,
        stocks: &[WarehouseStockRecord],
    ) -> AppResult<()>;
}

#[async_trait]
pub trait BillStore: Send + Sync {
    async fn insert_bill(&self, bill: &Bill) -> AppResult<()>;
    async fn update_bill(&self, bill: &Bill) -> AppResult<()>;
    async fn get_bill(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Bill>>;
    async fn list_bills(&self, user_id: Uuid, pagination: &Pagination) -> AppResult<(Vec<Bill>, u64)>;
    async fn delete_bill(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;
    async fn bill_number_taken(
        &self,
        user_id: Uuid,
        bill_number: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<bool>;
}

#[async_trait]
pub trait VendorCreditStore: Send + Sync {
    async fn insert_credit(&self, credit: &VendorCredit) -> AppResult<()>;
    async fn update_credit(&self, credit: &VendorCredit) -> AppResult<()>;
    async fn get_credit(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<VendorCredit>>;
    async fn list_credits(
        &self,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<(Vec<VendorCredit>, u64)>;
    async fn delete_credit(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;
    async fn credit_number_taken(
        &self,
        user_id: Uuid,
        credit_number: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<bool>;
}

/// Vendors in the primary relational store
#[async_trait]
pub trait VendorStore: Send + Sync {
    async fn get_vendor(&self, id: Uuid) -> AppResult<Option<Vendor>>;
    async fn set_payables(&self, id: Uuid, payables: Decimal) -> AppResult<()>;
}

#[async_trait]
pub trait StoreOrderStore: Send + Sync {
    async fn insert_store_order(&self, order: &StoreOrder) -> AppResult<()>;
    async fn update_store_order(&self, order: &StoreOrder) -> AppResult<()>;
    async fn get_store_order(&self, id: Uuid) -> AppResult<Option<StoreOrder>>;
    async fn list_store_orders(
        &self,
        status: Option<StoreOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<StoreOrder>, u64)>;
    async fn delete_store_order(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait TransferOrderStore: Send + Sync {
    async fn insert_transfer_order(&self, order: &TransferOrder) -> AppResult<()>;
    async fn update_transfer_order(&self, order: &TransferOrder) -> AppResult<()>;
    async fn get_transfer_order(&self, id: Uuid) -> AppResult<Option<TransferOrder>>;
    async fn list_transfer_orders(
        &self,
        status: Option<TransferOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<TransferOrder>, u64)>;
    async fn delete_transfer_order(&self, id: Uuid) -> AppResult<bool>;
}

/// Schemaless collections keyed by string id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a document
    async fn put(&self, collection: &str, id: &str, document: serde_json::Value) -> AppResult<()>;
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<serde_json::Value>>;
    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;
}

/// Read-only access to upstream purchasing documents
#[async_trait]
pub trait PurchaseDocumentReader: Send + Sync {
    async fn get_purchase_order(&self, id: Uuid) -> AppResult<Option<PurchaseOrder>>;
    async fn get_purchase_receive(&self, id: Uuid) -> AppResult<Option<PurchaseReceive>>;
}

/// Counters behind human-readable document numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSeries {
    StoreOrder,
    TransferOrder,
    VendorCredit,
}

impl NumberSeries {
    pub fn counter_id(&self) -> &'static str {
        match self {
            NumberSeries::StoreOrder => "store_order",
            NumberSeries::TransferOrder => "transfer_order",
            NumberSeries::VendorCredit => "vendor_credit",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            NumberSeries::StoreOrder => "SO",
            NumberSeries::TransferOrder => "TO",
            NumberSeries::VendorCredit => "VC",
        }
    }

    /// e.g. "SO-00001"
    pub fn format(&self, sequence: i64) -> String {
        format!("{}-{:05}", self.prefix(), sequence)
    }
}

#[async_trait]
pub trait DocumentNumberGenerator: Send + Sync {
    /// Atomically increment the series counter and format the result
    async fn next(&self, series: NumberSeries) -> AppResult<String>;
}

/// One entry of the display-only activity history
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub action: String,
    pub user_id: Option<Uuid>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(
        entity_type: &'static str,
        entity_id: Uuid,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            action: action.into(),
            user_id: None,
            description: description.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn log(&self, event: ActivityEvent) -> AppResult<()>;
}

/// Log an activity event; failures are reported and dropped
pub async fn record_activity(log: &dyn ActivityLog, event: ActivityEvent) {
    let entity_id = event.entity_id;
    if let Err(e) = log.log(event).await {
        tracing::warn!(%entity_id, "Failed to record activity: {}", e);
    }
}

/// Every store the services depend on
#[derive(Clone)]
pub struct Stores {
    pub items: Arc<dyn ItemStore>,
    pub bills: Arc<dyn BillStore>,
    pub vendor_credits: Arc<dyn VendorCreditStore>,
    pub vendors: Arc<dyn VendorStore>,
    pub store_orders: Arc<dyn StoreOrderStore>,
    pub transfer_orders: Arc<dyn TransferOrderStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub purchases: Arc<dyn PurchaseDocumentReader>,
    pub numbers: Arc<dyn DocumentNumberGenerator>,
    pub activity: Arc<dyn ActivityLog>,
}

impl Stores {
    /// Wire the Postgres implementations over the two pools
    pub fn postgres(primary: PgPool, documents: PgPool) -> Self {
        Self {
            items: Arc::new(PgItemStore::new(primary.clone())),
            bills: Arc::new(PgBillStore::new(primary.clone())),
            vendor_credits: Arc::new(PgVendorCreditStore::new(primary.clone())),
            vendors: Arc::new(PgVendorStore::new(primary.clone())),
            store_orders: Arc::new(PgStoreOrderStore::new(primary.clone())),
            transfer_orders: Arc::new(PgTransferOrderStore::new(primary.clone())),
            documents: Arc::new(PgDocumentStore::new(documents)),
            purchases: Arc::new(PgPurchaseDocumentReader::new(primary.clone())),
            numbers: Arc::new(PgDocumentNumberGenerator::new(primary.clone())),
            activity: Arc::new(PgActivityLog::new(primary)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_series_format() {
        assert_eq!(NumberSeries::StoreOrder.format(1), "SO-00001");
        assert_eq!(NumberSeries::VendorCredit.format(123456), "VC-123456");
        assert_eq!(NumberSeries::TransferOrder.counter_id(), "transfer_order");
    }
}
