//! In-memory store fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use branch_inventory_backend::error::{AppError, AppResult};
use branch_inventory_backend::store::{
    ActivityEvent, ActivityLog, BillStore, DocumentNumberGenerator, DocumentStore, ItemStore,
    NumberSeries, PurchaseDocumentReader, StoreOrderStore, Stores, TransferOrderStore,
    VendorCreditStore, VendorStore,
};
use chrono::Utc;
use rust_decimal::Decimal;
use shared::{
    same_text, Bill, GroupItem, Item, ItemGroup, Pagination, PurchaseOrder, PurchaseReceive,
    StoreOrder, StoreOrderStatus, TransferOrder, TransferOrderStatus, Vendor, VendorCredit,
    WarehouseNameResolver, WarehouseStockRecord,
};
use tokio::sync::RwLock;
use uuid::Uuid;

fn injected(what: &str) -> AppError {
    AppError::Internal(format!("injected {} failure", what))
}

fn page<T: Clone>(rows: &[T], pagination: &Pagination) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let data = rows
        .iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .cloned()
        .collect();
    (data, total)
}

// ============================================================================
// Items
// ============================================================================

#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<Vec<Item>>,
    groups: RwLock<Vec<ItemGroup>>,
    pub fail_saves: AtomicBool,
    saves: AtomicUsize,
    failing_save: std::sync::Mutex<Option<usize>>,
}

impl MemoryItemStore {
    /// Fail only the `nth` save (0-based) counted from now
    pub fn fail_nth_save(&self, nth: usize) {
        let next = self.saves.load(Ordering::SeqCst);
        *self.failing_save.lock().unwrap() = Some(next + nth);
    }

    fn check_save(&self, what: &str) -> AppResult<()> {
        let number = self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst)
            || *self.failing_save.lock().unwrap() == Some(number)
        {
            return Err(injected(what));
        }
        Ok(())
    }

    pub async fn add_item(&self, name: &str, sku: Option<&str>, stocks: &[(&str, Decimal)]) -> Uuid {
        let item = Item {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sku: sku.map(str::to_string),
            is_active: true,
            warehouse_stocks: stock_records(stocks),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = item.id;
        self.items.write().await.push(item);
        id
    }

    /// A group whose nested items are (name, sku, stocks)
    pub async fn add_group(
        &self,
        name: &str,
        members: Vec<(&str, Option<&str>, Vec<(&str, Decimal)>)>,
    ) -> Uuid {
        let group = ItemGroup {
            id: Uuid::new_v4(),
            group_number: "GRP-00001".to_string(),
            name: name.to_string(),
            is_active: true,
            items: members
                .into_iter()
                .map(|(name, sku, stocks)| GroupItem {
                    name: name.to_string(),
                    sku: sku.map(str::to_string),
                    warehouse_stocks: stock_records(&stocks),
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = group.id;
        self.groups.write().await.push(group);
        id
    }

    pub async fn item_stocks(&self, id: Uuid) -> Vec<WarehouseStockRecord> {
        self.items
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.warehouse_stocks.clone())
            .unwrap_or_default()
    }

    pub async fn group_item_stocks(&self, group_id: Uuid, position: usize) -> Vec<WarehouseStockRecord> {
        self.groups
            .read()
            .await
            .iter()
            .find(|g| g.id == group_id)
            .and_then(|g| g.items.get(position))
            .map(|i| i.warehouse_stocks.clone())
            .unwrap_or_default()
    }

    /// Stock on hand under an exact warehouse key
    pub async fn on_hand(&self, id: Uuid, warehouse: &str) -> Decimal {
        self.item_stocks(id)
            .await
            .iter()
            .find(|r| r.warehouse == warehouse)
            .map(|r| r.stock_on_hand)
            .unwrap_or(Decimal::ZERO)
    }
}

pub fn stock_records(stocks: &[(&str, Decimal)]) -> Vec<WarehouseStockRecord> {
    stocks
        .iter()
        .map(|(warehouse, qty)| {
            let mut record = WarehouseStockRecord::empty(*warehouse);
            record.receive(*qty);
            record
        })
        .collect()
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn find_item(&self, name: Option<&str>, sku: Option<&str>) -> AppResult<Option<Item>> {
        let items = self.items.read().await;
        let by_sku = items
            .iter()
            .find(|i| i.is_active && same_text(i.sku.as_deref(), sku));
        let found = by_sku.or_else(|| {
            items
                .iter()
                .find(|i| i.is_active && same_text(Some(&i.name), name))
        });
        Ok(found.cloned())
    }

    async fn save_item_stocks(&self, id: Uuid, stocks: &[WarehouseStockRecord]) -> AppResult<()> {
        self.check_save("item save")?;
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        item.warehouse_stocks = stocks.to_vec();
        Ok(())
    }

    async fn get_group(&self, id: Uuid) -> AppResult<Option<ItemGroup>> {
        Ok(self.groups.read().await.iter().find(|g| g.id == id).cloned())
    }

    async fn list_active_groups(&self) -> AppResult<Vec<ItemGroup>> {
        Ok(self
            .groups
            .read()
            .await
            .iter()
            .filter(|g| g.is_active)
            .cloned()
            .collect())
    }

    async fn save_group_item_stocks(
        &self,
        group_id: Uuid,
        position: usize,
        stocks: &[WarehouseStockRecord],
    ) -> AppResult<()> {
        self.check_save("group save")?;
        let mut groups = self.groups.write().await;
        let member = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .and_then(|g| g.items.get_mut(position))
            .ok_or_else(|| AppError::NotFound("Group item".to_string()))?;
        member.warehouse_stocks = stocks.to_vec();
        Ok(())
    }
}

// ============================================================================
// Bills and vendor credits
// ============================================================================

#[derive(Default)]
pub struct MemoryBillStore {
    bills: RwLock<Vec<Bill>>,
}

#[async_trait]
impl BillStore for MemoryBillStore {
    async fn insert_bill(&self, bill: &Bill) -> AppResult<()> {
        self.bills.write().await.push(bill.clone());
        Ok(())
    }

    async fn update_bill(&self, bill: &Bill) -> AppResult<()> {
        let mut bills = self.bills.write().await;
        let slot = bills
            .iter_mut()
            .find(|b| b.id == bill.id)
            .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;
        *slot = bill.clone();
        Ok(())
    }

    async fn get_bill(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Bill>> {
        Ok(self
            .bills
            .read()
            .await
            .iter()
            .find(|b| b.id == id && b.user_id == user_id)
            .cloned())
    }

    async fn list_bills(&self, user_id: Uuid, pagination: &Pagination) -> AppResult<(Vec<Bill>, u64)> {
        let bills: Vec<Bill> = self
            .bills
            .read()
            .await
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        Ok(page(&bills, pagination))
    }

    async fn delete_bill(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut bills = self.bills.write().await;
        let before = bills.len();
        bills.retain(|b| !(b.id == id && b.user_id == user_id));
        Ok(bills.len() != before)
    }

    async fn bill_number_taken(
        &self,
        user_id: Uuid,
        bill_number: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<bool> {
        Ok(self.bills.read().await.iter().any(|b| {
            b.user_id == user_id && b.bill_number == bill_number && Some(b.id) != excluding
        }))
    }
}

#[derive(Default)]
pub struct MemoryVendorCreditStore {
    credits: RwLock<Vec<VendorCredit>>,
}

#[async_trait]
impl VendorCreditStore for MemoryVendorCreditStore {
    async fn insert_credit(&self, credit: &VendorCredit) -> AppResult<()> {
        self.credits.write().await.push(credit.clone());
        Ok(())
    }

    async fn update_credit(&self, credit: &VendorCredit) -> AppResult<()> {
        let mut credits = self.credits.write().await;
        let slot = credits
            .iter_mut()
            .find(|c| c.id == credit.id)
            .ok_or_else(|| AppError::NotFound("Vendor credit".to_string()))?;
        *slot = credit.clone();
        Ok(())
    }

    async fn get_credit(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<VendorCredit>> {
        Ok(self
            .credits
            .read()
            .await
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn list_credits(
        &self,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<(Vec<VendorCredit>, u64)> {
        let credits: Vec<VendorCredit> = self
            .credits
            .read()
            .await
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        Ok(page(&credits, pagination))
    }

    async fn delete_credit(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut credits = self.credits.write().await;
        let before = credits.len();
        credits.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(credits.len() != before)
    }

    async fn credit_number_taken(
        &self,
        user_id: Uuid,
        credit_number: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<bool> {
        Ok(self.credits.read().await.iter().any(|c| {
            c.user_id == user_id && c.credit_number == credit_number && Some(c.id) != excluding
        }))
    }
}

// ============================================================================
// Vendors
// ============================================================================

#[derive(Default)]
pub struct MemoryVendorStore {
    vendors: RwLock<HashMap<Uuid, Vendor>>,
}

impl MemoryVendorStore {
    pub async fn add_vendor(&self, name: &str, payables: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.vendors.write().await.insert(
            id,
            Vendor {
                id,
                display_name: name.to_string(),
                payables,
            },
        );
        id
    }

    pub async fn payables(&self, id: Uuid) -> Option<Decimal> {
        self.vendors.read().await.get(&id).map(|v| v.payables)
    }
}

#[async_trait]
impl VendorStore for MemoryVendorStore {
    async fn get_vendor(&self, id: Uuid) -> AppResult<Option<Vendor>> {
        Ok(self.vendors.read().await.get(&id).cloned())
    }

    async fn set_payables(&self, id: Uuid, payables: Decimal) -> AppResult<()> {
        let mut vendors = self.vendors.write().await;
        let vendor = vendors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;
        vendor.payables = payables;
        Ok(())
    }
}

// ============================================================================
// Store and transfer orders
// ============================================================================

#[derive(Default)]
pub struct MemoryStoreOrderStore {
    orders: RwLock<Vec<StoreOrder>>,
    pub fail_updates: AtomicBool,
}

impl MemoryStoreOrderStore {
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl StoreOrderStore for MemoryStoreOrderStore {
    async fn insert_store_order(&self, order: &StoreOrder) -> AppResult<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn update_store_order(&self, order: &StoreOrder) -> AppResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(injected("store order update"));
        }
        let mut orders = self.orders.write().await;
        let slot = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| AppError::NotFound("Store order".to_string()))?;
        *slot = order.clone();
        Ok(())
    }

    async fn get_store_order(&self, id: Uuid) -> AppResult<Option<StoreOrder>> {
        Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
    }

    async fn list_store_orders(
        &self,
        status: Option<StoreOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<StoreOrder>, u64)> {
        let orders: Vec<StoreOrder> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(page(&orders, pagination))
    }

    async fn delete_store_order(&self, id: Uuid) -> AppResult<bool> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        Ok(orders.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryTransferOrderStore {
    orders: RwLock<Vec<TransferOrder>>,
    pub fail_updates: AtomicBool,
}

impl MemoryTransferOrderStore {
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl TransferOrderStore for MemoryTransferOrderStore {
    async fn insert_transfer_order(&self, order: &TransferOrder) -> AppResult<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn update_transfer_order(&self, order: &TransferOrder) -> AppResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(injected("transfer order update"));
        }
        let mut orders = self.orders.write().await;
        let slot = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| AppError::NotFound("Transfer order".to_string()))?;
        *slot = order.clone();
        Ok(())
    }

    async fn get_transfer_order(&self, id: Uuid) -> AppResult<Option<TransferOrder>> {
        Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
    }

    async fn list_transfer_orders(
        &self,
        status: Option<TransferOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<TransferOrder>, u64)> {
        let orders: Vec<TransferOrder> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        Ok(page(&orders, pagination))
    }

    async fn delete_transfer_order(&self, id: Uuid) -> AppResult<bool> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        Ok(orders.len() != before)
    }
}

// ============================================================================
// Document store, purchasing, numbering, activity
// ============================================================================

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), serde_json::Value>>,
    pub fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    pub async fn contains(&self, collection: &str, id: Uuid) -> bool {
        self.documents
            .read()
            .await
            .contains_key(&(collection.to_string(), id.to_string()))
    }

    pub async fn document(&self, collection: &str, id: Uuid) -> Option<serde_json::Value> {
        self.documents
            .read()
            .await
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: &str, id: &str, document: serde_json::Value) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("document write"));
        }
        self.documents
            .write()
            .await
            .insert((collection.to_string(), id.to_string()), document);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<serde_json::Value>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("document delete"));
        }
        Ok(self
            .documents
            .write()
            .await
            .remove(&(collection.to_string(), id.to_string()))
            .is_some())
    }
}

#[derive(Default)]
pub struct MemoryPurchases {
    orders: RwLock<HashMap<Uuid, PurchaseOrder>>,
    receives: RwLock<HashMap<Uuid, PurchaseReceive>>,
}

impl MemoryPurchases {
    pub async fn add_order(&self, order: PurchaseOrder) {
        self.orders.write().await.insert(order.id, order);
    }

    pub async fn add_receive(&self, receive: PurchaseReceive) {
        self.receives.write().await.insert(receive.id, receive);
    }
}

#[async_trait]
impl PurchaseDocumentReader for MemoryPurchases {
    async fn get_purchase_order(&self, id: Uuid) -> AppResult<Option<PurchaseOrder>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn get_purchase_receive(&self, id: Uuid) -> AppResult<Option<PurchaseReceive>> {
        Ok(self.receives.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryNumbers {
    counters: RwLock<HashMap<&'static str, i64>>,
}

#[async_trait]
impl DocumentNumberGenerator for MemoryNumbers {
    async fn next(&self, series: NumberSeries) -> AppResult<String> {
        let mut counters = self.counters.write().await;
        let value = counters.entry(series.counter_id()).or_insert(0);
        *value += 1;
        Ok(series.format(*value))
    }
}

#[derive(Default)]
pub struct MemoryActivityLog {
    events: RwLock<Vec<ActivityEvent>>,
}

impl MemoryActivityLog {
    pub async fn actions(&self) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .map(|e| format!("{}:{}", e.entity_type, e.action))
            .collect()
    }

    /// Acting user per event, in log order
    pub async fn actors(&self) -> Vec<Option<Uuid>> {
        self.events.read().await.iter().map(|e| e.user_id).collect()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn log(&self, event: ActivityEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Every fake, kept concrete so tests can seed and inspect them
#[derive(Default, Clone)]
pub struct TestStores {
    pub items: Arc<MemoryItemStore>,
    pub bills: Arc<MemoryBillStore>,
    pub vendor_credits: Arc<MemoryVendorCreditStore>,
    pub vendors: Arc<MemoryVendorStore>,
    pub store_orders: Arc<MemoryStoreOrderStore>,
    pub transfer_orders: Arc<MemoryTransferOrderStore>,
    pub documents: Arc<MemoryDocumentStore>,
    pub purchases: Arc<MemoryPurchases>,
    pub numbers: Arc<MemoryNumbers>,
    pub activity: Arc<MemoryActivityLog>,
}

impl TestStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            items: self.items.clone(),
            bills: self.bills.clone(),
            vendor_credits: self.vendor_credits.clone(),
            vendors: self.vendors.clone(),
            store_orders: self.store_orders.clone(),
            transfer_orders: self.transfer_orders.clone(),
            documents: self.documents.clone(),
            purchases: self.purchases.clone(),
            numbers: self.numbers.clone(),
            activity: self.activity.clone(),
        }
    }
}

pub fn resolver() -> Arc<WarehouseNameResolver> {
    Arc::new(WarehouseNameResolver::default())
}
