//! Primary relational store (PostgreSQL)
//!
//! Nested lists (line items, warehouse stocks, group items) are JSONB columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Bill, BillLineItem, BillStatus, GroupItem, Item, ItemGroup, Pagination, PurchaseOrder,
    PurchaseOrderLine, PurchaseReceive, ReceivedLine, SourceType, StoreOrder, StoreOrderLine,
    StoreOrderStatus, TransferOrder, TransferOrderLine, TransferOrderStatus, Vendor, VendorCredit,
    VendorCreditStatus, WarehouseStockRecord,
};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{
    ActivityEvent, ActivityLog, BillStore, DocumentNumberGenerator, ItemStore, NumberSeries,
    PurchaseDocumentReader, StoreOrderStore, TransferOrderStore, VendorCreditStore, VendorStore,
};
use crate::error::{AppError, AppResult};

fn unknown_status(kind: &str, value: &str) -> AppError {
    AppError::Internal(format!("Unknown {} '{}' in database", kind, value))
}

fn page_bounds(pagination: &Pagination) -> (i64, i64) {
    (pagination.limit() as i64, pagination.offset() as i64)
}

// ============================================================================
// Items
// ============================================================================

#[derive(Clone)]
pub struct PgItemStore {
    db: PgPool,
}

impl PgItemStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    sku: Option<String>,
    is_active: bool,
    warehouse_stocks: Json<Vec<WarehouseStockRecord>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            name: row.name,
            sku: row.sku,
            is_active: row.is_active,
            warehouse_stocks: row.warehouse_stocks.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemGroupRow {
    id: Uuid,
    group_number: String,
    name: String,
    is_active: bool,
    items: Json<Vec<GroupItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemGroupRow> for ItemGroup {
    fn from(row: ItemGroupRow) -> Self {
        ItemGroup {
            id: row.id,
            group_number: row.group_number,
            name: row.name,
            is_active: row.is_active,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, sku, is_active, warehouse_stocks, created_at, updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn find_item(&self, name: Option<&str>, sku: Option<&str>) -> AppResult<Option<Item>> {
        if let Some(sku) = sku.map(str::trim).filter(|s| !s.is_empty()) {
            let row = sqlx::query_as::<_, ItemRow>(
                r#"
                SELECT id, name, sku, is_active, warehouse_stocks, created_at, updated_at
                FROM items
                WHERE is_active AND LOWER(sku) = LOWER($1)
                ORDER BY created_at
                LIMIT 1
                "#,
            )
            .bind(sku)
            .fetch_optional(&self.db)
            .await?;
            if row.is_some() {
                return Ok(row.map(Item::from));
            }
        }

        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, sku, is_active, warehouse_stocks, created_at, updated_at
            FROM items
            WHERE is_active AND LOWER(name) = LOWER($1)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn save_item_stocks(&self, id: Uuid, stocks: &[WarehouseStockRecord]) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE items SET warehouse_stocks = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(stocks))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get_group(&self, id: Uuid) -> AppResult<Option<ItemGroup>> {
        let row = sqlx::query_as::<_, ItemGroupRow>(
            r#"
            SELECT id, group_number, name, is_active, items, created_at, updated_at
            FROM item_groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(ItemGroup::from))
    }

    async fn list_active_groups(&self) -> AppResult<Vec<ItemGroup>> {
        let rows = sqlx::query_as::<_, ItemGroupRow>(
            r#"
            SELECT id, group_number, name, is_active, items, created_at, updated_at
            FROM item_groups
            WHERE is_active
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ItemGroup::from).collect())
    }

    async fn save_group_item_stocks(
        &self,
        group_id: Uuid,
        position: usize,
        stocks: &[WarehouseStockRecord],
    ) -> AppResult<()> {
        // jsonb_set touches only the addressed element's stock list
        let result = sqlx::query(
            r#"
            UPDATE item_groups
            SET items = jsonb_set(items, ARRAY[$2::text, 'warehouse_stocks'], $3),
                updated_at = NOW()
            WHERE id = $1 AND jsonb_array_length(items) > $4
            "#,
        )
        .bind(group_id)
        .bind(position.to_string())
        .bind(Json(stocks))
        .bind(position as i32)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ItemNotFound(shared::group_item_key(group_id, position)));
        }
        Ok(())
    }
}

// ============================================================================
// Bills
// ============================================================================

#[derive(Clone)]
pub struct PgBillStore {
    db: PgPool,
}

impl PgBillStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct BillRow {
    id: Uuid,
    user_id: Uuid,
    bill_number: String,
    vendor_id: Option<Uuid>,
    vendor_name: String,
    items: Json<Vec<BillLineItem>>,
    status: String,
    source_type: String,
    warehouse: String,
    final_total: Decimal,
    purchase_order_id: Option<Uuid>,
    purchase_receive_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
    type Error = AppError;

    fn try_from(row: BillRow) -> AppResult<Self> {
        Ok(Bill {
            status: BillStatus::from_str(&row.status)
                .ok_or_else(|| unknown_status("bill status", &row.status))?,
            source_type: SourceType::from_str(&row.source_type)
                .ok_or_else(|| unknown_status("bill source type", &row.source_type))?,
            id: row.id,
            user_id: row.user_id,
            bill_number: row.bill_number,
            vendor_id: row.vendor_id,
            vendor_name: row.vendor_name,
            items: row.items.0,
            warehouse: row.warehouse,
            final_total: row.final_total,
            purchase_order_id: row.purchase_order_id,
            purchase_receive_id: row.purchase_receive_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BILL_COLUMNS: &str = "id, user_id, bill_number, vendor_id, vendor_name, items, status, \
     source_type, warehouse, final_total, purchase_order_id, purchase_receive_id, created_at, updated_at";

#[async_trait]
impl BillStore for PgBillStore {
    async fn insert_bill(&self, bill: &Bill) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bills (id, user_id, bill_number, vendor_id, vendor_name, items, status,
                               source_type, warehouse, final_total, purchase_order_id,
                               purchase_receive_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(bill.id)
        .bind(bill.user_id)
        .bind(&bill.bill_number)
        .bind(bill.vendor_id)
        .bind(&bill.vendor_name)
        .bind(Json(&bill.items))
        .bind(bill.status.as_str())
        .bind(bill.source_type.as_str())
        .bind(&bill.warehouse)
        .bind(bill.final_total)
        .bind(bill.purchase_order_id)
        .bind(bill.purchase_receive_id)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_bill(&self, bill: &Bill) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET bill_number = $3, vendor_id = $4, vendor_name = $5, items = $6, status = $7,
                warehouse = $8, final_total = $9, updated_at = $10
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(bill.id)
        .bind(bill.user_id)
        .bind(&bill.bill_number)
        .bind(bill.vendor_id)
        .bind(&bill.vendor_name)
        .bind(Json(&bill.items))
        .bind(bill.status.as_str())
        .bind(&bill.warehouse)
        .bind(bill.final_total)
        .bind(bill.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Bill".to_string()));
        }
        Ok(())
    }

    async fn get_bill(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {} FROM bills WHERE id = $1 AND user_id = $2",
            BILL_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Bill::try_from).transpose()
    }

    async fn list_bills(&self, user_id: Uuid, pagination: &Pagination) -> AppResult<(Vec<Bill>, u64)> {
        let (limit, offset) = page_bounds(pagination);
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {} FROM bills WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            BILL_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        let bills = rows
            .into_iter()
            .map(Bill::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((bills, total as u64))
    }

    async fn delete_bill(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn bill_number_taken(
        &self,
        user_id: Uuid,
        bill_number: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bills
                WHERE user_id = $1 AND bill_number = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(bill_number)
        .bind(excluding)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }
}

// ============================================================================
// Vendor credits
// ============================================================================

#[derive(Clone)]
pub struct PgVendorCreditStore {
    db: PgPool,
}

impl PgVendorCreditStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct VendorCreditRow {
    id: Uuid,
    user_id: Uuid,
    credit_number: String,
    vendor_id: Option<Uuid>,
    vendor_name: String,
    items: Json<Vec<BillLineItem>>,
    status: String,
    warehouse: String,
    final_total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VendorCreditRow> for VendorCredit {
    type Error = AppError;

    fn try_from(row: VendorCreditRow) -> AppResult<Self> {
        Ok(VendorCredit {
            status: VendorCreditStatus::from_str(&row.status)
                .ok_or_else(|| unknown_status("vendor credit status", &row.status))?,
            id: row.id,
            user_id: row.user_id,
            credit_number: row.credit_number,
            vendor_id: row.vendor_id,
            vendor_name: row.vendor_name,
            items: row.items.0,
            warehouse: row.warehouse,
            final_total: row.final_total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CREDIT_COLUMNS: &str = "id, user_id, credit_number, vendor_id, vendor_name, items, status, \
     warehouse, final_total, created_at, updated_at";

#[async_trait]
impl VendorCreditStore for PgVendorCreditStore {
    async fn insert_credit(&self, credit: &VendorCredit) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vendor_credits (id, user_id, credit_number, vendor_id, vendor_name, items,
                                        status, warehouse, final_total, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(credit.id)
        .bind(credit.user_id)
        .bind(&credit.credit_number)
        .bind(credit.vendor_id)
        .bind(&credit.vendor_name)
        .bind(Json(&credit.items))
        .bind(credit.status.as_str())
        .bind(&credit.warehouse)
        .bind(credit.final_total)
        .bind(credit.created_at)
        .bind(credit.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_credit(&self, credit: &VendorCredit) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vendor_credits
            SET credit_number = $3, vendor_id = $4, vendor_name = $5, items = $6, status = $7,
                warehouse = $8, final_total = $9, updated_at = $10
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(credit.id)
        .bind(credit.user_id)
        .bind(&credit.credit_number)
        .bind(credit.vendor_id)
        .bind(&credit.vendor_name)
        .bind(Json(&credit.items))
        .bind(credit.status.as_str())
        .bind(&credit.warehouse)
        .bind(credit.final_total)
        .bind(credit.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vendor credit".to_string()));
        }
        Ok(())
    }

    async fn get_credit(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<VendorCredit>> {
        let row = sqlx::query_as::<_, VendorCreditRow>(&format!(
            "SELECT {} FROM vendor_credits WHERE id = $1 AND user_id = $2",
            CREDIT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(VendorCredit::try_from).transpose()
    }

    async fn list_credits(
        &self,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<(Vec<VendorCredit>, u64)> {
        let (limit, offset) = page_bounds(pagination);
        let rows = sqlx::query_as::<_, VendorCreditRow>(&format!(
            "SELECT {} FROM vendor_credits WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            CREDIT_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendor_credits WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        let credits = rows
            .into_iter()
            .map(VendorCredit::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((credits, total as u64))
    }

    async fn delete_credit(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vendor_credits WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn credit_number_taken(
        &self,
        user_id: Uuid,
        credit_number: &str,
        excluding: Option<Uuid>,
    ) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM vendor_credits
                WHERE user_id = $1 AND credit_number = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(credit_number)
        .bind(excluding)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }
}

// ============================================================================
// Vendors
// ============================================================================

#[derive(Clone)]
pub struct PgVendorStore {
    db: PgPool,
}

impl PgVendorStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VendorStore for PgVendorStore {
    async fn get_vendor(&self, id: Uuid) -> AppResult<Option<Vendor>> {
        let row = sqlx::query_as::<_, (Uuid, String, Decimal)>(
            "SELECT id, display_name, payables FROM vendors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, display_name, payables)| Vendor {
            id,
            display_name,
            payables,
        }))
    }

    async fn set_payables(&self, id: Uuid, payables: Decimal) -> AppResult<()> {
        let result = sqlx::query("UPDATE vendors SET payables = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(payables)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vendor".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Store orders
// ============================================================================

#[derive(Clone)]
pub struct PgStoreOrderStore {
    db: PgPool,
}

impl PgStoreOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct StoreOrderRow {
    id: Uuid,
    order_number: String,
    store_warehouse: String,
    destination_warehouse: String,
    items: Json<Vec<StoreOrderLine>>,
    status: String,
    transfer_order_id: Option<Uuid>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreOrderRow> for StoreOrder {
    type Error = AppError;

    fn try_from(row: StoreOrderRow) -> AppResult<Self> {
        Ok(StoreOrder {
            status: StoreOrderStatus::from_str(&row.status)
                .ok_or_else(|| unknown_status("store order status", &row.status))?,
            id: row.id,
            order_number: row.order_number,
            store_warehouse: row.store_warehouse,
            destination_warehouse: row.destination_warehouse,
            items: row.items.0,
            transfer_order_id: row.transfer_order_id,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const STORE_ORDER_COLUMNS: &str = "id, order_number, store_warehouse, destination_warehouse, items, \
     status, transfer_order_id, rejection_reason, created_at, updated_at";

#[async_trait]
impl StoreOrderStore for PgStoreOrderStore {
    async fn insert_store_order(&self, order: &StoreOrder) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO store_orders (id, order_number, store_warehouse, destination_warehouse,
                                      items, status, transfer_order_id, rejection_reason,
                                      created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.store_warehouse)
        .bind(&order.destination_warehouse)
        .bind(Json(&order.items))
        .bind(order.status.as_str())
        .bind(order.transfer_order_id)
        .bind(&order.rejection_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_store_order(&self, order: &StoreOrder) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE store_orders
            SET items = $2, status = $3, transfer_order_id = $4, rejection_reason = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(Json(&order.items))
        .bind(order.status.as_str())
        .bind(order.transfer_order_id)
        .bind(&order.rejection_reason)
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Store order".to_string()));
        }
        Ok(())
    }

    async fn get_store_order(&self, id: Uuid) -> AppResult<Option<StoreOrder>> {
        let row = sqlx::query_as::<_, StoreOrderRow>(&format!(
            "SELECT {} FROM store_orders WHERE id = $1",
            STORE_ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(StoreOrder::try_from).transpose()
    }

    async fn list_store_orders(
        &self,
        status: Option<StoreOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<StoreOrder>, u64)> {
        let (limit, offset) = page_bounds(pagination);
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, StoreOrderRow>(&format!(
            "SELECT {} FROM store_orders WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            STORE_ORDER_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM store_orders WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let orders = rows
            .into_iter()
            .map(StoreOrder::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((orders, total as u64))
    }

    async fn delete_store_order(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM store_orders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Transfer orders
// ============================================================================

#[derive(Clone)]
pub struct PgTransferOrderStore {
    db: PgPool,
}

impl PgTransferOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct TransferOrderRow {
    id: Uuid,
    transfer_order_number: String,
    store_order_id: Option<Uuid>,
    source_warehouse: String,
    destination_warehouse: String,
    items: Json<Vec<TransferOrderLine>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransferOrderRow> for TransferOrder {
    type Error = AppError;

    fn try_from(row: TransferOrderRow) -> AppResult<Self> {
        Ok(TransferOrder {
            status: TransferOrderStatus::from_str(&row.status)
                .ok_or_else(|| unknown_status("transfer order status", &row.status))?,
            id: row.id,
            transfer_order_number: row.transfer_order_number,
            store_order_id: row.store_order_id,
            source_warehouse: row.source_warehouse,
            destination_warehouse: row.destination_warehouse,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TRANSFER_ORDER_COLUMNS: &str = "id, transfer_order_number, store_order_id, source_warehouse, \
     destination_warehouse, items, status, created_at, updated_at";

#[async_trait]
impl TransferOrderStore for PgTransferOrderStore {
    async fn insert_transfer_order(&self, order: &TransferOrder) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transfer_orders (id, transfer_order_number, store_order_id, source_warehouse,
                                         destination_warehouse, items, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id)
        .bind(&order.transfer_order_number)
        .bind(order.store_order_id)
        .bind(&order.source_warehouse)
        .bind(&order.destination_warehouse)
        .bind(Json(&order.items))
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_transfer_order(&self, order: &TransferOrder) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE transfer_orders SET items = $2, status = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(order.id)
        .bind(Json(&order.items))
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transfer order".to_string()));
        }
        Ok(())
    }

    async fn get_transfer_order(&self, id: Uuid) -> AppResult<Option<TransferOrder>> {
        let row = sqlx::query_as::<_, TransferOrderRow>(&format!(
            "SELECT {} FROM transfer_orders WHERE id = $1",
            TRANSFER_ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(TransferOrder::try_from).transpose()
    }

    async fn list_transfer_orders(
        &self,
        status: Option<TransferOrderStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<TransferOrder>, u64)> {
        let (limit, offset) = page_bounds(pagination);
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, TransferOrderRow>(&format!(
            "SELECT {} FROM transfer_orders WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            TRANSFER_ORDER_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transfer_orders WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let orders = rows
            .into_iter()
            .map(TransferOrder::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((orders, total as u64))
    }

    async fn delete_transfer_order(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM transfer_orders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Upstream purchasing documents (read-only)
// ============================================================================

#[derive(Clone)]
pub struct PgPurchaseDocumentReader {
    db: PgPool,
}

impl PgPurchaseDocumentReader {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PurchaseDocumentReader for PgPurchaseDocumentReader {
    async fn get_purchase_order(&self, id: Uuid) -> AppResult<Option<PurchaseOrder>> {
        let row = sqlx::query_as::<_, (Uuid, String, Option<Uuid>, String, String, Json<Vec<PurchaseOrderLine>>)>(
            r#"
            SELECT id, purchase_order_number, vendor_id, vendor_name, warehouse, items
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(
            |(id, purchase_order_number, vendor_id, vendor_name, warehouse, items)| PurchaseOrder {
                id,
                purchase_order_number,
                vendor_id,
                vendor_name,
                warehouse,
                items: items.0,
            },
        ))
    }

    async fn get_purchase_receive(&self, id: Uuid) -> AppResult<Option<PurchaseReceive>> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid, Option<String>, Json<Vec<ReceivedLine>>)>(
            r#"
            SELECT id, receive_number, purchase_order_id, warehouse, items
            FROM purchase_receives
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(
            |(id, receive_number, purchase_order_id, warehouse, items)| PurchaseReceive {
                id,
                receive_number,
                purchase_order_id,
                warehouse,
                items: items.0,
            },
        ))
    }
}

// ============================================================================
// Document numbers and activity history
// ============================================================================

#[derive(Clone)]
pub struct PgDocumentNumberGenerator {
    db: PgPool,
}

impl PgDocumentNumberGenerator {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentNumberGenerator for PgDocumentNumberGenerator {
    async fn next(&self, series: NumberSeries) -> AppResult<String> {
        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_counters (counter_id, value)
            VALUES ($1, 1)
            ON CONFLICT (counter_id) DO UPDATE SET value = document_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(series.counter_id())
        .fetch_one(&self.db)
        .await?;

        Ok(series.format(sequence))
    }
}

#[derive(Clone)]
pub struct PgActivityLog {
    db: PgPool,
}

impl PgActivityLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn log(&self, event: ActivityEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (entity_type, entity_id, action, user_id, description, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(&event.action)
        .bind(event.user_id)
        .bind(&event.description)
        .bind(event.occurred_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
