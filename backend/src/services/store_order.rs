//! Store order / transfer order coordination across the two stores
//!
//! The relational store is the source of truth; every record is mirrored into
//! the document store afterwards. Writes follow one protocol:
//! 1. primary write (failure aborts, compensating earlier primary writes)
//! 2. mirror write (failure is reported as a warning)

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_order_lines, validate_warehouse_name, DocumentOutcome, ItemRef, OperationWarning,
    PaginatedResponse, Pagination, StockShortfall, StoreOrder, StoreOrderLine, StoreOrderStatus,
    TransferOrder, TransferOrderLine, TransferOrderStatus, WarehouseNameResolver, WarningKind,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::StockLedger;
use crate::error::{AppError, AppResult};
use crate::store::document::mirror_document;
use crate::store::{collections, record_activity, ActivityEvent, NumberSeries, Stores};

/// Store order coordinator
#[derive(Clone)]
pub struct StoreOrderCoordinator {
    stores: Stores,
    resolver: Arc<WarehouseNameResolver>,
    stock: StockLedger,
}

/// Input for raising a store order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoreOrderInput {
    pub store_warehouse: String,
    pub items: Vec<StoreOrderLine>,
}

/// Input for rejecting a store order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectStoreOrderInput {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// List filter for store and transfer orders
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// An approved store order together with the transfer it produced
#[derive(Debug, Clone, Serialize)]
pub struct ApprovedStoreOrder {
    pub store_order: StoreOrder,
    pub transfer_order: TransferOrder,
}

impl StoreOrderCoordinator {
    pub fn new(stores: Stores, resolver: Arc<WarehouseNameResolver>) -> Self {
        Self {
            stock: StockLedger::new(stores.items.clone(), resolver.clone()),
            stores,
            resolver,
        }
    }

    /// Raise a store order against the central warehouse
    #[instrument(skip(self, input), fields(store = %input.store_warehouse))]
    pub async fn create_store_order(
        &self,
        input: CreateStoreOrderInput,
        requested_by: Uuid,
    ) -> AppResult<DocumentOutcome<StoreOrder>> {
        validate_warehouse_name(&input.store_warehouse)
            .map_err(|msg| AppError::validation("store_warehouse", msg))?;
        validate_order_lines(&input.items).map_err(|msg| AppError::validation("items", msg))?;

        let store_warehouse = self.resolver.normalize(&input.store_warehouse);
        if self.resolver.is_central(&store_warehouse) {
            return Err(AppError::validation(
                "store_warehouse",
                "The central warehouse cannot raise a store order against itself",
            ));
        }

        let mut items = input.items;
        for line in &mut items {
            line.current_stock = self.stock.stock_level(&line.item_ref(), &store_warehouse).await?;
        }

        let now = Utc::now();
        let order = StoreOrder {
            id: Uuid::new_v4(),
            order_number: self.stores.numbers.next(NumberSeries::StoreOrder).await?,
            store_warehouse,
            destination_warehouse: self.resolver.central().to_string(),
            items,
            status: StoreOrderStatus::Pending,
            transfer_order_id: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.stores.store_orders.insert_store_order(&order).await?;

        let mut warnings = Vec::new();
        self.mirror(collections::STORE_ORDERS, order.id, &order, &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "store_order",
                order.id,
                "created",
                format!("Store order {} raised by {}", order.order_number, order.store_warehouse),
            )
            .by(requested_by),
        )
        .await;

        tracing::info!(order_number = %order.order_number, "Store order created");
        Ok(DocumentOutcome::new(order, warnings))
    }

    /// Approve a pending order and create its transfer order.
    ///
    /// Every positive line must be covered by central stock; otherwise the
    /// whole approval is refused with the shortfall list.
    #[instrument(skip(self))]
    pub async fn approve_store_order(
        &self,
        store_order_id: Uuid,
        approved_by: Uuid,
    ) -> AppResult<DocumentOutcome<ApprovedStoreOrder>> {
        let mut order = self.get_store_order(store_order_id).await?;
        if !order.status.can_decide() {
            return Err(AppError::InvalidStateTransition(format!(
                "Store order {} is {}; only pending orders can be approved",
                order.order_number, order.status
            )));
        }

        let central = self.resolver.central().to_string();
        let requested: Vec<&StoreOrderLine> = order
            .items
            .iter()
            .filter(|line| line.quantity > Decimal::ZERO)
            .collect();

        let mut shortfalls = Vec::new();
        for (item, quantity) in self.demand_by_item(&requested).await? {
            let available = self.stock.stock_level(&item, &central).await?;
            if available < quantity {
                shortfalls.push(StockShortfall::new(
                    item.describe(),
                    central.clone(),
                    available,
                    quantity,
                ));
            }
        }
        if !shortfalls.is_empty() {
            tracing::info!(
                order_number = %order.order_number,
                short_lines = shortfalls.len(),
                "Store order approval blocked by insufficient central stock"
            );
            return Err(AppError::ApprovalBlocked(shortfalls));
        }

        let now = Utc::now();
        let transfer = TransferOrder {
            id: Uuid::new_v4(),
            transfer_order_number: self.stores.numbers.next(NumberSeries::TransferOrder).await?,
            store_order_id: Some(order.id),
            source_warehouse: central,
            destination_warehouse: order.store_warehouse.clone(),
            items: requested.into_iter().map(TransferOrderLine::from).collect(),
            status: TransferOrderStatus::InTransit,
            created_at: now,
            updated_at: now,
        };

        let mut warnings = Vec::new();

        self.stores
            .transfer_orders
            .insert_transfer_order(&transfer)
            .await?;
        self.mirror(collections::TRANSFER_ORDERS, transfer.id, &transfer, &mut warnings)
            .await;

        order.status = StoreOrderStatus::Approved;
        order.transfer_order_id = Some(transfer.id);
        order.updated_at = now;

        if let Err(e) = self.stores.store_orders.update_store_order(&order).await {
            tracing::error!(
                order_number = %order.order_number,
                "Store order update failed after transfer creation; compensating: {}",
                e
            );
            self.compensate_transfer(&transfer).await;
            return Err(e);
        }
        self.mirror(collections::STORE_ORDERS, order.id, &order, &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "store_order",
                order.id,
                "approved",
                format!(
                    "Store order {} approved as transfer {}",
                    order.order_number, transfer.transfer_order_number
                ),
            )
            .by(approved_by),
        )
        .await;

        tracing::info!(
            order_number = %order.order_number,
            transfer_number = %transfer.transfer_order_number,
            warnings = warnings.len(),
            "Store order approved"
        );
        Ok(DocumentOutcome::new(
            ApprovedStoreOrder {
                store_order: order,
                transfer_order: transfer,
            },
            warnings,
        ))
    }

    #[instrument(skip(self, reason))]
    pub async fn reject_store_order(
        &self,
        store_order_id: Uuid,
        reason: Option<String>,
        rejected_by: Uuid,
    ) -> AppResult<DocumentOutcome<StoreOrder>> {
        let mut order = self.get_store_order(store_order_id).await?;
        if !order.status.can_decide() {
            return Err(AppError::InvalidStateTransition(format!(
                "Store order {} is {}; only pending orders can be rejected",
                order.order_number, order.status
            )));
        }

        order.status = StoreOrderStatus::Rejected;
        order.rejection_reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        order.updated_at = Utc::now();

        self.stores.store_orders.update_store_order(&order).await?;

        let mut warnings = Vec::new();
        self.mirror(collections::STORE_ORDERS, order.id, &order, &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "store_order",
                order.id,
                "rejected",
                format!("Store order {} rejected", order.order_number),
            )
            .by(rejected_by),
        )
        .await;

        Ok(DocumentOutcome::new(order, warnings))
    }

    #[instrument(skip(self))]
    pub async fn delete_store_order(
        &self,
        store_order_id: Uuid,
        deleted_by: Uuid,
    ) -> AppResult<DocumentOutcome<StoreOrder>> {
        let order = self.get_store_order(store_order_id).await?;
        if !order.status.can_delete() {
            return Err(AppError::InvalidStateTransition(format!(
                "Store order {} is {}; only pending or rejected orders can be deleted",
                order.order_number, order.status
            )));
        }

        if !self.stores.store_orders.delete_store_order(order.id).await? {
            return Err(AppError::NotFound("Store order".to_string()));
        }

        let mut warnings = Vec::new();
        self.unmirror(collections::STORE_ORDERS, order.id, &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "store_order",
                order.id,
                "deleted",
                format!("Store order {} deleted", order.order_number),
            )
            .by(deleted_by),
        )
        .await;

        Ok(DocumentOutcome::new(order, warnings))
    }

    pub async fn get_store_order(&self, store_order_id: Uuid) -> AppResult<StoreOrder> {
        self.stores
            .store_orders
            .get_store_order(store_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store order".to_string()))
    }

    pub async fn list_store_orders(
        &self,
        query: &OrderListQuery,
    ) -> AppResult<PaginatedResponse<StoreOrder>> {
        let status = match query.status.as_deref() {
            Some(s) => Some(
                StoreOrderStatus::from_str(s)
                    .ok_or_else(|| AppError::validation("status", format!("Unknown status '{}'", s)))?,
            ),
            None => None,
        };
        let pagination = query.pagination();
        let (orders, total) = self
            .stores
            .store_orders
            .list_store_orders(status, &pagination)
            .await?;
        Ok(PaginatedResponse::new(orders, &pagination, total))
    }

    pub async fn get_transfer_order(&self, transfer_order_id: Uuid) -> AppResult<TransferOrder> {
        self.stores
            .transfer_orders
            .get_transfer_order(transfer_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer order".to_string()))
    }

    pub async fn list_transfer_orders(
        &self,
        query: &OrderListQuery,
    ) -> AppResult<PaginatedResponse<TransferOrder>> {
        let status = match query.status.as_deref() {
            Some(s) => Some(
                TransferOrderStatus::from_str(s)
                    .ok_or_else(|| AppError::validation("status", format!("Unknown status '{}'", s)))?,
            ),
            None => None,
        };
        let pagination = query.pagination();
        let (orders, total) = self
            .stores
            .transfer_orders
            .list_transfer_orders(status, &pagination)
            .await?;
        Ok(PaginatedResponse::new(orders, &pagination, total))
    }

    /// Receive an in-transit transfer: stock leaves the source and lands at
    /// the destination line by line.
    ///
    /// Both primary status writes happen before any stock moves: a failed
    /// write leaves the transfer in transit with nothing moved, and a
    /// completed transfer can never move its stock a second time.
    #[instrument(skip(self))]
    pub async fn complete_transfer(
        &self,
        transfer_order_id: Uuid,
        received_by: Uuid,
    ) -> AppResult<DocumentOutcome<TransferOrder>> {
        let mut transfer = self.get_transfer_order(transfer_order_id).await?;
        if transfer.status != TransferOrderStatus::InTransit {
            return Err(AppError::InvalidStateTransition(format!(
                "Transfer order {} is {}; only in-transit transfers can be completed",
                transfer.transfer_order_number, transfer.status
            )));
        }

        let now = Utc::now();
        transfer.status = TransferOrderStatus::Transferred;
        transfer.updated_at = now;
        self.stores
            .transfer_orders
            .update_transfer_order(&transfer)
            .await?;

        let linked = match transfer.store_order_id {
            Some(store_order_id) => self.stores.store_orders.get_store_order(store_order_id).await?,
            None => None,
        };
        let linked = match linked {
            Some(mut order) => {
                order.status = StoreOrderStatus::Transferred;
                order.updated_at = now;
                if let Err(e) = self.stores.store_orders.update_store_order(&order).await {
                    tracing::error!(
                        transfer_number = %transfer.transfer_order_number,
                        "Store order update failed before stock moved; reopening transfer: {}",
                        e
                    );
                    self.reopen_transfer(&mut transfer).await;
                    return Err(e);
                }
                Some(order)
            }
            None => {
                if let Some(store_order_id) = transfer.store_order_id {
                    tracing::warn!(%store_order_id, "Linked store order no longer exists");
                }
                None
            }
        };

        let mut warnings = Vec::new();
        for line in transfer.items.iter().filter(|l| l.quantity > Decimal::ZERO) {
            self.move_line(&transfer, &line.item_ref(), line.quantity, &mut warnings)
                .await;
        }

        self.mirror(collections::TRANSFER_ORDERS, transfer.id, &transfer, &mut warnings)
            .await;
        if let Some(order) = &linked {
            self.mirror(collections::STORE_ORDERS, order.id, order, &mut warnings)
                .await;
        }

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "transfer_order",
                transfer.id,
                "transferred",
                format!(
                    "Transfer {} received at {}",
                    transfer.transfer_order_number, transfer.destination_warehouse
                ),
            )
            .by(received_by),
        )
        .await;

        Ok(DocumentOutcome::new(transfer, warnings))
    }

    /// Positive quantities summed per resolved item, in first-seen order.
    ///
    /// Lines that resolve to nothing are keyed by their description.
    async fn demand_by_item(
        &self,
        lines: &[&StoreOrderLine],
    ) -> AppResult<Vec<(ItemRef, Decimal)>> {
        let mut demand: Vec<(String, ItemRef, Decimal)> = Vec::new();
        for line in lines {
            let item = line.item_ref();
            let key = match self.stock.resolve(&item).await? {
                Some(resolved) => resolved.key(),
                None => item.describe().to_lowercase(),
            };
            match demand.iter_mut().find(|(seen, _, _)| *seen == key) {
                Some((_, _, quantity)) => *quantity += line.quantity,
                None => demand.push((key, item, line.quantity)),
            }
        }
        Ok(demand
            .into_iter()
            .map(|(_, item, quantity)| (item, quantity))
            .collect())
    }

    /// Move one line from source to destination.
    ///
    /// A failed destination add puts the quantity back at the source.
    async fn move_line(
        &self,
        transfer: &TransferOrder,
        item: &ItemRef,
        quantity: Decimal,
        warnings: &mut Vec<OperationWarning>,
    ) {
        let reference = item.describe();

        if let Err(e) = self
            .stock
            .reduce_stock(item, &transfer.source_warehouse, quantity)
            .await
        {
            tracing::warn!(item = %reference, "Transfer source reduction failed: {}", e);
            warnings.push(e.as_warning(&reference));
            return;
        }

        let Err(e) = self
            .stock
            .add_stock(item, &transfer.destination_warehouse, quantity)
            .await
        else {
            return;
        };
        tracing::warn!(item = %reference, "Transfer destination add failed: {}", e);
        warnings.push(e.as_warning(&reference));

        if let Err(restore) = self
            .stock
            .add_stock(item, &transfer.source_warehouse, quantity)
            .await
        {
            tracing::error!(
                item = %reference,
                %quantity,
                source = %transfer.source_warehouse,
                "Could not return stock to the transfer source: {}",
                restore
            );
            warnings.push(restore.as_warning(&reference));
        }
    }

    async fn mirror<T: Serialize>(
        &self,
        collection: &str,
        id: Uuid,
        record: &T,
        warnings: &mut Vec<OperationWarning>,
    ) {
        let result = match mirror_document(id, record) {
            Ok(document) => {
                self.stores
                    .documents
                    .put(collection, &id.to_string(), document)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(%id, collection, "Mirror write failed: {}", e);
            warnings.push(OperationWarning::new(
                WarningKind::SecondaryStoreWrite,
                id.to_string(),
                AppError::SecondaryStoreWrite(e.to_string()).to_string(),
            ));
        }
    }

    async fn unmirror(&self, collection: &str, id: Uuid, warnings: &mut Vec<OperationWarning>) {
        if let Err(e) = self.stores.documents.delete(collection, &id.to_string()).await {
            tracing::warn!(%id, collection, "Mirror delete failed: {}", e);
            warnings.push(OperationWarning::new(
                WarningKind::SecondaryStoreWrite,
                id.to_string(),
                AppError::SecondaryStoreWrite(e.to_string()).to_string(),
            ));
        }
    }

    /// Put a transfer back in transit after its store order could not follow
    async fn reopen_transfer(&self, transfer: &mut TransferOrder) {
        transfer.status = TransferOrderStatus::InTransit;
        transfer.updated_at = Utc::now();
        if let Err(e) = self
            .stores
            .transfer_orders
            .update_transfer_order(transfer)
            .await
        {
            tracing::error!(
                transfer_id = %transfer.id,
                "Reopening transfer order failed: {}",
                e
            );
        }
    }

    /// Undo a transfer order whose store order could not be linked
    async fn compensate_transfer(&self, transfer: &TransferOrder) {
        if let Err(e) = self
            .stores
            .transfer_orders
            .delete_transfer_order(transfer.id)
            .await
        {
            tracing::error!(
                transfer_id = %transfer.id,
                "Compensating delete of transfer order failed: {}",
                e
            );
        }
        let mut ignored = Vec::new();
        self.unmirror(collections::TRANSFER_ORDERS, transfer.id, &mut ignored)
            .await;
    }
}
