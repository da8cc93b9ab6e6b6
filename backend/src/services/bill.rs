//! Purchase bill lifecycle
//!
//! Drives bills through `draft -> open -> {paid, cancelled}` (plus the
//! `open -> draft` reversal) and keeps stock and vendor payables in step.
//! Bills derived from purchase orders or receives never move stock; the
//! upstream document already did.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    bill_line_from_order, document_total, match_order_line, validate_document_number,
    validate_line_items, validate_vendor_name, validate_warehouse_name, Bill, BillLineItem,
    BillStatus, DocumentOutcome, OperationWarning, PaginatedResponse, Pagination, SourceType,
    WarehouseNameResolver, WarningKind,
};
use tracing::instrument;
use uuid::Uuid;

use super::document_effects::{DocumentEffects, EffectSnapshot, LedgerDirection};
use super::{StockLedger, VendorBalanceLedger};
use crate::error::{AppError, AppResult};
use crate::store::{record_activity, ActivityEvent, Stores};

/// Bill service
#[derive(Clone)]
pub struct BillService {
    stores: Stores,
    resolver: Arc<WarehouseNameResolver>,
    effects: DocumentEffects,
}

/// Input for creating or updating a bill
#[derive(Debug, Clone, Deserialize)]
pub struct BillInput {
    pub bill_number: String,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub items: Vec<BillLineItem>,
    #[serde(default = "default_status")]
    pub status: BillStatus,
    pub warehouse: String,
}

fn default_status() -> BillStatus {
    BillStatus::Draft
}

/// Input for deriving a bill from an upstream document
#[derive(Debug, Clone, Deserialize)]
pub struct DeriveBillInput {
    pub bill_number: String,
    #[serde(default = "default_status")]
    pub status: BillStatus,
}

impl BillService {
    pub fn new(stores: Stores, resolver: Arc<WarehouseNameResolver>) -> Self {
        let stock = StockLedger::new(stores.items.clone(), resolver.clone());
        let payables = VendorBalanceLedger::new(stores.vendors.clone(), stores.documents.clone());
        Self {
            effects: DocumentEffects::new(stock, payables, LedgerDirection::Inbound),
            stores,
            resolver,
        }
    }

    /// Create a bill; an `open` bill applies its effects immediately
    #[instrument(skip(self, input), fields(bill_number = %input.bill_number))]
    pub async fn create_bill(
        &self,
        user_id: Uuid,
        input: BillInput,
    ) -> AppResult<DocumentOutcome<Bill>> {
        validate_input(&input)?;
        if !matches!(input.status, BillStatus::Draft | BillStatus::Open) {
            return Err(AppError::InvalidStateTransition(format!(
                "A new bill cannot start as {}",
                input.status
            )));
        }

        let now = Utc::now();
        let items = priced(input.items);
        let bill = Bill {
            id: Uuid::new_v4(),
            user_id,
            bill_number: input.bill_number.trim().to_string(),
            vendor_id: input.vendor_id,
            vendor_name: input.vendor_name.trim().to_string(),
            final_total: document_total(&items),
            items,
            status: input.status,
            source_type: SourceType::Direct,
            warehouse: self.resolver.normalize(&input.warehouse),
            purchase_order_id: None,
            purchase_receive_id: None,
            created_at: now,
            updated_at: now,
        };

        self.persist_new(bill, Vec::new()).await
    }

    /// Edit a bill and/or move it along the state graph
    #[instrument(skip(self, input))]
    pub async fn update_bill(
        &self,
        user_id: Uuid,
        bill_id: Uuid,
        input: BillInput,
    ) -> AppResult<DocumentOutcome<Bill>> {
        let existing = self.get_bill(user_id, bill_id).await?;

        if existing.status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "Bill {} is {} and can no longer change",
                existing.bill_number, existing.status
            )));
        }
        if !existing.status.can_transition_to(input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Bill cannot move from {} to {}",
                existing.status, input.status
            )));
        }
        validate_input(&input)?;

        let bill_number = input.bill_number.trim().to_string();
        if bill_number != existing.bill_number
            && self
                .stores
                .bills
                .bill_number_taken(user_id, &bill_number, Some(bill_id))
                .await?
        {
            return Err(AppError::DuplicateDocumentNumber(bill_number));
        }

        let items = priced(input.items);
        let updated = Bill {
            bill_number,
            vendor_id: input.vendor_id,
            vendor_name: input.vendor_name.trim().to_string(),
            final_total: document_total(&items),
            items,
            status: input.status,
            warehouse: self.resolver.normalize(&input.warehouse),
            updated_at: Utc::now(),
            ..existing.clone()
        };

        self.stores.bills.update_bill(&updated).await?;

        let mut warnings = Vec::new();
        self.effects
            .transition(
                effect_snapshot(&existing).as_ref(),
                effect_snapshot(&updated).as_ref(),
                &mut warnings,
            )
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "bill",
                updated.id,
                "updated",
                format!(
                    "Bill {} updated ({} -> {})",
                    updated.bill_number, existing.status, updated.status
                ),
            )
            .by(user_id),
        )
        .await;

        tracing::info!(
            bill_id = %updated.id,
            from = %existing.status,
            to = %updated.status,
            warnings = warnings.len(),
            "Bill updated"
        );
        Ok(DocumentOutcome::new(updated, warnings))
    }

    /// Delete a bill, reversing its effects when it still holds them
    #[instrument(skip(self))]
    pub async fn delete_bill(&self, user_id: Uuid, bill_id: Uuid) -> AppResult<DocumentOutcome<Bill>> {
        let existing = self.get_bill(user_id, bill_id).await?;

        if !self.stores.bills.delete_bill(user_id, bill_id).await? {
            return Err(AppError::NotFound("Bill".to_string()));
        }

        let mut warnings = Vec::new();
        self.effects
            .transition(effect_snapshot(&existing).as_ref(), None, &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "bill",
                existing.id,
                "deleted",
                format!("Bill {} deleted", existing.bill_number),
            )
            .by(user_id),
        )
        .await;

        Ok(DocumentOutcome::new(existing, warnings))
    }

    pub async fn get_bill(&self, user_id: Uuid, bill_id: Uuid) -> AppResult<Bill> {
        self.stores
            .bills
            .get_bill(user_id, bill_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Bill".to_string()))
    }

    pub async fn list_bills(
        &self,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Bill>> {
        let (bills, total) = self.stores.bills.list_bills(user_id, pagination).await?;
        Ok(PaginatedResponse::new(bills, pagination, total))
    }

    /// Bill every ordered line of a purchase order at its ordered quantity
    #[instrument(skip(self, input))]
    pub async fn create_from_purchase_order(
        &self,
        user_id: Uuid,
        purchase_order_id: Uuid,
        input: DeriveBillInput,
    ) -> AppResult<DocumentOutcome<Bill>> {
        let order = self
            .stores
            .purchases
            .get_purchase_order(purchase_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items: Vec<BillLineItem> = order
            .items
            .iter()
            .map(|line| bill_line_from_order(line, line.identity(), line.quantity))
            .collect();

        let bill = self.derived_bill(
            user_id,
            input,
            DerivedSource {
                source_type: SourceType::FromPo,
                vendor_id: order.vendor_id,
                vendor_name: order.vendor_name,
                warehouse: order.warehouse,
                purchase_order_id: order.id,
                purchase_receive_id: None,
            },
            items,
        )?;

        self.persist_new(bill, Vec::new()).await
    }

    /// Bill the received quantities of a receive at the PO's prices
    #[instrument(skip(self, input))]
    pub async fn create_from_receive(
        &self,
        user_id: Uuid,
        receive_id: Uuid,
        input: DeriveBillInput,
    ) -> AppResult<DocumentOutcome<Bill>> {
        let receive = self
            .stores
            .purchases
            .get_purchase_receive(receive_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase receive".to_string()))?;
        let order = self
            .stores
            .purchases
            .get_purchase_order(receive.purchase_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let mut warnings = Vec::new();
        let mut items = Vec::new();
        for received in receive
            .items
            .iter()
            .filter(|line| line.received_quantity > Decimal::ZERO)
        {
            match match_order_line(received, &order.items) {
                Some(order_line) => items.push(bill_line_from_order(
                    order_line,
                    received.identity(),
                    received.received_quantity,
                )),
                None => {
                    tracing::warn!(
                        item = %received.item_name,
                        receive = %receive.receive_number,
                        "Received line has no matching purchase order line"
                    );
                    warnings.push(OperationWarning::new(
                        WarningKind::UnmatchedLine,
                        received.item_name.clone(),
                        format!(
                            "No line on {} matches this item; billed at rate 0",
                            order.purchase_order_number
                        ),
                    ));
                    let mut line = BillLineItem {
                        quantity: received.received_quantity,
                        ..received.identity()
                    };
                    line.reprice();
                    items.push(line);
                }
            }
        }
        if items.is_empty() {
            return Err(AppError::validation(
                "items",
                "Purchase receive has no received quantities to bill",
            ));
        }

        let bill = self.derived_bill(
            user_id,
            input,
            DerivedSource {
                source_type: SourceType::FromReceive,
                vendor_id: order.vendor_id,
                vendor_name: order.vendor_name,
                warehouse: receive.warehouse.unwrap_or(order.warehouse),
                purchase_order_id: order.id,
                purchase_receive_id: Some(receive.id),
            },
            items,
        )?;

        self.persist_new(bill, warnings).await
    }

    fn derived_bill(
        &self,
        user_id: Uuid,
        input: DeriveBillInput,
        source: DerivedSource,
        items: Vec<BillLineItem>,
    ) -> AppResult<Bill> {
        validate_document_number(&input.bill_number)
            .map_err(|msg| AppError::validation("bill_number", msg))?;
        if !matches!(input.status, BillStatus::Draft | BillStatus::Open) {
            return Err(AppError::InvalidStateTransition(format!(
                "A new bill cannot start as {}",
                input.status
            )));
        }

        let now = Utc::now();
        Ok(Bill {
            id: Uuid::new_v4(),
            user_id,
            bill_number: input.bill_number.trim().to_string(),
            vendor_id: source.vendor_id,
            vendor_name: source.vendor_name,
            final_total: document_total(&items),
            items,
            status: input.status,
            source_type: source.source_type,
            warehouse: self.resolver.normalize(&source.warehouse),
            purchase_order_id: Some(source.purchase_order_id),
            purchase_receive_id: source.purchase_receive_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Duplicate check, primary write, then effects for open bills
    async fn persist_new(
        &self,
        bill: Bill,
        mut warnings: Vec<OperationWarning>,
    ) -> AppResult<DocumentOutcome<Bill>> {
        if self
            .stores
            .bills
            .bill_number_taken(bill.user_id, &bill.bill_number, None)
            .await?
        {
            return Err(AppError::DuplicateDocumentNumber(bill.bill_number));
        }

        self.stores.bills.insert_bill(&bill).await?;

        self.effects
            .transition(None, effect_snapshot(&bill).as_ref(), &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "bill",
                bill.id,
                "created",
                format!(
                    "Bill {} created as {} ({})",
                    bill.bill_number,
                    bill.status,
                    bill.source_type.as_str()
                ),
            )
            .by(bill.user_id),
        )
        .await;

        tracing::info!(
            bill_id = %bill.id,
            status = %bill.status,
            total = %bill.final_total,
            warnings = warnings.len(),
            "Bill created"
        );
        Ok(DocumentOutcome::new(bill, warnings))
    }
}

struct DerivedSource {
    source_type: SourceType,
    vendor_id: Option<Uuid>,
    vendor_name: String,
    warehouse: String,
    purchase_order_id: Uuid,
    purchase_receive_id: Option<Uuid>,
}

fn validate_input(input: &BillInput) -> AppResult<()> {
    validate_document_number(&input.bill_number)
        .map_err(|msg| AppError::validation("bill_number", msg))?;
    validate_vendor_name(&input.vendor_name)
        .map_err(|msg| AppError::validation("vendor_name", msg))?;
    validate_warehouse_name(&input.warehouse)
        .map_err(|msg| AppError::validation("warehouse", msg))?;
    validate_line_items(&input.items).map_err(|msg| AppError::validation("items", msg))?;
    Ok(())
}

fn priced(mut items: Vec<BillLineItem>) -> Vec<BillLineItem> {
    for item in &mut items {
        item.settle();
    }
    items
}

/// The bill's effect-holding state, if it holds any
fn effect_snapshot(bill: &Bill) -> Option<EffectSnapshot<'_>> {
    bill.status.holds_ledger_effects().then(|| EffectSnapshot {
        items: &bill.items,
        warehouse: &bill.warehouse,
        vendor_id: bill.vendor_id,
        total: bill.final_total,
        moves_stock: bill.source_type.moves_stock(),
    })
}
