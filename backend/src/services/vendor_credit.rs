//! Vendor credit lifecycle
//!
//! The mirror image of a bill: opening a credit sends goods back (stock is
//! reduced) and lowers what the vendor is owed.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    document_total, validate_document_number, validate_line_items, validate_vendor_name,
    validate_warehouse_name, BillLineItem, DocumentOutcome, PaginatedResponse, Pagination,
    VendorCredit, VendorCreditStatus, WarehouseNameResolver,
};
use tracing::instrument;
use uuid::Uuid;

use super::document_effects::{DocumentEffects, EffectSnapshot, LedgerDirection};
use super::{StockLedger, VendorBalanceLedger};
use crate::error::{AppError, AppResult};
use crate::store::{record_activity, ActivityEvent, NumberSeries, Stores};

#[derive(Clone)]
pub struct VendorCreditService {
    stores: Stores,
    resolver: Arc<WarehouseNameResolver>,
    effects: DocumentEffects,
}

/// Input for creating or updating a vendor credit
#[derive(Debug, Clone, Deserialize)]
pub struct VendorCreditInput {
    /// Drawn from the VC series when omitted on create
    #[serde(default)]
    pub credit_number: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub items: Vec<BillLineItem>,
    #[serde(default = "default_status")]
    pub status: VendorCreditStatus,
    pub warehouse: String,
}

fn default_status() -> VendorCreditStatus {
    VendorCreditStatus::Draft
}

impl VendorCreditService {
    pub fn new(stores: Stores, resolver: Arc<WarehouseNameResolver>) -> Self {
        let stock = StockLedger::new(stores.items.clone(), resolver.clone());
        let payables = VendorBalanceLedger::new(stores.vendors.clone(), stores.documents.clone());
        Self {
            effects: DocumentEffects::new(stock, payables, LedgerDirection::Outbound),
            stores,
            resolver,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_credit(
        &self,
        user_id: Uuid,
        input: VendorCreditInput,
    ) -> AppResult<DocumentOutcome<VendorCredit>> {
        validate_input(&input)?;
        if !matches!(input.status, VendorCreditStatus::Draft | VendorCreditStatus::Open) {
            return Err(AppError::InvalidStateTransition(format!(
                "A new vendor credit cannot start as {}",
                input.status
            )));
        }

        let credit_number = match provided_number(&input)? {
            Some(number) => {
                if self
                    .stores
                    .vendor_credits
                    .credit_number_taken(user_id, &number, None)
                    .await?
                {
                    return Err(AppError::DuplicateDocumentNumber(number));
                }
                number
            }
            None => self.stores.numbers.next(NumberSeries::VendorCredit).await?,
        };

        let now = Utc::now();
        let items = priced(input.items);
        let credit = VendorCredit {
            id: Uuid::new_v4(),
            user_id,
            credit_number,
            vendor_id: input.vendor_id,
            vendor_name: input.vendor_name.trim().to_string(),
            final_total: document_total(&items),
            items,
            status: input.status,
            warehouse: self.resolver.normalize(&input.warehouse),
            created_at: now,
            updated_at: now,
        };

        self.stores.vendor_credits.insert_credit(&credit).await?;

        let mut warnings = Vec::new();
        self.effects
            .transition(None, effect_snapshot(&credit).as_ref(), &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "vendor_credit",
                credit.id,
                "created",
                format!("Vendor credit {} created as {}", credit.credit_number, credit.status),
            )
            .by(user_id),
        )
        .await;

        tracing::info!(
            credit_id = %credit.id,
            status = %credit.status,
            warnings = warnings.len(),
            "Vendor credit created"
        );
        Ok(DocumentOutcome::new(credit, warnings))
    }

    #[instrument(skip(self, input))]
    pub async fn update_credit(
        &self,
        user_id: Uuid,
        credit_id: Uuid,
        input: VendorCreditInput,
    ) -> AppResult<DocumentOutcome<VendorCredit>> {
        let existing = self.get_credit(user_id, credit_id).await?;

        if existing.status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "Vendor credit {} is {} and can no longer change",
                existing.credit_number, existing.status
            )));
        }
        if !existing.status.can_transition_to(input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Vendor credit cannot move from {} to {}",
                existing.status, input.status
            )));
        }
        validate_input(&input)?;

        let credit_number = provided_number(&input)?.unwrap_or_else(|| existing.credit_number.clone());
        if credit_number != existing.credit_number
            && self
                .stores
                .vendor_credits
                .credit_number_taken(user_id, &credit_number, Some(credit_id))
                .await?
        {
            return Err(AppError::DuplicateDocumentNumber(credit_number));
        }

        let items = priced(input.items);
        let updated = VendorCredit {
            credit_number,
            vendor_id: input.vendor_id,
            vendor_name: input.vendor_name.trim().to_string(),
            final_total: document_total(&items),
            items,
            status: input.status,
            warehouse: self.resolver.normalize(&input.warehouse),
            updated_at: Utc::now(),
            ..existing.clone()
        };

        self.stores.vendor_credits.update_credit(&updated).await?;

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
                "vendor_credit",
                updated.id,
                "updated",
                format!(
                    "Vendor credit {} updated ({} -> {})",
                    updated.credit_number, existing.status, updated.status
                ),
            )
            .by(user_id),
        )
        .await;

        Ok(DocumentOutcome::new(updated, warnings))
    }

    #[instrument(skip(self))]
    pub async fn delete_credit(
        &self,
        user_id: Uuid,
        credit_id: Uuid,
    ) -> AppResult<DocumentOutcome<VendorCredit>> {
        let existing = self.get_credit(user_id, credit_id).await?;

        if !self.stores.vendor_credits.delete_credit(user_id, credit_id).await? {
            return Err(AppError::NotFound("Vendor credit".to_string()));
        }

        let mut warnings = Vec::new();
        self.effects
            .transition(effect_snapshot(&existing).as_ref(), None, &mut warnings)
            .await;

        record_activity(
            self.stores.activity.as_ref(),
            ActivityEvent::new(
                "vendor_credit",
                existing.id,
                "deleted",
                format!("Vendor credit {} deleted", existing.credit_number),
            )
            .by(user_id),
        )
        .await;

        Ok(DocumentOutcome::new(existing, warnings))
    }

    pub async fn get_credit(&self, user_id: Uuid, credit_id: Uuid) -> AppResult<VendorCredit> {
        self.stores
            .vendor_credits
            .get_credit(user_id, credit_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor credit".to_string()))
    }

    pub async fn list_credits(
        &self,
        user_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<VendorCredit>> {
        let (credits, total) = self
            .stores
            .vendor_credits
            .list_credits(user_id, pagination)
            .await?;
        Ok(PaginatedResponse::new(credits, pagination, total))
    }
}

fn validate_input(input: &VendorCreditInput) -> AppResult<()> {
    validate_vendor_name(&input.vendor_name)
        .map_err(|msg| AppError::validation("vendor_name", msg))?;
    validate_warehouse_name(&input.warehouse)
        .map_err(|msg| AppError::validation("warehouse", msg))?;
    validate_line_items(&input.items).map_err(|msg| AppError::validation("items", msg))?;
    Ok(())
}

/// A user-supplied credit number, trimmed; blank counts as absent
fn provided_number(input: &VendorCreditInput) -> AppResult<Option<String>> {
    match input.credit_number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => {
            validate_document_number(number)
                .map_err(|msg| AppError::validation("credit_number", msg))?;
            Ok(Some(number.to_string()))
        }
        _ => Ok(None),
    }
}

fn priced(mut items: Vec<BillLineItem>) -> Vec<BillLineItem> {
    for item in &mut items {
        item.settle();
    }
    items
}

fn effect_snapshot(credit: &VendorCredit) -> Option<EffectSnapshot<'_>> {
    credit.status.holds_ledger_effects().then(|| EffectSnapshot {
        items: &credit.items,
        warehouse: &credit.warehouse,
        vendor_id: credit.vendor_id,
        total: credit.final_total,
        moves_stock: true,
    })
}
