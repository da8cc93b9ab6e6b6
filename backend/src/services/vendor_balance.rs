//! Vendor payables across the relational and legacy document stores

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{OperationWarning, PayablesOp, WarningKind};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{collections, DocumentStore, VendorStore};

/// Vendor balance ledger
#[derive(Clone)]
pub struct VendorBalanceLedger {
    vendors: Arc<dyn VendorStore>,
    legacy: Arc<dyn DocumentStore>,
}

impl VendorBalanceLedger {
    pub fn new(vendors: Arc<dyn VendorStore>, legacy: Arc<dyn DocumentStore>) -> Self {
        Self { vendors, legacy }
    }

    /// Apply `op` to a vendor's payables and return the new balance.
    ///
    /// The relational vendor wins; legacy documents are only consulted when
    /// the vendor predates the migration.
    #[instrument(skip(self))]
    pub async fn adjust_payables(
        &self,
        vendor_id: Uuid,
        amount: Decimal,
        op: PayablesOp,
    ) -> AppResult<Decimal> {
        if let Some(vendor) = self.vendors.get_vendor(vendor_id).await? {
            let balance = op.apply(vendor.payables, amount);
            self.vendors.set_payables(vendor_id, balance).await?;
            tracing::debug!(%vendor_id, %balance, "Payables updated");
            return Ok(balance);
        }

        let key = vendor_id.to_string();
        let mut document = self
            .legacy
            .get(collections::VENDORS, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vendor {}", vendor_id)))?;

        let current = match document.get("payables") {
            Some(value) if !value.is_null() => serde_json::from_value::<Decimal>(value.clone())?,
            _ => Decimal::ZERO,
        };
        let balance = op.apply(current, amount);

        if let serde_json::Value::Object(map) = &mut document {
            map.insert("payables".to_string(), serde_json::to_value(balance)?);
        }
        self.legacy.put(collections::VENDORS, &key, document).await?;
        tracing::debug!(%vendor_id, %balance, "Legacy vendor payables updated");
        Ok(balance)
    }

    /// Adjust by a signed change; failures become a warning
    pub async fn apply_change(
        &self,
        vendor_id: Option<Uuid>,
        change: Decimal,
        warnings: &mut Vec<OperationWarning>,
    ) {
        let Some(vendor_id) = vendor_id else {
            return;
        };
        if change.is_zero() {
            return;
        }

        let (op, amount) = PayablesOp::for_change(change);
        if let Err(e) = self.adjust_payables(vendor_id, amount, op).await {
            tracing::warn!(%vendor_id, %change, "Vendor balance update failed: {}", e);
            warnings.push(OperationWarning::new(
                WarningKind::VendorBalance,
                vendor_id.to_string(),
                e.to_string(),
            ));
        }
    }
}
