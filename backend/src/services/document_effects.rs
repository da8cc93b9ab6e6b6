//! Ledger side effects shared by bills and vendor credits
//!
//! A document either holds its effects (stock moved, payables adjusted) or it
//! does not. Every transition is expressed as "before" and "after" snapshots
//! of the effect-holding state, and this module computes what has to move.

use rust_decimal::Decimal;
use shared::{diff_line_items, BillLineItem, ItemRef, OperationWarning};
use uuid::Uuid;

use super::{StockLedger, VendorBalanceLedger};

/// Direction goods and money travel when a document opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerDirection {
    /// Bills: stock comes in, the vendor is owed more
    Inbound,
    /// Vendor credits: stock goes back, the vendor is owed less
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockMove {
    Add,
    Reduce,
}

impl LedgerDirection {
    fn opening_move(self) -> StockMove {
        match self {
            LedgerDirection::Inbound => StockMove::Add,
            LedgerDirection::Outbound => StockMove::Reduce,
        }
    }

    fn closing_move(self) -> StockMove {
        match self.opening_move() {
            StockMove::Add => StockMove::Reduce,
            StockMove::Reduce => StockMove::Add,
        }
    }

    /// Signed payables change for a document total when it opens
    fn payables_change(self, total: Decimal) -> Decimal {
        match self {
            LedgerDirection::Inbound => total,
            LedgerDirection::Outbound => -total,
        }
    }
}

/// The parts of a document that drive ledger effects
#[derive(Debug, Clone, Copy)]
pub struct EffectSnapshot<'a> {
    pub items: &'a [BillLineItem],
    pub warehouse: &'a str,
    pub vendor_id: Option<Uuid>,
    pub total: Decimal,
    pub moves_stock: bool,
}

/// Applies document effects through the two ledgers
#[derive(Clone)]
pub struct DocumentEffects {
    stock: StockLedger,
    payables: VendorBalanceLedger,
    direction: LedgerDirection,
}

impl DocumentEffects {
    pub fn new(stock: StockLedger, payables: VendorBalanceLedger, direction: LedgerDirection) -> Self {
        Self {
            stock,
            payables,
            direction,
        }
    }

    /// Move from one effect-holding state to another.
    ///
    /// `None` means the document holds no effects on that side (draft,
    /// cancelled, not yet created or deleted).
    pub async fn transition(
        &self,
        before: Option<&EffectSnapshot<'_>>,
        after: Option<&EffectSnapshot<'_>>,
        warnings: &mut Vec<OperationWarning>,
    ) {
        match (before, after) {
            (None, None) => {}
            (None, Some(after)) => self.open(after, warnings).await,
            (Some(before), None) => self.close(before, warnings).await,
            (Some(before), Some(after)) => self.edit(before, after, warnings).await,
        }
    }

    async fn open(&self, doc: &EffectSnapshot<'_>, warnings: &mut Vec<OperationWarning>) {
        if doc.moves_stock {
            self.move_lines(doc.items, doc.warehouse, self.direction.opening_move(), warnings)
                .await;
        }
        self.payables
            .apply_change(doc.vendor_id, self.direction.payables_change(doc.total), warnings)
            .await;
    }

    async fn close(&self, doc: &EffectSnapshot<'_>, warnings: &mut Vec<OperationWarning>) {
        if doc.moves_stock {
            self.move_lines(doc.items, doc.warehouse, self.direction.closing_move(), warnings)
                .await;
        }
        self.payables
            .apply_change(doc.vendor_id, -self.direction.payables_change(doc.total), warnings)
            .await;
    }

    async fn edit(
        &self,
        before: &EffectSnapshot<'_>,
        after: &EffectSnapshot<'_>,
        warnings: &mut Vec<OperationWarning>,
    ) {
        let resolver = self.stock.resolver();
        let same_warehouse =
            resolver.normalize(before.warehouse) == resolver.normalize(after.warehouse);

        if before.moves_stock && same_warehouse {
            for delta in diff_line_items(before.items, after.items) {
                let direction = if delta.delta.is_sign_positive() {
                    self.direction.opening_move()
                } else {
                    self.direction.closing_move()
                };
                self.move_line(
                    &delta.line.item_ref(),
                    after.warehouse,
                    delta.delta.abs(),
                    direction,
                    warnings,
                )
                .await;
            }
        } else if before.moves_stock {
            self.move_lines(before.items, before.warehouse, self.direction.closing_move(), warnings)
                .await;
            self.move_lines(after.items, after.warehouse, self.direction.opening_move(), warnings)
                .await;
        }

        if before.vendor_id == after.vendor_id {
            let change = self.direction.payables_change(after.total - before.total);
            self.payables.apply_change(after.vendor_id, change, warnings).await;
        } else {
            self.payables
                .apply_change(
                    before.vendor_id,
                    -self.direction.payables_change(before.total),
                    warnings,
                )
                .await;
            self.payables
                .apply_change(after.vendor_id, self.direction.payables_change(after.total), warnings)
                .await;
        }
    }

    async fn move_lines(
        &self,
        items: &[BillLineItem],
        warehouse: &str,
        direction: StockMove,
        warnings: &mut Vec<OperationWarning>,
    ) {
        for line in items.iter().filter(|line| line.quantity > Decimal::ZERO) {
            self.move_line(&line.item_ref(), warehouse, line.quantity, direction, warnings)
                .await;
        }
    }

    async fn move_line(
        &self,
        item: &ItemRef,
        warehouse: &str,
        quantity: Decimal,
        direction: StockMove,
        warnings: &mut Vec<OperationWarning>,
    ) {
        let result = match direction {
            StockMove::Add => self.stock.add_stock(item, warehouse, quantity).await,
            StockMove::Reduce => self.stock.reduce_stock(item, warehouse, quantity).await,
        };
        if let Err(e) = result {
            let reference = item.describe();
            tracing::warn!(item = %reference, %warehouse, %quantity, "Line stock update failed: {}", e);
            warnings.push(e.as_warning(&reference));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_directions_are_inverse() {
        assert_eq!(LedgerDirection::Inbound.opening_move(), StockMove::Add);
        assert_eq!(LedgerDirection::Outbound.opening_move(), StockMove::Reduce);
        assert_eq!(LedgerDirection::Outbound.closing_move(), StockMove::Add);
        assert_eq!(LedgerDirection::Inbound.payables_change(dec!(10)), dec!(10));
        assert_eq!(LedgerDirection::Outbound.payables_change(dec!(10)), dec!(-10));
    }
}
