//! Document line items, tax math and edit diffing

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemRef;

/// A priced line on a bill or vendor credit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillLineItem {
    pub item_id: Option<String>,
    pub item_group_id: Option<Uuid>,
    pub item_sku: Option<String>,
    pub item_name: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    /// When absent the matching amount is taken as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgst_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sgst_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub igst_percent: Option<Decimal>,
    #[serde(default)]
    pub base_amount: Decimal,
    #[serde(default)]
    pub cgst_amount: Decimal,
    #[serde(default)]
    pub sgst_amount: Decimal,
    #[serde(default)]
    pub igst_amount: Decimal,
    #[serde(default)]
    pub line_tax_total: Decimal,
    #[serde(default)]
    pub line_total: Decimal,
}

/// Round a money amount to 2 decimals, halves away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    round_money(base * percent / Decimal::ONE_HUNDRED)
}

impl BillLineItem {
    /// Recompute every amount from quantity, rate and tax percentages.
    ///
    /// Each tax component is rounded on its own before being summed. A
    /// missing percentage counts as zero.
    pub fn reprice(&mut self) {
        self.base_amount = self.quantity * self.rate;
        self.cgst_amount = percent_of(self.base_amount, self.cgst_percent.unwrap_or_default());
        self.sgst_amount = percent_of(self.base_amount, self.sgst_percent.unwrap_or_default());
        self.igst_amount = percent_of(self.base_amount, self.igst_percent.unwrap_or_default());
        self.totalize();
    }

    /// Settle a line entered by hand.
    ///
    /// The base follows quantity and rate. A tax component is recomputed only
    /// when its percentage was given; otherwise the sent amount stands.
    pub fn settle(&mut self) {
        self.base_amount = self.quantity * self.rate;
        if let Some(percent) = self.cgst_percent {
            self.cgst_amount = percent_of(self.base_amount, percent);
        }
        if let Some(percent) = self.sgst_percent {
            self.sgst_amount = percent_of(self.base_amount, percent);
        }
        if let Some(percent) = self.igst_percent {
            self.igst_amount = percent_of(self.base_amount, percent);
        }
        self.totalize();
    }

    fn totalize(&mut self) {
        self.line_tax_total = self.cgst_amount + self.sgst_amount + self.igst_amount;
        self.line_total = self.base_amount + self.line_tax_total;
    }

    /// The identifiers used to find the backing item
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            item_id: self.item_id.clone().filter(|id| !id.trim().is_empty()),
            group_id: self.item_group_id,
            name: Some(self.item_name.clone()).filter(|n| !n.trim().is_empty()),
            sku: self.item_sku.clone().filter(|s| !s.trim().is_empty()),
        }
    }

    /// Identity used when diffing two versions of a document
    pub fn identity_key(&self) -> LineKey {
        match self.item_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => LineKey::Item(id.to_string()),
            _ => LineKey::Composite {
                group_id: self.item_group_id,
                name: self.item_name.trim().to_lowercase(),
                sku: self
                    .item_sku
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_lowercase(),
            },
        }
    }
}

/// Sum of line totals
pub fn document_total(items: &[BillLineItem]) -> Decimal {
    items.iter().map(|item| item.line_total).sum()
}

/// Identity of a line across document edits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum LineKey {
    Item(String),
    Composite {
        group_id: Option<Uuid>,
        name: String,
        sku: String,
    },
}

/// Quantity change for one line identity between two document versions
#[derive(Debug, Clone, PartialEq)]
pub struct LineDelta {
    pub key: LineKey,
    /// Latest version of the line (from the new list when present)
    pub line: BillLineItem,
    /// `new - old`; positive means more stock was received
    pub delta: Decimal,
}

/// Diff two line lists by identity key.
///
/// Quantities for repeated keys are summed. Lines only present in `old`
/// come back with their full quantity negated. Zero deltas are dropped.
/// Order follows first appearance in `old`, then `new`.
pub fn diff_line_items(old: &[BillLineItem], new: &[BillLineItem]) -> Vec<LineDelta> {
    let mut deltas: Vec<LineDelta> = Vec::new();

    let mut entry = |line: &BillLineItem, quantity: Decimal, prefer_line: bool| {
        let key = line.identity_key();
        match deltas.iter_mut().find(|d| d.key == key) {
            Some(existing) => {
                existing.delta += quantity;
                if prefer_line {
                    existing.line = line.clone();
                }
            }
            None => deltas.push(LineDelta {
                key,
                line: line.clone(),
                delta: quantity,
            }),
        }
    };

    for line in old {
        entry(line, -line.quantity, false);
    }
    for line in new {
        entry(line, line.quantity, true);
    }

    deltas.retain(|d| !d.delta.is_zero());
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(id: &str, quantity: Decimal) -> BillLineItem {
        BillLineItem {
            item_id: Some(id.to_string()),
            item_name: id.to_string(),
            quantity,
            ..Default::default()
        }
    }

    #[test]
    fn test_reprice_rounds_each_component() {
        let mut item = BillLineItem {
            item_name: "Rice 5kg".to_string(),
            quantity: dec!(3),
            rate: dec!(33.35),
            cgst_percent: Some(dec!(2.5)),
            sgst_percent: Some(dec!(2.5)),
            ..Default::default()
        };
        item.reprice();
        assert_eq!(item.base_amount, dec!(100.05));
        // 2.50125 rounds to 2.50 per component
        assert_eq!(item.cgst_amount, dec!(2.50));
        assert_eq!(item.sgst_amount, dec!(2.50));
        assert_eq!(item.line_tax_total, dec!(5.00));
        assert_eq!(item.line_total, dec!(105.05));
    }

    #[test]
    fn test_settle_keeps_sent_amounts_without_percentages() {
        let mut item = BillLineItem {
            item_name: "Basmati 5kg".to_string(),
            quantity: dec!(1),
            rate: dec!(100),
            cgst_amount: dec!(9),
            sgst_amount: dec!(9),
            igst_percent: Some(dec!(5)),
            igst_amount: dec!(1234),
            ..Default::default()
        };
        item.settle();
        assert_eq!(item.base_amount, dec!(100));
        assert_eq!(item.cgst_amount, dec!(9));
        assert_eq!(item.sgst_amount, dec!(9));
        assert_eq!(item.igst_amount, dec!(5.00));
        assert_eq!(item.line_tax_total, dec!(23.00));
        assert_eq!(item.line_total, dec!(123.00));
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
        assert_eq!(round_money(dec!(0.135)), dec!(0.14));
    }

    #[test]
    fn test_diff_changed_removed_added() {
        let old = vec![line("A", dec!(5)), line("B", dec!(3))];
        let new = vec![line("A", dec!(8)), line("C", dec!(2))];
        let deltas: Vec<(LineKey, Decimal)> = diff_line_items(&old, &new)
            .into_iter()
            .map(|d| (d.key, d.delta))
            .collect();
        assert_eq!(
            deltas,
            vec![
                (LineKey::Item("A".to_string()), dec!(3)),
                (LineKey::Item("B".to_string()), dec!(-3)),
                (LineKey::Item("C".to_string()), dec!(2)),
            ]
        );
    }

    #[test]
    fn test_diff_sums_repeated_keys_and_drops_zero() {
        let old = vec![line("A", dec!(2)), line("A", dec!(3))];
        let new = vec![line("A", dec!(5))];
        assert!(diff_line_items(&old, &new).is_empty());
    }

    #[test]
    fn test_identity_key_falls_back_to_composite() {
        let group = Uuid::new_v4();
        let a = BillLineItem {
            item_group_id: Some(group),
            item_name: "Shirt M ".to_string(),
            item_sku: Some("SH-M".to_string()),
            ..Default::default()
        };
        let b = BillLineItem {
            item_id: Some("  ".to_string()),
            item_group_id: Some(group),
            item_name: "shirt m".to_string(),
            item_sku: Some("sh-m".to_string()),
            ..Default::default()
        };
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_amount_only_line_from_json() {
        let mut item: BillLineItem = serde_json::from_value(serde_json::json!({
            "item_id": "X1",
            "item_group_id": null,
            "item_sku": null,
            "item_name": "Basmati 5kg",
            "quantity": "1",
            "rate": "100",
            "cgst_amount": "9",
            "sgst_amount": "9",
            "line_total": "118"
        }))
        .unwrap();
        assert_eq!(item.cgst_percent, None);

        item.settle();
        assert_eq!(document_total(&[item.clone()]), dec!(118));

        let wire = serde_json::to_value(&item).unwrap();
        assert!(wire.get("cgst_percent").is_none());
    }

    fn lines_from(quantities: &[(usize, i64)]) -> Vec<BillLineItem> {
        quantities
            .iter()
            .map(|(key, quantity)| line(&format!("K{}", key), Decimal::from(*quantity)))
            .collect()
    }

    fn total_for(lines: &[BillLineItem], key: &LineKey) -> Decimal {
        lines
            .iter()
            .filter(|l| &l.identity_key() == key)
            .map(|l| l.quantity)
            .sum()
    }

    proptest! {
        #[test]
        fn prop_diff_moves_exactly_the_difference(
            old in prop::collection::vec((0usize..4, 0i64..50), 0..6),
            new in prop::collection::vec((0usize..4, 0i64..50), 0..6),
        ) {
            let old = lines_from(&old);
            let new = lines_from(&new);
            let deltas = diff_line_items(&old, &new);

            for key in (0..4).map(|k| LineKey::Item(format!("K{}", k))) {
                let expected = total_for(&new, &key) - total_for(&old, &key);
                let moved: Decimal = deltas
                    .iter()
                    .filter(|d| d.key == key)
                    .map(|d| d.delta)
                    .sum();
                prop_assert_eq!(moved, expected);
            }
            prop_assert!(deltas.iter().all(|d| !d.delta.is_zero()));
        }
    }
}
