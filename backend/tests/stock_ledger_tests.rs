//! Stock ledger tests
//!
//! Item resolution order, warehouse-key reuse and the no-negative-stock rule.

mod common;

use branch_inventory_backend::error::AppError;
use branch_inventory_backend::services::StockLedger;
use common::{resolver, TestStores};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::ItemRef;

fn ledger(stores: &TestStores) -> StockLedger {
    StockLedger::new(stores.items.clone(), resolver())
}

#[tokio::test]
async fn test_add_stock_creates_canonical_record() {
    let stores = TestStores::new();
    let id = stores.items.add_item("Basmati 5kg", Some("BAS-5"), &[]).await;
    let ledger = ledger(&stores);

    let applied = ledger
        .add_stock(&ItemRef::standalone(id), "edapally", dec!(12))
        .await
        .unwrap();

    assert_eq!(applied.applied_warehouse, "Edappally Branch");
    assert_eq!(applied.stock_on_hand, dec!(12));
    assert_eq!(stores.items.on_hand(id, "Edappally Branch").await, dec!(12));
}

#[tokio::test]
async fn test_add_stock_reuses_legacy_spelling() {
    let stores = TestStores::new();
    let id = stores
        .items
        .add_item("Atta 10kg", None, &[("G.Edappally", dec!(5))])
        .await;
    let ledger = ledger(&stores);

    let applied = ledger
        .add_stock(&ItemRef::standalone(id), "Edappally Branch", dec!(3))
        .await
        .unwrap();

    // The historical key is kept; no second record appears
    assert_eq!(applied.applied_warehouse, "G.Edappally");
    let stocks = stores.items.item_stocks(id).await;
    assert_eq!(stocks.len(), 1);
    assert_eq!(stocks[0].stock_on_hand, dec!(8));
}

#[tokio::test]
async fn test_reduce_stock_refuses_to_go_negative() {
    let stores = TestStores::new();
    let id = stores
        .items
        .add_item("Sugar 1kg", Some("SUG-1"), &[("Warehouse", dec!(4))])
        .await;
    let ledger = ledger(&stores);

    let err = ledger
        .reduce_stock(&ItemRef::standalone(id), "Main Warehouse", dec!(10))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock(shortfall) => {
            assert_eq!(shortfall.available, dec!(4));
            assert_eq!(shortfall.requested, dec!(10));
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }
    assert_eq!(stores.items.on_hand(id, "Warehouse").await, dec!(4));
}

#[tokio::test]
async fn test_reduce_stock_without_record_is_insufficient() {
    let stores = TestStores::new();
    let id = stores.items.add_item("Salt", None, &[("Warehouse", dec!(4))]).await;
    let ledger = ledger(&stores);

    let err = ledger
        .reduce_stock(&ItemRef::standalone(id), "Kottayam Branch", dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(stores.items.item_stocks(id).await.len(), 1);
}

#[tokio::test]
async fn test_unknown_item_is_item_not_found() {
    let stores = TestStores::new();
    let ledger = ledger(&stores);

    let err = ledger
        .add_stock(&ItemRef::by_sku("NOPE-1"), "Warehouse", dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ItemNotFound(_)));

    let level = ledger
        .stock_level(&ItemRef::by_sku("NOPE-1"), "Warehouse")
        .await
        .unwrap();
    assert_eq!(level, Decimal::ZERO);
}

#[tokio::test]
async fn test_group_match_wins_over_standalone() {
    let stores = TestStores::new();
    // A standalone item shares the SKU of a group member
    let standalone = stores
        .items
        .add_item("Shirt M", Some("SH-M"), &[("Warehouse", dec!(0))])
        .await;
    let group = stores
        .items
        .add_group(
            "Shirts",
            vec![
                ("Shirt S", Some("SH-S"), vec![]),
                ("Shirt M", Some("SH-M"), vec![("Warehouse", dec!(20))]),
            ],
        )
        .await;
    let ledger = ledger(&stores);

    let item = ItemRef::grouped(group, "Shirt M", Some("SH-M".to_string()));
    let applied = ledger.add_stock(&item, "Warehouse", dec!(5)).await.unwrap();

    assert_eq!(applied.stock_on_hand, dec!(25));
    let member = stores.items.group_item_stocks(group, 1).await;
    assert_eq!(member[0].stock_on_hand, dec!(25));
    assert_eq!(stores.items.on_hand(standalone, "Warehouse").await, Decimal::ZERO);
    // Siblings are untouched
    assert!(stores.items.group_item_stocks(group, 0).await.is_empty());
}

#[tokio::test]
async fn test_name_falls_back_to_group_scan() {
    let stores = TestStores::new();
    let group = stores
        .items
        .add_group("Rice", vec![("Matta 10kg", None, vec![("Warehouse", dec!(8))])])
        .await;
    let ledger = ledger(&stores);

    let item = ItemRef {
        name: Some("matta 10kg".to_string()),
        ..Default::default()
    };
    let level = ledger.stock_level(&item, "WH").await.unwrap();
    assert_eq!(level, dec!(8));

    ledger.reduce_stock(&item, "Warehouse", dec!(3)).await.unwrap();
    assert_eq!(stores.items.group_item_stocks(group, 0).await[0].stock_on_hand, dec!(5));
}

#[tokio::test]
async fn test_composite_item_id_resolves_group_member() {
    let stores = TestStores::new();
    let group = stores
        .items
        .add_group(
            "Oil",
            vec![
                ("Oil 1L", None, vec![]),
                ("Oil 5L", None, vec![("Warehouse", dec!(2))]),
            ],
        )
        .await;
    let ledger = ledger(&stores);

    let item = ItemRef {
        item_id: Some(shared::group_item_key(group, 1)),
        ..Default::default()
    };
    assert_eq!(ledger.stock_level(&item, "Warehouse").await.unwrap(), dec!(2));
}

#[tokio::test]
async fn test_failed_save_leaves_stock_unchanged() {
    let stores = TestStores::new();
    let id = stores.items.add_item("Tea", None, &[("Warehouse", dec!(3))]).await;
    stores
        .items
        .fail_saves
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let ledger = ledger(&stores);

    assert!(ledger
        .add_stock(&ItemRef::standalone(id), "Warehouse", dec!(1))
        .await
        .is_err());
    assert_eq!(stores.items.on_hand(id, "Warehouse").await, dec!(3));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any sequence of adds and reductions keeps stock_on_hand >= 0 and
    /// equal to the running total of the operations that succeeded
    #[test]
    fn prop_stock_never_negative(ops in prop::collection::vec((any::<bool>(), 1u32..50), 1..20)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let stores = TestStores::new();
            let id = stores.items.add_item("Widget", None, &[]).await;
            let ledger = ledger(&stores);
            let item = ItemRef::standalone(id);

            let mut expected = Decimal::ZERO;
            for (add, qty) in ops {
                let qty = Decimal::from(qty);
                if add {
                    ledger.add_stock(&item, "Warehouse", qty).await.unwrap();
                    expected += qty;
                } else if ledger.reduce_stock(&item, "Warehouse", qty).await.is_ok() {
                    expected -= qty;
                }
                let level = ledger.stock_level(&item, "Warehouse").await.unwrap();
                assert!(level >= Decimal::ZERO);
                assert_eq!(level, expected);
            }
        });
    }
}
