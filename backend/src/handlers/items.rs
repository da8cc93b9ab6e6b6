//! HTTP handlers for item stock reads

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{ItemRef, WarehouseStockRecord};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::StockLedger;
use crate::AppState;

/// Any combination of identifiers a document line might carry
#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub item_id: Option<String>,
    pub group_id: Option<Uuid>,
    pub name: Option<String>,
    pub sku: Option<String>,
    /// Restrict to one warehouse (any spelling)
    pub warehouse: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemStockResponse {
    pub item: String,
    pub warehouse_stocks: Vec<WarehouseStockRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_on_hand: Option<Decimal>,
}

/// Resolve an item the way documents do and report its stock
pub async fn get_item_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<ItemStockResponse>> {
    let item = ItemRef {
        item_id: query.item_id,
        group_id: query.group_id,
        name: query.name,
        sku: query.sku,
    };
    let ledger = StockLedger::new(state.stores.items.clone(), state.resolver.clone());
    let resolved = ledger
        .resolve(&item)
        .await?
        .ok_or_else(|| AppError::ItemNotFound(item.describe()))?;

    let (warehouse, stock_on_hand) = match query.warehouse.as_deref() {
        Some(raw) => {
            let level = ledger.stock_level(&item, raw).await?;
            (Some(state.resolver.normalize(raw)), Some(level))
        }
        None => (None, None),
    };

    Ok(Json(ItemStockResponse {
        item: resolved.label(),
        warehouse_stocks: resolved.stocks().to_vec(),
        warehouse,
        stock_on_hand,
    }))
}
