//! HTTP handlers for transfer orders

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{DocumentOutcome, PaginatedResponse, TransferOrder};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::store_order::{OrderListQuery, StoreOrderCoordinator};
use crate::AppState;

pub async fn list_transfer_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<PaginatedResponse<TransferOrder>>> {
    let coordinator = StoreOrderCoordinator::new(state.stores, state.resolver);
    Ok(Json(coordinator.list_transfer_orders(&query).await?))
}

pub async fn get_transfer_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_order_id): Path<Uuid>,
) -> AppResult<Json<TransferOrder>> {
    let coordinator = StoreOrderCoordinator::new(state.stores, state.resolver);
    Ok(Json(coordinator.get_transfer_order(transfer_order_id).await?))
}

/// Mark an in-transit transfer as received and move its stock
pub async fn complete_transfer_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(transfer_order_id): Path<Uuid>,
) -> AppResult<Json<DocumentOutcome<TransferOrder>>> {
    let coordinator = StoreOrderCoordinator::new(state.stores, state.resolver);
    Ok(Json(
        coordinator
            .complete_transfer(transfer_order_id, current_user.0.user_id)
            .await?,
    ))
}
