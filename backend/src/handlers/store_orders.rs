//! HTTP handlers for store orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{DocumentOutcome, PaginatedResponse, StoreOrder};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::store_order::{
    ApprovedStoreOrder, CreateStoreOrderInput, OrderListQuery, RejectStoreOrderInput,
    StoreOrderCoordinator,
};
use crate::AppState;

fn coordinator(state: &AppState) -> StoreOrderCoordinator {
    StoreOrderCoordinator::new(state.stores.clone(), state.resolver.clone())
}

pub async fn list_store_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<PaginatedResponse<StoreOrder>>> {
    let orders = coordinator(&state).list_store_orders(&query).await?;
    Ok(Json(orders))
}

pub async fn get_store_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(store_order_id): Path<Uuid>,
) -> AppResult<Json<StoreOrder>> {
    let order = coordinator(&state).get_store_order(store_order_id).await?;
    Ok(Json(order))
}

pub async fn create_store_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStoreOrderInput>,
) -> AppResult<(StatusCode, Json<DocumentOutcome<StoreOrder>>)> {
    let outcome = coordinator(&state)
        .create_store_order(input, current_user.0.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Approve a pending store order (requires store_orders:approve)
pub async fn approve_store_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_order_id): Path<Uuid>,
) -> AppResult<Json<DocumentOutcome<ApprovedStoreOrder>>> {
    check_permission(&current_user.0, "store_orders", "approve")?;
    let outcome = coordinator(&state)
        .approve_store_order(store_order_id, current_user.0.user_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn reject_store_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_order_id): Path<Uuid>,
    Json(input): Json<RejectStoreOrderInput>,
) -> AppResult<Json<DocumentOutcome<StoreOrder>>> {
    check_permission(&current_user.0, "store_orders", "approve")?;
    input.validate()?;
    let outcome = coordinator(&state)
        .reject_store_order(store_order_id, input.reason, current_user.0.user_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn delete_store_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_order_id): Path<Uuid>,
) -> AppResult<Json<DocumentOutcome<StoreOrder>>> {
    let outcome = coordinator(&state)
        .delete_store_order(store_order_id, current_user.0.user_id)
        .await?;
    Ok(Json(outcome))
}
