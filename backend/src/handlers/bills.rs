//! HTTP handlers for purchase bills

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Bill, DocumentOutcome, PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::bill::{BillInput, BillService, DeriveBillInput};
use crate::AppState;

fn service(state: &AppState) -> BillService {
    BillService::new(state.stores.clone(), state.resolver.clone())
}

/// List the current user's bills
pub async fn list_bills(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Bill>>> {
    let bills = service(&state)
        .list_bills(current_user.0.user_id, &pagination)
        .await?;
    Ok(Json(bills))
}

pub async fn get_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<Bill>> {
    let bill = service(&state)
        .get_bill(current_user.0.user_id, bill_id)
        .await?;
    Ok(Json(bill))
}

/// Create a bill; the response lists any stock or balance warnings
pub async fn create_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BillInput>,
) -> AppResult<(StatusCode, Json<DocumentOutcome<Bill>>)> {
    let outcome = service(&state)
        .create_bill(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn update_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
    Json(input): Json<BillInput>,
) -> AppResult<Json<DocumentOutcome<Bill>>> {
    let outcome = service(&state)
        .update_bill(current_user.0.user_id, bill_id, input)
        .await?;
    Ok(Json(outcome))
}

pub async fn delete_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<DocumentOutcome<Bill>>> {
    let outcome = service(&state)
        .delete_bill(current_user.0.user_id, bill_id)
        .await?;
    Ok(Json(outcome))
}

/// Derive a bill from a purchase order
pub async fn create_bill_from_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_order_id): Path<Uuid>,
    Json(input): Json<DeriveBillInput>,
) -> AppResult<(StatusCode, Json<DocumentOutcome<Bill>>)> {
    let outcome = service(&state)
        .create_from_purchase_order(current_user.0.user_id, purchase_order_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Derive a bill from a purchase receive
pub async fn create_bill_from_receive(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(receive_id): Path<Uuid>,
    Json(input): Json<DeriveBillInput>,
) -> AppResult<(StatusCode, Json<DocumentOutcome<Bill>>)> {
    let outcome = service(&state)
        .create_from_receive(current_user.0.user_id, receive_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
