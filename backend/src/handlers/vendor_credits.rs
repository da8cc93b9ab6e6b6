//! HTTP handlers for vendor credits

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{DocumentOutcome, PaginatedResponse, Pagination, VendorCredit};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::vendor_credit::{VendorCreditInput, VendorCreditService};
use crate::AppState;

fn service(state: &AppState) -> VendorCreditService {
    VendorCreditService::new(state.stores.clone(), state.resolver.clone())
}

pub async fn list_vendor_credits(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<VendorCredit>>> {
    let credits = service(&state)
        .list_credits(current_user.0.user_id, &pagination)
        .await?;
    Ok(Json(credits))
}

pub async fn get_vendor_credit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(credit_id): Path<Uuid>,
) -> AppResult<Json<VendorCredit>> {
    let credit = service(&state)
        .get_credit(current_user.0.user_id, credit_id)
        .await?;
    Ok(Json(credit))
}

pub async fn create_vendor_credit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<VendorCreditInput>,
) -> AppResult<(StatusCode, Json<DocumentOutcome<VendorCredit>>)> {
    let outcome = service(&state)
        .create_credit(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn update_vendor_credit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(credit_id): Path<Uuid>,
    Json(input): Json<VendorCreditInput>,
) -> AppResult<Json<DocumentOutcome<VendorCredit>>> {
    let outcome = service(&state)
        .update_credit(current_user.0.user_id, credit_id, input)
        .await?;
    Ok(Json(outcome))
}

pub async fn delete_vendor_credit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(credit_id): Path<Uuid>,
) -> AppResult<Json<DocumentOutcome<VendorCredit>>> {
    let outcome = service(&state)
        .delete_credit(current_user.0.user_id, credit_id)
        .await?;
    Ok(Json(outcome))
}
