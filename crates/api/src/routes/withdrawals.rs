//! Withdrawal routes: user requests and admin review.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wallet::{BalanceResponse, TransactionResponse};
use crate::{AppState, error::ApiResult, middleware::AuthUser};
use campuspay_core::wallet::{
    BankDetails, EventPublisher, LedgerEvent, LedgerEventKind, Notification,
    NotificationDispatcher, TransactionStatus,
};
use campuspay_db::{WithdrawalRepository, repositories::WithdrawalOutcome};
use campuspay_shared::types::{PageRequest, PageResponse};

/// Creates the withdrawal routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/withdrawals", post(request_withdrawal))
        .route("/admin/withdrawals", get(list_pending_withdrawals))
        .route("/admin/withdrawals/{transaction_id}/approve", post(approve_withdrawal))
        .route("/admin/withdrawals/{transaction_id}/reject", post(reject_withdrawal))
}

/// Request body for a withdrawal.
#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    /// Amount in major units.
    pub amount: Decimal,
    /// Destination account.
    pub bank_details: BankDetails,
}

/// A withdrawal and the requester's balances after it.
#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    /// Withdrawal row.
    pub transaction: TransactionResponse,
    /// Requester balances.
    pub balance: BalanceResponse,
}

impl From<WithdrawalOutcome> for WithdrawalResponse {
    fn from(o: WithdrawalOutcome) -> Self {
        Self {
            transaction: o.transaction.into(),
            balance: o.balance.into(),
        }
    }
}

/// POST /wallet/withdrawals
async fn request_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<WithdrawalRequest>,
) -> ApiResult<(StatusCode, Json<WithdrawalResponse>)> {
    let outcome = WithdrawalRepository::new(state.conn())
        .request(auth.user_id(), req.amount, &req.bank_details)
        .await?;

    state
        .events
        .publish(LedgerEvent::balance(auth.user_id(), outcome.balance));

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// GET /admin/withdrawals
async fn list_pending_withdrawals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<TransactionResponse>>> {
    auth.require_admin()?;
    let pending = WithdrawalRepository::new(state.conn())
        .pending(&page)
        .await?;
    Ok(Json(pending.map(TransactionResponse::from)))
}

/// POST /admin/withdrawals/{transaction_id}/approve
async fn approve_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let outcome = WithdrawalRepository::new(state.conn())
        .approve(transaction_id, auth.user_id(), auth.is_admin())
        .await?;
    Ok(Json(reviewed(&state, outcome)))
}

/// POST /admin/withdrawals/{transaction_id}/reject
async fn reject_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<WithdrawalResponse>> {
    let outcome = WithdrawalRepository::new(state.conn())
        .reject(transaction_id, auth.user_id(), auth.is_admin())
        .await?;
    Ok(Json(reviewed(&state, outcome)))
}

fn reviewed(state: &AppState, outcome: WithdrawalOutcome) -> WithdrawalResponse {
    let row = &outcome.transaction;
    let status = TransactionStatus::from(row.status);

    state
        .events
        .publish(LedgerEvent::balance(row.user_id, outcome.balance));
    state.events.publish(LedgerEvent::new(
        row.user_id,
        LedgerEventKind::WithdrawalReviewed {
            transaction_id: row.id,
            status,
        },
    ));
    state.notifier.dispatch(Notification::withdrawal_reviewed(
        row.user_id,
        row.id,
        row.amount.abs(),
        status,
    ));

    outcome.into()
}
