//! Housing payment routes: tour fees and rent.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::Serialize;
use uuid::Uuid;

use super::wallet::{BalanceResponse, TransactionResponse};
use crate::{AppState, error::ApiResult, middleware::AuthUser};
use campuspay_core::wallet::{EventPublisher, LedgerEvent, Notification, NotificationDispatcher};
use campuspay_db::{DirectPaymentRepository, repositories::DirectPaymentOutcome};

/// Creates the housing payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/housing/tours/{tour_id}/pay", post(pay_tour_fee))
        .route("/housing/listings/{listing_id}/pay-rent", post(pay_rent))
}

/// A direct payment from the payer's side.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payer row.
    pub transaction: TransactionResponse,
    /// Payer balances afterwards.
    pub balance: BalanceResponse,
}

/// POST /housing/tours/{tour_id}/pay
async fn pay_tour_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tour_id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let outcome = DirectPaymentRepository::new(state.conn())
        .pay_tour_fee(tour_id, auth.user_id())
        .await?;
    Ok(Json(paid(&state, outcome, "a housing tour")))
}

/// POST /housing/listings/{listing_id}/pay-rent
async fn pay_rent(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(listing_id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let outcome = DirectPaymentRepository::new(state.conn())
        .pay_rent(listing_id, auth.user_id())
        .await?;
    Ok(Json(paid(&state, outcome, "rent")))
}

fn paid(state: &AppState, outcome: DirectPaymentOutcome, what: &str) -> PaymentResponse {
    let payee = &outcome.payee_leg;
    state.events.publish(LedgerEvent::balance(
        outcome.payer_leg.user_id,
        outcome.payer_balance,
    ));
    state
        .events
        .publish(LedgerEvent::balance(payee.user_id, outcome.payee_balance));
    state.notifier.dispatch(Notification::payment_received(
        payee.user_id,
        payee.id,
        payee.amount,
        what,
    ));

    PaymentResponse {
        balance: outcome.payer_balance.into(),
        transaction: outcome.payer_leg.into(),
    }
}
