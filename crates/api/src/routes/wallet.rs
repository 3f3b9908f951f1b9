//! Wallet routes: balances, history and peer-to-peer transfers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use campuspay_core::wallet::{
    EventPublisher, LedgerEvent, LedgerEventKind, Notification, NotificationDispatcher,
    TransactionStatus, TransactionType, WalletBalance,
};
use campuspay_db::{
    TransferRepository, WalletRepository, entities::wallet_transactions,
    repositories::transfer::SettlementOutcome,
};
use campuspay_shared::types::{PageRequest, PageResponse};

/// Creates the wallet routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(get_balance))
        .route("/wallet/transactions", get(list_transactions))
        .route("/wallet/transfers", post(create_transfer))
        .route("/wallet/transfers/pending", get(list_pending_transfers))
        .route("/wallet/transfers/{transaction_id}/accept", post(accept_transfer))
        .route("/wallet/transfers/{transaction_id}/reject", post(reject_transfer))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Balances of the caller.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Spendable funds.
    pub available: Decimal,
    /// Funds held for open orders.
    pub escrow: Decimal,
    /// Sent transfers awaiting the recipient.
    pub in_transit: Decimal,
    /// Sum of the three.
    pub total: Decimal,
}

impl From<WalletBalance> for BalanceResponse {
    fn from(b: WalletBalance) -> Self {
        Self {
            available: b.available,
            escrow: b.escrow,
            in_transit: b.in_transit,
            total: b.total(),
        }
    }
}

/// One ledger row.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Kind of movement.
    pub transaction_type: TransactionType,
    /// Signed amount; negative leaves the account.
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Counterparty, if any.
    pub related_user_id: Option<Uuid>,
    /// Shared by both legs of a transfer or direct payment.
    pub pairing_id: Option<Uuid>,
    /// Gateway reference for top-ups.
    pub reference: Option<String>,
    /// Order for escrow rows.
    pub order_id: Option<Uuid>,
    /// Free text.
    pub description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<wallet_transactions::Model> for TransactionResponse {
    fn from(m: wallet_transactions::Model) -> Self {
        Self {
            id: m.id,
            transaction_type: m.transaction_type.into(),
            amount: m.amount,
            status: m.status.into(),
            related_user_id: m.related_user_id,
            pairing_id: m.pairing_id,
            reference: m.reference,
            order_id: m.order_id,
            description: m.description,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Recipient account.
    pub recipient_id: Uuid,
    /// Amount in major units.
    pub amount: Decimal,
    /// Optional note shown to both sides.
    pub description: Option<String>,
}

/// Response after initiating a transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Sender leg.
    pub transaction: TransactionResponse,
    /// Recipient leg id; the recipient accepts or rejects this one.
    pub recipient_transaction_id: Uuid,
    /// Sender balances afterwards.
    pub balance: BalanceResponse,
}

/// Response after accepting or rejecting a transfer.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// Sender-side transaction id.
    pub sender_transaction_id: Uuid,
    /// Final status of both legs.
    pub status: TransactionStatus,
    /// Amount.
    pub amount: Decimal,
    /// Recipient (caller) balances afterwards.
    pub balance: BalanceResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /wallet
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = WalletRepository::new(state.conn())
        .balance(auth.user_id())
        .await?;
    Ok(Json(balance.into()))
}

/// GET /wallet/transactions
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<TransactionResponse>>> {
    let history = WalletRepository::new(state.conn())
        .history(auth.user_id(), &page)
        .await?;
    Ok(Json(history.map(TransactionResponse::from)))
}

/// GET /wallet/transfers/pending
async fn list_pending_transfers(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let pending = WalletRepository::new(state.conn())
        .pending_incoming(auth.user_id())
        .await?;
    Ok(Json(pending.into_iter().map(Into::into).collect()))
}

/// POST /wallet/transfers
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TransferRequest>,
) -> ApiResult<(StatusCode, Json<TransferResponse>)> {
    let sender_id = auth.user_id();
    let outcome = TransferRepository::new(state.conn())
        .transfer(sender_id, req.recipient_id, req.amount, req.description)
        .await?;

    let incoming = &outcome.recipient_leg;
    state
        .events
        .publish(LedgerEvent::balance(sender_id, outcome.sender_balance));
    state.events.publish(LedgerEvent::new(
        incoming.user_id,
        LedgerEventKind::TransferReceived {
            transaction_id: incoming.id,
            from_user_id: sender_id,
            amount: incoming.amount,
        },
    ));
    state.notifier.dispatch(Notification::transfer_received(
        incoming.user_id,
        incoming.id,
        incoming.amount,
    ));

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            recipient_transaction_id: incoming.id,
            balance: outcome.sender_balance.into(),
            transaction: outcome.sender_leg.into(),
        }),
    ))
}

/// POST /wallet/transfers/{transaction_id}/accept
async fn accept_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<SettlementResponse>> {
    let outcome = TransferRepository::new(state.conn())
        .accept(transaction_id, auth.user_id())
        .await?;
    Ok(Json(settled(&state, outcome)))
}

/// POST /wallet/transfers/{transaction_id}/reject
async fn reject_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<SettlementResponse>> {
    let outcome = TransferRepository::new(state.conn())
        .reject(transaction_id, auth.user_id())
        .await?;
    Ok(Json(settled(&state, outcome)))
}

fn settled(state: &AppState, outcome: SettlementOutcome) -> SettlementResponse {
    state
        .events
        .publish(LedgerEvent::balance(outcome.sender_id, outcome.sender_balance));
    state
        .events
        .publish(LedgerEvent::balance(outcome.recipient_id, outcome.recipient_balance));
    state.events.publish(LedgerEvent::new(
        outcome.sender_id,
        LedgerEventKind::TransferSettled {
            transaction_id: outcome.sender_transaction_id,
            status: outcome.status,
        },
    ));
    state.notifier.dispatch(Notification::transfer_settled(
        outcome.sender_id,
        outcome.sender_transaction_id,
        outcome.amount,
        outcome.status,
    ));

    SettlementResponse {
        sender_transaction_id: outcome.sender_transaction_id,
        status: outcome.status,
        amount: outcome.amount,
        balance: outcome.recipient_balance.into(),
    }
}
