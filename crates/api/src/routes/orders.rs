//! Marketplace purchase and order routes.
//!
//! Buying an item holds its price in the buyer's escrow balance; the seller
//! is paid only when the buyer confirms receipt.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wallet::BalanceResponse;
use crate::{AppState, error::ApiResult, middleware::AuthUser};
use campuspay_core::wallet::{
    EscrowStatus, EventPublisher, LedgerEvent, LedgerEventKind, Notification,
    NotificationDispatcher, OrderStatus,
};
use campuspay_db::{EscrowRepository, entities::orders};

/// Creates the order routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/marketplace/items/{item_id}/purchase", post(purchase_item))
        .route("/orders/{order_id}", get(get_order))
        .route("/orders/{order_id}/confirm", post(confirm_receipt))
        .route("/orders/{order_id}/cancel", post(cancel_order))
        .route("/orders/{order_id}/status", post(advance_order))
}

/// An order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order ID.
    pub id: Uuid,
    /// Buyer.
    pub buyer_id: Uuid,
    /// Seller.
    pub seller_id: Uuid,
    /// Item bought.
    pub item_id: Uuid,
    /// Price paid.
    pub amount: Decimal,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Escrow status.
    pub escrow_status: EscrowStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<orders::Model> for OrderResponse {
    fn from(m: orders::Model) -> Self {
        Self {
            id: m.id,
            buyer_id: m.buyer_id,
            seller_id: m.seller_id,
            item_id: m.item_id,
            amount: m.amount,
            status: m.status.into(),
            escrow_status: m.escrow_status.into(),
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

/// An order and the caller's balances after acting on it.
#[derive(Debug, Serialize)]
pub struct OrderActionResponse {
    /// Order after the action.
    pub order: OrderResponse,
    /// Caller balances.
    pub balance: BalanceResponse,
}

/// Request body for a seller status update.
#[derive(Debug, Deserialize)]
pub struct AdvanceOrderRequest {
    /// `processing` or `shipping`.
    pub status: OrderStatus,
}

fn order_updated(state: &AppState, order: &orders::Model) {
    let status = OrderStatus::from(order.status);
    for user_id in [order.buyer_id, order.seller_id] {
        state.events.publish(LedgerEvent::new(
            user_id,
            LedgerEventKind::OrderUpdated {
                order_id: order.id,
                status,
            },
        ));
    }
}

/// POST /marketplace/items/{item_id}/purchase
async fn purchase_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<OrderActionResponse>)> {
    let buyer_id = auth.user_id();
    let outcome = EscrowRepository::new(state.conn())
        .purchase(buyer_id, item_id)
        .await?;

    state
        .events
        .publish(LedgerEvent::balance(buyer_id, outcome.buyer_balance));
    order_updated(&state, &outcome.order);
    state.notifier.dispatch(Notification::item_sold(
        outcome.order.seller_id,
        outcome.order.id,
        &outcome.item_title,
        outcome.order.amount,
    ));

    Ok((
        StatusCode::CREATED,
        Json(OrderActionResponse {
            order: outcome.order.into(),
            balance: outcome.buyer_balance.into(),
        }),
    ))
}

/// GET /orders/{order_id}
async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let order = EscrowRepository::new(state.conn())
        .find_order(order_id, auth.user_id())
        .await?;
    Ok(Json(order.into()))
}

/// POST /orders/{order_id}/confirm
async fn confirm_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderActionResponse>> {
    let outcome = EscrowRepository::new(state.conn())
        .confirm_receipt(order_id, auth.user_id())
        .await?;
    let order = &outcome.order;

    state
        .events
        .publish(LedgerEvent::balance(order.buyer_id, outcome.buyer_balance));
    state
        .events
        .publish(LedgerEvent::balance(order.seller_id, outcome.seller_balance));
    order_updated(&state, order);
    state.notifier.dispatch(Notification::escrow_released(
        order.seller_id,
        order.id,
        order.escrow_amount,
    ));

    Ok(Json(OrderActionResponse {
        balance: outcome.buyer_balance.into(),
        order: outcome.order.into(),
    }))
}

/// POST /orders/{order_id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderActionResponse>> {
    let outcome = EscrowRepository::new(state.conn())
        .cancel_order(order_id, auth.user_id())
        .await?;
    let order = &outcome.order;

    state
        .events
        .publish(LedgerEvent::balance(order.buyer_id, outcome.buyer_balance));
    order_updated(&state, order);
    state
        .notifier
        .dispatch(Notification::order_cancelled(order.seller_id, order.id));

    Ok(Json(OrderActionResponse {
        balance: outcome.buyer_balance.into(),
        order: outcome.order.into(),
    }))
}

/// POST /orders/{order_id}/status
async fn advance_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<AdvanceOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order = EscrowRepository::new(state.conn())
        .advance_order(order_id, auth.user_id(), req.status)
        .await?;

    order_updated(&state, &order);
    state
        .notifier
        .dispatch(Notification::order_status(order.buyer_id, order.id, req.status));

    Ok(Json(order.into()))
}
