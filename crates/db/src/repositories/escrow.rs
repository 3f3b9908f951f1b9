//! Escrow repository: marketplace purchase, release, cancel and fulfilment.
//!
//! Every operation runs in one database transaction. Status flips are
//! conditional updates so two concurrent calls cannot both win.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use campuspay_core::wallet::{
    EscrowService, ItemSnapshot, OrderSnapshot, TransactionType, WalletBalance, WalletError,
    types as domain,
};
use campuspay_shared::types::OrderId;

use crate::entities::{
    market_items, orders,
    sea_orm_active_enums::{EscrowStatus, ItemStatus, OrderStatus},
};

use super::ledger::{NewTransaction, apply_mutation, db_err, fetch_balance, insert_transaction};

/// Result of a successful purchase.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    /// The new order.
    pub order: orders::Model,
    /// Title of the purchased item.
    pub item_title: String,
    /// Buyer balances after the hold.
    pub buyer_balance: WalletBalance,
}

/// Result of a release, cancel or status change.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    /// The order after the change.
    pub order: orders::Model,
    /// Buyer balances after the change.
    pub buyer_balance: WalletBalance,
    /// Seller balances after the change.
    pub seller_balance: WalletBalance,
}

/// Converts an order row into the domain snapshot.
#[must_use]
pub fn order_snapshot(order: &orders::Model) -> OrderSnapshot {
    OrderSnapshot {
        id: order.id,
        buyer_id: order.buyer_id,
        seller_id: order.seller_id,
        escrow_amount: order.escrow_amount,
        status: order.status.into(),
        escrow_status: order.escrow_status.into(),
    }
}

/// Escrow repository.
#[derive(Debug, Clone)]
pub struct EscrowRepository {
    db: DatabaseConnection,
}

impl EscrowRepository {
    /// Creates a new escrow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an order visible to `actor_id` (buyer or seller).
    ///
    /// # Errors
    ///
    /// * `WalletError::OrderNotFound` if it does not exist
    /// * `WalletError::NotAuthorized` if the actor is not a party to it
    pub async fn find_order(&self, order_id: Uuid, actor_id: Uuid) -> Result<orders::Model, WalletError> {
        let order = load_order(&self.db, order_id).await?;
        if order.buyer_id != actor_id && order.seller_id != actor_id {
            return Err(WalletError::NotAuthorized);
        }
        Ok(order)
    }

    /// Buys `item_id` for `buyer_id`, moving the price into the buyer's escrow.
    ///
    /// # Errors
    ///
    /// * `WalletError::ItemNotFound` / `ItemUnavailable`
    /// * `WalletError::NotAuthorized` when buying one's own item
    /// * `WalletError::InsufficientFunds` when available does not cover the price
    pub async fn purchase(&self, buyer_id: Uuid, item_id: Uuid) -> Result<PurchaseOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let item = market_items::Entity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WalletError::ItemNotFound(item_id))?;

        let snapshot = ItemSnapshot {
            id: item.id,
            seller_id: item.seller_id,
            price: item.price,
            status: item.status.into(),
        };
        let plan = EscrowService::plan_purchase(&snapshot, buyer_id)?;

        // The item flips first so a losing concurrent buyer sees ItemUnavailable.
        let flipped = market_items::Entity::update_many()
            .col_expr(market_items::Column::Status, Expr::value(ItemStatus::Sold))
            .col_expr(market_items::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(market_items::Column::Id.eq(item_id))
            .filter(market_items::Column::Status.eq(ItemStatus::Available))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if flipped.rows_affected == 0 {
            return Err(WalletError::ItemUnavailable);
        }

        apply_mutation(&txn, buyer_id, plan.buyer).await?;

        let now = Utc::now().into();
        let order = orders::ActiveModel {
            id: Set(OrderId::new().into_inner()),
            buyer_id: Set(buyer_id),
            seller_id: Set(item.seller_id),
            item_id: Set(item.id),
            amount: Set(plan.amount),
            escrow_amount: Set(plan.amount),
            status: Set(OrderStatus::Pending),
            escrow_status: Set(EscrowStatus::Held),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let mut hold = NewTransaction::completed(buyer_id, TransactionType::EscrowHold, plan.amount)
            .related_to(item.seller_id)
            .described(format!("Escrow hold for {}", item.title));
        hold.order_id = Some(order.id);
        hold.market_item_id = Some(item.id);
        insert_transaction(&txn, hold).await.map_err(db_err)?;

        let buyer_balance = fetch_balance(&txn, buyer_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            order_id = %order.id,
            buyer_id = %buyer_id,
            seller_id = %order.seller_id,
            amount = %plan.amount,
            "escrow held for purchase"
        );

        Ok(PurchaseOutcome {
            order,
            item_title: item.title,
            buyer_balance,
        })
    }

    /// Buyer confirms receipt: escrow is paid out to the seller.
    ///
    /// # Errors
    ///
    /// * `WalletError::NotAuthorized` unless `actor_id` is the buyer
    /// * `WalletError::AlreadyReleased` if escrow was already released
    /// * `WalletError::InvalidState` if the order was cancelled, including by a
    ///   cancel that committed while this call waited
    /// * `WalletError::LedgerIntegrity` if the buyer's escrow is short
    pub async fn confirm_receipt(&self, order_id: Uuid, actor_id: Uuid) -> Result<OrderOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let order = load_order(&txn, order_id).await?;
        let plan = EscrowService::plan_release(&order_snapshot(&order), actor_id)?;

        let released = orders::Entity::update_many()
            .col_expr(orders::Column::EscrowStatus, Expr::value(EscrowStatus::Released))
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::Delivered))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::EscrowStatus.eq(EscrowStatus::Held))
            .filter(orders::Column::Status.ne(OrderStatus::Cancelled))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if released.rows_affected == 0 {
            let current = load_order(&txn, order_id).await?;
            return Err(EscrowService::release_conflict(&order_snapshot(&current)));
        }

        apply_mutation(&txn, order.buyer_id, plan.buyer).await?;
        apply_mutation(&txn, order.seller_id, plan.seller).await?;

        let mut release =
            NewTransaction::completed(order.seller_id, TransactionType::EscrowRelease, plan.amount)
                .related_to(order.buyer_id)
                .described("Escrow released on delivery");
        release.order_id = Some(order.id);
        release.market_item_id = Some(order.item_id);
        insert_transaction(&txn, release).await.map_err(db_err)?;

        let outcome = finish(&txn, order_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            order_id = %order_id,
            seller_id = %order.seller_id,
            amount = %plan.amount,
            "escrow released"
        );

        Ok(outcome)
    }

    /// Buyer cancels: held escrow returns to available and the item is relisted.
    ///
    /// # Errors
    ///
    /// * `WalletError::NotAuthorized` unless `actor_id` is the buyer
    /// * `WalletError::NotCancellable` once shipping, delivered or cancelled
    pub async fn cancel_order(&self, order_id: Uuid, actor_id: Uuid) -> Result<OrderOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let order = load_order(&txn, order_id).await?;
        let snapshot = order_snapshot(&order);
        let plan = EscrowService::plan_cancel(&snapshot, actor_id)?;

        let next_escrow = if plan.refund.is_some() {
            EscrowStatus::Refunded
        } else {
            order.escrow_status
        };
        let cancelled = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::Cancelled))
            .col_expr(orders::Column::EscrowStatus, Expr::value(next_escrow))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Status.is_in([OrderStatus::Pending, OrderStatus::Processing]))
            .filter(orders::Column::EscrowStatus.eq(order.escrow_status))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if cancelled.rows_affected == 0 {
            return Err(WalletError::NotCancellable {
                order_id,
                status: snapshot.status.to_string(),
            });
        }

        if let Some(refund) = plan.refund {
            apply_mutation(&txn, order.buyer_id, refund).await?;

            let mut row =
                NewTransaction::completed(order.buyer_id, TransactionType::EscrowRefund, refund.amount())
                    .related_to(order.seller_id)
                    .described("Escrow refunded on cancellation");
            row.order_id = Some(order.id);
            row.market_item_id = Some(order.item_id);
            insert_transaction(&txn, row).await.map_err(db_err)?;
        }

        market_items::Entity::update_many()
            .col_expr(market_items::Column::Status, Expr::value(ItemStatus::Available))
            .col_expr(market_items::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(market_items::Column::Id.eq(order.item_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let outcome = finish(&txn, order_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            order_id = %order_id,
            buyer_id = %order.buyer_id,
            refunded = %plan.refund.map_or(Decimal::ZERO, |m| m.amount()),
            "order cancelled"
        );

        Ok(outcome)
    }

    /// Seller moves an order forward (`pending → processing → shipping`).
    ///
    /// # Errors
    ///
    /// * `WalletError::NotAuthorized` unless `actor_id` is the seller
    /// * `WalletError::InvalidState` for any other transition
    pub async fn advance_order(
        &self,
        order_id: Uuid,
        actor_id: Uuid,
        next: domain::OrderStatus,
    ) -> Result<orders::Model, WalletError> {
        let order = load_order(&self.db, order_id).await?;
        let snapshot = order_snapshot(&order);
        EscrowService::check_advance(&snapshot, actor_id, next)?;

        let updated = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::from(next)))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Status.eq(order.status))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(WalletError::InvalidState(format!(
                "order {order_id} changed concurrently"
            )));
        }

        info!(order_id = %order_id, status = %next, "order advanced");
        load_order(&self.db, order_id).await
    }
}

async fn load_order<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> Result<orders::Model, WalletError> {
    orders::Entity::find_by_id(order_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WalletError::OrderNotFound(order_id))
}

async fn finish<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> Result<OrderOutcome, WalletError> {
    let order = load_order(conn, order_id).await?;
    let buyer_balance = fetch_balance(conn, order.buyer_id).await?;
    let seller_balance = fetch_balance(conn, order.seller_id).await?;
    Ok(OrderOutcome {
        order,
        buyer_balance,
        seller_balance,
    })
}
