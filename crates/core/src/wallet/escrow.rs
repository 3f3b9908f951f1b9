//! Marketplace escrow rules.
//!
//! [`EscrowService`] decides whether a purchase, release, cancel or status
//! change is allowed and which balance mutations it implies. The repository
//! layer executes the returned plan inside one database transaction.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::wallet::balance::{BalanceMutation, validate_amount};
use crate::wallet::error::WalletError;
use crate::wallet::types::{EscrowStatus, ItemStatus, OrderStatus};

/// The parts of a market item a purchase decision needs.
#[derive(Debug, Clone, Copy)]
pub struct ItemSnapshot {
    /// Item id.
    pub id: Uuid,
    /// Seller.
    pub seller_id: Uuid,
    /// Price in major units.
    pub price: Decimal,
    /// Current availability.
    pub status: ItemStatus,
}

/// The parts of an order an escrow decision needs.
#[derive(Debug, Clone, Copy)]
pub struct OrderSnapshot {
    /// Order id.
    pub id: Uuid,
    /// Buyer.
    pub buyer_id: Uuid,
    /// Seller.
    pub seller_id: Uuid,
    /// Amount moved into the buyer's escrow at purchase.
    pub escrow_amount: Decimal,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Escrow status.
    pub escrow_status: EscrowStatus,
}

/// What a purchase does to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchasePlan {
    /// Buyer mutation (available → escrow).
    pub buyer: BalanceMutation,
    /// Amount held.
    pub amount: Decimal,
}

/// What a release does to both parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Buyer mutation (escrow drained).
    pub buyer: BalanceMutation,
    /// Seller mutation (available credited).
    pub seller: BalanceMutation,
    /// Amount released.
    pub amount: Decimal,
}

/// What a cancel does to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelPlan {
    /// Escrow refund, present only while escrow is held.
    pub refund: Option<BalanceMutation>,
}

/// Stateless service for escrow decisions.
pub struct EscrowService;

impl EscrowService {
    /// Checks a purchase of `item` by `buyer_id`.
    ///
    /// # Returns
    /// * `Err(WalletError::ItemUnavailable)` if the item is already sold
    /// * `Err(WalletError::NotAuthorized)` if the buyer is the seller
    /// * `Err(WalletError::InvalidAmount)` if the item is mispriced
    pub fn plan_purchase(item: &ItemSnapshot, buyer_id: Uuid) -> Result<PurchasePlan, WalletError> {
        if item.status != ItemStatus::Available {
            return Err(WalletError::ItemUnavailable);
        }
        if item.seller_id == buyer_id {
            return Err(WalletError::NotAuthorized);
        }
        let amount = validate_amount(item.price)?;
        Ok(PurchasePlan {
            buyer: BalanceMutation::Hold(amount),
            amount,
        })
    }

    /// Checks a buyer's confirmation of receipt.
    ///
    /// # Returns
    /// * `Err(WalletError::NotAuthorized)` if `actor_id` is not the buyer
    /// * `Err(WalletError::AlreadyReleased)` if escrow was already paid out
    /// * `Err(WalletError::InvalidState)` if the order was cancelled
    pub fn plan_release(order: &OrderSnapshot, actor_id: Uuid) -> Result<ReleasePlan, WalletError> {
        if order.buyer_id != actor_id {
            return Err(WalletError::NotAuthorized);
        }
        match order.escrow_status {
            EscrowStatus::Released => Err(WalletError::AlreadyReleased(order.id)),
            EscrowStatus::Refunded => Err(WalletError::InvalidState(format!(
                "order {} was cancelled and refunded",
                order.id
            ))),
            EscrowStatus::Held if order.status == OrderStatus::Cancelled => Err(
                WalletError::InvalidState(format!("order {} was cancelled", order.id)),
            ),
            EscrowStatus::Held => Ok(ReleasePlan {
                buyer: BalanceMutation::ReleaseEscrow(order.escrow_amount),
                seller: BalanceMutation::Credit(order.escrow_amount),
                amount: order.escrow_amount,
            }),
        }
    }

    /// Error for a release whose guarded update matched nothing, chosen from
    /// the order as it is now.
    #[must_use]
    pub fn release_conflict(order: &OrderSnapshot) -> WalletError {
        match Self::plan_release(order, order.buyer_id) {
            Err(e) => e,
            Ok(_) => WalletError::AlreadyReleased(order.id),
        }
    }

    /// Checks a buyer's cancellation.
    ///
    /// # Returns
    /// * `Err(WalletError::NotAuthorized)` if `actor_id` is not the buyer
    /// * `Err(WalletError::NotCancellable)` once the order is shipping, delivered or cancelled
    pub fn plan_cancel(order: &OrderSnapshot, actor_id: Uuid) -> Result<CancelPlan, WalletError> {
        if order.buyer_id != actor_id {
            return Err(WalletError::NotAuthorized);
        }
        if !order.status.is_cancellable() {
            return Err(WalletError::NotCancellable {
                order_id: order.id,
                status: order.status.to_string(),
            });
        }
        let refund = (order.escrow_status == EscrowStatus::Held)
            .then_some(BalanceMutation::RefundEscrow(order.escrow_amount));
        Ok(CancelPlan { refund })
    }

    /// Checks a seller moving the order forward.
    pub fn check_advance(
        order: &OrderSnapshot,
        actor_id: Uuid,
        next: OrderStatus,
    ) -> Result<(), WalletError> {
        if order.seller_id != actor_id {
            return Err(WalletError::NotAuthorized);
        }
        if !order.status.can_advance_to(next) {
            return Err(WalletError::InvalidState(format!(
                "order {} cannot move from {} to {next}",
                order.id, order.status
            )));
        }
        Ok(())
    }
}
