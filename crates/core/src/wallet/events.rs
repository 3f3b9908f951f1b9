//! Post-commit side effects: real-time events and notifications.
//!
//! Both contracts are fire-and-forget. Implementations must not block and
//! must swallow their own failures; a ledger operation has already committed
//! by the time they run.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wallet::balance::WalletBalance;
use crate::wallet::types::{OrderStatus, TransactionStatus};

/// A real-time event addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// User the event is delivered to.
    pub user_id: Uuid,
    /// When the event was produced.
    pub occurred_at: DateTime<Utc>,
    /// Event body.
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

/// Event bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// Balances changed.
    BalanceUpdated {
        /// New balances.
        balance: WalletBalance,
    },
    /// Someone sent the user a transfer awaiting acceptance.
    TransferReceived {
        /// Recipient-side transaction id.
        transaction_id: Uuid,
        /// Sender.
        from_user_id: Uuid,
        /// Amount.
        amount: Decimal,
    },
    /// A transfer the user sent was accepted or rejected.
    TransferSettled {
        /// Sender-side transaction id.
        transaction_id: Uuid,
        /// New status.
        status: TransactionStatus,
    },
    /// An order the user is part of changed.
    OrderUpdated {
        /// Order id.
        order_id: Uuid,
        /// New fulfilment status.
        status: OrderStatus,
    },
    /// A withdrawal was reviewed.
    WithdrawalReviewed {
        /// Withdrawal transaction id.
        transaction_id: Uuid,
        /// New status.
        status: TransactionStatus,
    },
    /// A notification was created.
    Notification {
        /// Title.
        title: String,
        /// Body.
        body: String,
    },
}

impl LedgerEvent {
    /// Creates an event stamped now.
    #[must_use]
    pub fn new(user_id: Uuid, kind: LedgerEventKind) -> Self {
        Self {
            user_id,
            occurred_at: Utc::now(),
            kind,
        }
    }

    /// Balance update event.
    #[must_use]
    pub fn balance(user_id: Uuid, balance: WalletBalance) -> Self {
        Self::new(user_id, LedgerEventKind::BalanceUpdated { balance })
    }
}

/// A notification to persist and push to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient.
    pub user_id: Uuid,
    /// Short title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Structured payload for the client.
    pub data: serde_json::Value,
}

impl Notification {
    fn new(user_id: Uuid, title: &str, body: String, data: serde_json::Value) -> Self {
        Self {
            user_id,
            title: title.to_string(),
            body,
            data,
        }
    }

    /// Seller: an item sold and payment is held in escrow.
    #[must_use]
    pub fn item_sold(seller_id: Uuid, order_id: Uuid, item_title: &str, amount: Decimal) -> Self {
        Self::new(
            seller_id,
            "Item sold",
            format!("{item_title} was purchased. {amount} is held in escrow until the buyer confirms receipt."),
            serde_json::json!({ "order_id": order_id }),
        )
    }

    /// Seller: escrow was released.
    #[must_use]
    pub fn escrow_released(seller_id: Uuid, order_id: Uuid, amount: Decimal) -> Self {
        Self::new(
            seller_id,
            "Payment released",
            format!("The buyer confirmed receipt. {amount} was added to your wallet."),
            serde_json::json!({ "order_id": order_id }),
        )
    }

    /// Seller: the buyer cancelled.
    #[must_use]
    pub fn order_cancelled(seller_id: Uuid, order_id: Uuid) -> Self {
        Self::new(
            seller_id,
            "Order cancelled",
            "The buyer cancelled the order and the item is listed again.".to_string(),
            serde_json::json!({ "order_id": order_id }),
        )
    }

    /// Buyer: the seller moved the order forward.
    #[must_use]
    pub fn order_status(buyer_id: Uuid, order_id: Uuid, status: OrderStatus) -> Self {
        Self::new(
            buyer_id,
            "Order update",
            format!("Your order is now {status}."),
            serde_json::json!({ "order_id": order_id, "status": status }),
        )
    }

    /// Recipient: a transfer is waiting.
    #[must_use]
    pub fn transfer_received(recipient_id: Uuid, transaction_id: Uuid, amount: Decimal) -> Self {
        Self::new(
            recipient_id,
            "Incoming transfer",
            format!("You have a pending transfer of {amount}. Accept or reject it from your wallet."),
            serde_json::json!({ "transaction_id": transaction_id }),
        )
    }

    /// Sender: the recipient answered.
    #[must_use]
    pub fn transfer_settled(
        sender_id: Uuid,
        transaction_id: Uuid,
        amount: Decimal,
        status: TransactionStatus,
    ) -> Self {
        let body = if status == TransactionStatus::Completed {
            format!("Your transfer of {amount} was accepted.")
        } else {
            format!("Your transfer of {amount} was rejected and returned to your wallet.")
        };
        Self::new(
            sender_id,
            "Transfer update",
            body,
            serde_json::json!({ "transaction_id": transaction_id, "status": status }),
        )
    }

    /// Requester: an admin reviewed the withdrawal.
    #[must_use]
    pub fn withdrawal_reviewed(
        user_id: Uuid,
        transaction_id: Uuid,
        amount: Decimal,
        status: TransactionStatus,
    ) -> Self {
        let body = if status == TransactionStatus::Completed {
            format!("Your withdrawal of {amount} was approved.")
        } else {
            format!("Your withdrawal of {amount} was declined and refunded.")
        };
        Self::new(
            user_id,
            "Withdrawal update",
            body,
            serde_json::json!({ "transaction_id": transaction_id, "status": status }),
        )
    }

    /// Account holder: a top-up landed.
    #[must_use]
    pub fn topup_credited(user_id: Uuid, reference: &str, amount: Decimal) -> Self {
        Self::new(
            user_id,
            "Wallet funded",
            format!("{amount} was added to your wallet."),
            serde_json::json!({ "reference": reference }),
        )
    }

    /// Payee: a tour fee or rent was paid.
    #[must_use]
    pub fn payment_received(payee_id: Uuid, transaction_id: Uuid, amount: Decimal, what: &str) -> Self {
        Self::new(
            payee_id,
            "Payment received",
            format!("You received {amount} for {what}."),
            serde_json::json!({ "transaction_id": transaction_id }),
        )
    }
}

/// Pushes real-time events to connected clients.
pub trait EventPublisher: Send + Sync {
    /// Publishes one event. Never fails.
    fn publish(&self, event: LedgerEvent);
}

/// Persists and delivers user notifications.
pub trait NotificationDispatcher: Send + Sync {
    /// Dispatches one notification. Never fails.
    fn dispatch(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_serializes_flat_with_type_tag() {
        let user = Uuid::nil();
        let event = LedgerEvent::balance(user, WalletBalance::with_available(dec!(10)));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "balance_updated");
        assert_eq!(value["user_id"], user.to_string());
        assert_eq!(value["balance"]["available"], "10");
    }

    #[test]
    fn test_transfer_settled_wording() {
        let n = Notification::transfer_settled(
            Uuid::nil(),
            Uuid::nil(),
            dec!(50),
            TransactionStatus::Rejected,
        );
        assert!(n.body.contains("rejected"));
        assert_eq!(n.data["status"], "rejected");
    }
}
