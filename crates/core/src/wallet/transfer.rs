//! Peer-to-peer transfer rules.
//!
//! A transfer is two rows sharing a pairing id: `transfer_out` on the sender
//! and `transfer_in` on the recipient. Funds wait in the sender's in-transit
//! balance until the recipient accepts or rejects.

use rust_decimal::Decimal;
use uuid::Uuid;

use campuspay_shared::types::PairingId;

use crate::wallet::balance::{BalanceMutation, validate_amount};
use crate::wallet::error::WalletError;
use crate::wallet::types::TransactionStatus;

/// Recipient's answer to a pending transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDecision {
    /// Take the funds.
    Accept,
    /// Send the funds back.
    Reject,
}

impl TransferDecision {
    /// Status both legs move to.
    #[must_use]
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            Self::Accept => TransactionStatus::Completed,
            Self::Reject => TransactionStatus::Rejected,
        }
    }
}

/// A validated transfer ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Shared by both legs.
    pub pairing_id: PairingId,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Sender mutation (available → in_transit).
    pub sender: BalanceMutation,
}

/// The parts of a pending transfer a settlement decision needs.
#[derive(Debug, Clone, Copy)]
pub struct TransferSnapshot {
    /// Sender.
    pub sender_id: Uuid,
    /// Recipient.
    pub recipient_id: Uuid,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Current status of the legs.
    pub status: TransactionStatus,
}

/// Balance changes that close a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Status both legs move to.
    pub new_status: TransactionStatus,
    /// Sender mutation (in_transit drained or returned).
    pub sender: BalanceMutation,
    /// Recipient mutation, present only on accept.
    pub recipient: Option<BalanceMutation>,
}

/// Stateless service for transfer decisions.
pub struct TransferService;

impl TransferService {
    /// Validates a new transfer.
    ///
    /// # Returns
    /// * `Err(WalletError::SelfTransfer)` if sender and recipient are equal
    /// * `Err(WalletError::InvalidAmount)` for non-positive or sub-kobo amounts
    pub fn plan_transfer(
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
    ) -> Result<TransferPlan, WalletError> {
        if sender_id == recipient_id {
            return Err(WalletError::SelfTransfer);
        }
        let amount = validate_amount(amount)?;
        Ok(TransferPlan {
            pairing_id: PairingId::new(),
            amount,
            sender: BalanceMutation::SendInTransit(amount),
        })
    }

    /// Checks the recipient's answer to a pending transfer.
    ///
    /// # Returns
    /// * `Err(WalletError::NotAuthorized)` if `actor_id` is not the recipient
    /// * `Err(WalletError::AlreadyProcessed)` if the transfer was already settled
    /// * `Err(WalletError::InvalidState)` if the row is not awaiting acceptance
    pub fn plan_settlement(
        transfer: &TransferSnapshot,
        actor_id: Uuid,
        decision: TransferDecision,
    ) -> Result<SettlementPlan, WalletError> {
        if transfer.recipient_id != actor_id {
            return Err(WalletError::NotAuthorized);
        }
        if transfer.status.is_terminal() {
            return Err(WalletError::AlreadyProcessed);
        }
        if transfer.status != TransactionStatus::PendingAcceptance {
            return Err(WalletError::InvalidState(format!(
                "transfer is {}",
                transfer.status
            )));
        }
        let plan = match decision {
            TransferDecision::Accept => SettlementPlan {
                new_status: decision.target_status(),
                sender: BalanceMutation::SettleInTransit(transfer.amount),
                recipient: Some(BalanceMutation::Credit(transfer.amount)),
            },
            TransferDecision::Reject => SettlementPlan {
                new_status: decision.target_status(),
                sender: BalanceMutation::ReturnInTransit(transfer.amount),
                recipient: None,
            },
        };
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending() -> TransferSnapshot {
        TransferSnapshot {
            sender_id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            amount: dec!(150),
            status: TransactionStatus::PendingAcceptance,
        }
    }

    #[test]
    fn test_plan_transfer() {
        let plan = TransferService::plan_transfer(Uuid::new_v4(), Uuid::new_v4(), dec!(150)).unwrap();
        assert_eq!(plan.sender, BalanceMutation::SendInTransit(dec!(150)));
    }

    #[test]
    fn test_self_transfer() {
        let user = Uuid::new_v4();
        assert!(matches!(
            TransferService::plan_transfer(user, user, dec!(10)),
            Err(WalletError::SelfTransfer)
        ));
    }

    #[test]
    fn test_invalid_amount() {
        assert!(matches!(
            TransferService::plan_transfer(Uuid::new_v4(), Uuid::new_v4(), dec!(0)),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_accept() {
        let t = pending();
        let plan = TransferService::plan_settlement(&t, t.recipient_id, TransferDecision::Accept).unwrap();
        assert_eq!(plan.new_status, TransactionStatus::Completed);
        assert_eq!(plan.sender, BalanceMutation::SettleInTransit(dec!(150)));
        assert_eq!(plan.recipient, Some(BalanceMutation::Credit(dec!(150))));
    }

    #[test]
    fn test_reject() {
        let t = pending();
        let plan = TransferService::plan_settlement(&t, t.recipient_id, TransferDecision::Reject).unwrap();
        assert_eq!(plan.new_status, TransactionStatus::Rejected);
        assert_eq!(plan.sender, BalanceMutation::ReturnInTransit(dec!(150)));
        assert_eq!(plan.recipient, None);
    }

    #[test]
    fn test_settled_and_unsettleable_rows() {
        let mut t = pending();
        t.status = TransactionStatus::Rejected;
        assert!(matches!(
            TransferService::plan_settlement(&t, t.recipient_id, TransferDecision::Accept),
            Err(WalletError::AlreadyProcessed)
        ));

        t.status = TransactionStatus::Pending;
        assert!(matches!(
            TransferService::plan_settlement(&t, t.recipient_id, TransferDecision::Reject),
            Err(WalletError::InvalidState(_))
        ));
    }

    #[test]
    fn test_sender_cannot_accept() {
        let t = pending();
        assert!(matches!(
            TransferService::plan_settlement(&t, t.sender_id, TransferDecision::Accept),
            Err(WalletError::NotAuthorized)
        ));
    }
}
