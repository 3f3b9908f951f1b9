//! Property-based tests for terminal-state handling in transfers and withdrawals.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::wallet::error::WalletError;
use crate::wallet::transfer::{TransferDecision, TransferService, TransferSnapshot};
use crate::wallet::types::TransactionStatus;
use crate::wallet::withdrawal::{WithdrawalDecision, WithdrawalService};

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_terminal() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        Just(TransactionStatus::Completed),
        Just(TransactionStatus::Failed),
        Just(TransactionStatus::Rejected),
    ]
}

fn arb_decision() -> impl Strategy<Value = TransferDecision> {
    prop_oneof![Just(TransferDecision::Accept), Just(TransferDecision::Reject)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Answering a terminal transfer is always AlreadyProcessed.
    #[test]
    fn prop_terminal_transfer_is_already_processed(
        sender in arb_uuid(),
        recipient in arb_uuid(),
        minor in 1i64..1_000_000,
        status in arb_terminal(),
        decision in arb_decision(),
    ) {
        prop_assume!(sender != recipient);
        let snapshot = TransferSnapshot {
            sender_id: sender,
            recipient_id: recipient,
            amount: Decimal::new(minor, 2),
            status,
        };
        let result = TransferService::plan_settlement(&snapshot, recipient, decision);
        prop_assert!(matches!(result, Err(WalletError::AlreadyProcessed)));
    }

    /// Nobody but the recipient can answer, whatever the status.
    #[test]
    fn prop_only_recipient_settles(
        sender in arb_uuid(),
        recipient in arb_uuid(),
        actor in arb_uuid(),
        decision in arb_decision(),
    ) {
        prop_assume!(actor != recipient);
        let snapshot = TransferSnapshot {
            sender_id: sender,
            recipient_id: recipient,
            amount: Decimal::ONE,
            status: TransactionStatus::PendingAcceptance,
        };
        let result = TransferService::plan_settlement(&snapshot, actor, decision);
        prop_assert!(matches!(result, Err(WalletError::NotAuthorized)));
    }

    /// Settlement always drains exactly the in-transit amount from the sender.
    #[test]
    fn prop_settlement_moves_full_amount(minor in 1i64..1_000_000, decision in arb_decision()) {
        let recipient = Uuid::new_v4();
        let amount = Decimal::new(minor, 2);
        let snapshot = TransferSnapshot {
            sender_id: Uuid::new_v4(),
            recipient_id: recipient,
            amount,
            status: TransactionStatus::PendingAcceptance,
        };
        let plan = TransferService::plan_settlement(&snapshot, recipient, decision).unwrap();
        prop_assert_eq!(plan.sender.amount(), amount);
        let recipient_gain = plan.recipient.map_or(Decimal::ZERO, |m| m.net());
        prop_assert_eq!(plan.sender.net() + recipient_gain, Decimal::ZERO);
    }

    /// Reviewing a withdrawal that is not pending never refunds.
    #[test]
    fn prop_terminal_withdrawal_rejected(status in arb_terminal(), minor in 1i64..1_000_000) {
        for decision in [WithdrawalDecision::Approve, WithdrawalDecision::Reject] {
            let result = WithdrawalService::plan_review(status, true, Decimal::new(minor, 2), decision);
            prop_assert!(matches!(result, Err(WalletError::InvalidState(_))));
        }
    }
}
