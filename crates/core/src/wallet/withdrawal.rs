//! Withdrawal request and admin review rules.

use rust_decimal::Decimal;

use crate::wallet::balance::{BalanceMutation, validate_amount};
use crate::wallet::error::WalletError;
use crate::wallet::types::{BankDetails, TransactionStatus};

/// Admin verdict on a pending withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalDecision {
    /// Payout was made; keep the debit.
    Approve,
    /// Payout refused; return the funds.
    Reject,
}

/// What a review does to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPlan {
    /// Status the withdrawal moves to.
    pub new_status: TransactionStatus,
    /// Credit back to the requester, present only on reject.
    pub refund: Option<BalanceMutation>,
}

/// Stateless service for withdrawal decisions.
pub struct WithdrawalService;

impl WithdrawalService {
    /// Validates a withdrawal request and returns the debit to apply.
    pub fn plan_request(
        amount: Decimal,
        bank_details: &BankDetails,
    ) -> Result<BalanceMutation, WalletError> {
        let amount = validate_amount(amount)?;
        bank_details.validate()?;
        Ok(BalanceMutation::Debit(amount))
    }

    /// Checks an admin review of a withdrawal.
    ///
    /// `amount` is the positive amount that was debited at request time.
    ///
    /// # Returns
    /// * `Err(WalletError::NotAuthorized)` if the reviewer is not an admin
    /// * `Err(WalletError::InvalidState)` if the withdrawal is no longer pending
    pub fn plan_review(
        current_status: TransactionStatus,
        reviewer_is_admin: bool,
        amount: Decimal,
        decision: WithdrawalDecision,
    ) -> Result<ReviewPlan, WalletError> {
        if !reviewer_is_admin {
            return Err(WalletError::NotAuthorized);
        }
        if current_status.is_terminal() {
            return Err(WalletError::InvalidState(format!(
                "withdrawal is already {current_status}"
            )));
        }
        if current_status != TransactionStatus::Pending {
            return Err(WalletError::InvalidState(format!(
                "withdrawal is {current_status}, not awaiting review"
            )));
        }
        Ok(match decision {
            WithdrawalDecision::Approve => ReviewPlan {
                new_status: TransactionStatus::Completed,
                refund: None,
            },
            WithdrawalDecision::Reject => ReviewPlan {
                new_status: TransactionStatus::Failed,
                refund: Some(BalanceMutation::Credit(amount.abs())),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn bank() -> BankDetails {
        BankDetails {
            bank_name: "GTBank".to_string(),
            account_number: "0123456789".to_string(),
            account_name: "Tolu Ade".to_string(),
        }
    }

    #[test]
    fn test_request_debits_available() {
        let plan = WithdrawalService::plan_request(dec!(1000), &bank()).unwrap();
        assert_eq!(plan, BalanceMutation::Debit(dec!(1000)));
    }

    #[test]
    fn test_request_rejects_bad_bank() {
        let mut details = bank();
        details.account_number = "123".to_string();
        assert!(matches!(
            WithdrawalService::plan_request(dec!(1000), &details),
            Err(WalletError::InvalidBankDetails(_))
        ));
    }

    #[test]
    fn test_reject_refunds() {
        let plan = WithdrawalService::plan_review(
            TransactionStatus::Pending,
            true,
            dec!(-1000),
            WithdrawalDecision::Reject,
        )
        .unwrap();
        assert_eq!(plan.new_status, TransactionStatus::Failed);
        assert_eq!(plan.refund, Some(BalanceMutation::Credit(dec!(1000))));
    }

    #[test]
    fn test_approve_keeps_debit() {
        let plan = WithdrawalService::plan_review(
            TransactionStatus::Pending,
            true,
            dec!(1000),
            WithdrawalDecision::Approve,
        )
        .unwrap();
        assert_eq!(plan.new_status, TransactionStatus::Completed);
        assert_eq!(plan.refund, None);
    }

    #[test]
    fn test_non_admin_rejected() {
        assert!(matches!(
            WithdrawalService::plan_review(
                TransactionStatus::Pending,
                false,
                dec!(1000),
                WithdrawalDecision::Approve,
            ),
            Err(WalletError::NotAuthorized)
        ));
    }

    #[rstest]
    #[case(TransactionStatus::Completed)]
    #[case(TransactionStatus::Failed)]
    fn test_review_after_terminal(#[case] status: TransactionStatus) {
        for decision in [WithdrawalDecision::Approve, WithdrawalDecision::Reject] {
            assert!(matches!(
                WithdrawalService::plan_review(status, true, dec!(1000), decision),
                Err(WalletError::InvalidState(_))
            ));
        }
    }
}
