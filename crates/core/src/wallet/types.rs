//! Wallet domain types.
//!
//! String forms match the values stored in the database and returned by the API.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::wallet::error::WalletError;

/// Kind of a wallet transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Gateway top-up credited to available.
    Topup,
    /// Withdrawal to a bank account.
    Withdrawal,
    /// Sender leg of a P2P transfer.
    TransferOut,
    /// Recipient leg of a P2P transfer.
    TransferIn,
    /// Buyer funds moved into escrow at purchase.
    EscrowHold,
    /// Escrowed funds paid out to the seller.
    EscrowRelease,
    /// Escrowed funds returned to the buyer after cancel.
    EscrowRefund,
    /// Requester leg of a housing tour fee.
    TourPayment,
    /// Host leg of a housing tour fee.
    TourEarning,
    /// Tenant leg of a rent payment.
    RentPayment,
    /// Landlord leg of a rent payment.
    RentEarning,
}

impl TransactionType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topup => "topup",
            Self::Withdrawal => "withdrawal",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
            Self::EscrowHold => "escrow_hold",
            Self::EscrowRelease => "escrow_release",
            Self::EscrowRefund => "escrow_refund",
            Self::TourPayment => "tour_payment",
            Self::TourEarning => "tour_earning",
            Self::RentPayment => "rent_payment",
            Self::RentEarning => "rent_earning",
        }
    }

    /// Returns true if rows of this type carry a negative amount for their owner.
    #[must_use]
    pub fn is_outflow(&self) -> bool {
        matches!(
            self,
            Self::Withdrawal
                | Self::TransferOut
                | Self::EscrowHold
                | Self::TourPayment
                | Self::RentPayment
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a wallet transaction.
///
/// Status only moves forward:
/// - Pending → Completed | Failed (withdrawal)
/// - PendingAcceptance → Completed | Rejected (transfer)
/// - everything else is written as Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting admin review.
    Pending,
    /// Awaiting the recipient's decision.
    PendingAcceptance,
    /// Settled.
    Completed,
    /// Rejected by an admin; funds returned.
    Failed,
    /// Declined by the recipient; funds returned.
    Rejected,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingAcceptance => "pending_acceptance",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Rejected)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfilment status of a marketplace order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid into escrow, seller has not started.
    Pending,
    /// Seller is preparing the item.
    Processing,
    /// Item handed over for delivery.
    Shipping,
    /// Buyer confirmed receipt.
    Delivered,
    /// Buyer cancelled and was refunded.
    Cancelled,
}

impl OrderStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if the buyer may still cancel.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Returns true if a seller may move the order from `self` to `next`.
    ///
    /// `Delivered` is only reachable through buyer confirmation.
    #[must_use]
    pub fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing) | (Self::Processing, Self::Shipping)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escrow state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Funds sit in the buyer's escrow balance.
    Held,
    /// Funds were paid to the seller.
    Released,
    /// Funds were returned to the buyer.
    Refunded,
}

impl EscrowStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Held => "held",
            Self::Released => "released",
            Self::Refunded => "refunded",
        }
    }

}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a market item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Can be purchased.
    Available,
    /// Held by an order.
    Sold,
}

/// Payment state of a housing tour request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourPaymentStatus {
    /// Fee not paid yet.
    Unpaid,
    /// Fee paid to the host.
    Paid,
}

/// Availability of a housing listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Open for rent.
    Available,
    /// Rent has been paid.
    Rented,
}

/// Bank account a withdrawal is paid out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    /// Bank name.
    pub bank_name: String,
    /// 10-digit account number (NUBAN).
    pub account_number: String,
    /// Account holder name.
    pub account_name: String,
}

/// Length of a NUBAN account number.
pub const ACCOUNT_NUMBER_LEN: usize = 10;

impl BankDetails {
    /// Validates the snapshot before it is stored on a withdrawal.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.bank_name.trim().is_empty() {
            return Err(WalletError::InvalidBankDetails(
                "bank name is required".to_string(),
            ));
        }
        if self.account_name.trim().is_empty() {
            return Err(WalletError::InvalidBankDetails(
                "account name is required".to_string(),
            ));
        }
        if self.account_number.len() != ACCOUNT_NUMBER_LEN
            || !self.account_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(WalletError::InvalidBankDetails(format!(
                "account number must be {ACCOUNT_NUMBER_LEN} digits"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OrderStatus::Pending, OrderStatus::Processing, true)]
    #[case(OrderStatus::Processing, OrderStatus::Shipping, true)]
    #[case(OrderStatus::Pending, OrderStatus::Shipping, false)]
    #[case(OrderStatus::Shipping, OrderStatus::Delivered, false)]
    #[case(OrderStatus::Shipping, OrderStatus::Processing, false)]
    #[case(OrderStatus::Cancelled, OrderStatus::Processing, false)]
    #[case(OrderStatus::Delivered, OrderStatus::Shipping, false)]
    fn test_order_advance(
        #[case] from: OrderStatus,
        #[case] to: OrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_advance_to(to), allowed);
    }

    #[rstest]
    #[case(OrderStatus::Pending, true)]
    #[case(OrderStatus::Processing, true)]
    #[case(OrderStatus::Shipping, false)]
    #[case(OrderStatus::Delivered, false)]
    #[case(OrderStatus::Cancelled, false)]
    fn test_order_cancellable(#[case] status: OrderStatus, #[case] cancellable: bool) {
        assert_eq!(status.is_cancellable(), cancellable);
    }

    #[rstest]
    #[case(TransactionStatus::Pending, false)]
    #[case(TransactionStatus::PendingAcceptance, false)]
    #[case(TransactionStatus::Completed, true)]
    #[case(TransactionStatus::Failed, true)]
    #[case(TransactionStatus::Rejected, true)]
    fn test_status_terminal(#[case] status: TransactionStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(TransactionType::TransferOut.to_string(), "transfer_out");
        assert_eq!(
            serde_json::to_value(TransactionStatus::PendingAcceptance).unwrap(),
            serde_json::json!(TransactionStatus::PendingAcceptance.as_str())
        );
        assert_eq!(EscrowStatus::Refunded.to_string(), "refunded");
    }

    #[test]
    fn test_outflow_types() {
        assert!(TransactionType::EscrowHold.is_outflow());
        assert!(TransactionType::Withdrawal.is_outflow());
        assert!(!TransactionType::TransferIn.is_outflow());
        assert!(!TransactionType::EscrowRefund.is_outflow());
    }

    fn bank(number: &str, name: &str) -> BankDetails {
        BankDetails {
            bank_name: "First Bank".to_string(),
            account_number: number.to_string(),
            account_name: name.to_string(),
        }
    }

    #[test]
    fn test_bank_details_validation() {
        assert!(bank("0123456789", "Ada Obi").validate().is_ok());
        assert!(matches!(
            bank("12345", "Ada Obi").validate(),
            Err(WalletError::InvalidBankDetails(_))
        ));
        assert!(matches!(
            bank("01234567ab", "Ada Obi").validate(),
            Err(WalletError::InvalidBankDetails(_))
        ));
        assert!(matches!(
            bank("0123456789", "  ").validate(),
            Err(WalletError::InvalidBankDetails(_))
        ));
    }
}
