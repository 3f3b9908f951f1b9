//! Wallet error types.
//!
//! Every ledger operation fails with one of these. A failed operation leaves
//! no partial balance state behind.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during wallet and escrow operations.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The gated balance is smaller than the amount.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Amount is not positive or has more than two decimal places.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The item or listing is not available for purchase.
    #[error("Item is not available")]
    ItemUnavailable,

    /// Escrow for this order has already been released.
    #[error("Escrow for order {0} has already been released")]
    AlreadyReleased(Uuid),

    /// The order has progressed too far to be cancelled.
    #[error("Order {order_id} cannot be cancelled in status {status}")]
    NotCancellable {
        /// The order.
        order_id: Uuid,
        /// Its current status.
        status: String,
    },

    /// Sender and recipient are the same account.
    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    /// The transaction or reference was already processed.
    #[error("Already processed")]
    AlreadyProcessed,

    /// The actor is not allowed to perform this operation.
    #[error("Not authorized to perform this operation")]
    NotAuthorized,

    /// A verified gateway payment belongs to another account.
    #[error("Payment does not belong to this account")]
    OwnershipMismatch,

    /// Webhook signature did not verify.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// A balance that must cover an amount did not. Indicates corrupted state.
    #[error("Ledger integrity violation: {0}")]
    LedgerIntegrity(String),

    /// The entity is not in a state that allows this operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Bank details on a withdrawal request are malformed.
    #[error("Invalid bank details: {0}")]
    InvalidBankDetails(String),

    /// A gateway charge settled in a currency other than the wallet's.
    #[error("Payment currency {charged} does not match wallet currency {wallet}")]
    CurrencyMismatch {
        /// Currency the gateway reported.
        charged: String,
        /// Currency wallets are denominated in.
        wallet: String,
    },

    /// The gateway reports the payment did not succeed.
    #[error("Payment was not successful (gateway status: {0})")]
    PaymentNotSuccessful(String),

    /// User not found.
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    /// Order not found.
    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    /// Market item not found.
    #[error("Item {0} not found")]
    ItemNotFound(Uuid),

    /// Wallet transaction not found.
    #[error("Transaction {0} not found")]
    TransactionNotFound(Uuid),

    /// Tour request not found.
    #[error("Tour request {0} not found")]
    TourNotFound(Uuid),

    /// Housing listing not found.
    #[error("Listing {0} not found")]
    ListingNotFound(Uuid),

    /// Payment gateway call failed.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WalletError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_)
            | Self::SelfTransfer
            | Self::InvalidBankDetails(_)
            | Self::CurrencyMismatch { .. } => 400,

            Self::InvalidSignature => 401,

            Self::NotAuthorized | Self::OwnershipMismatch => 403,

            Self::UserNotFound(_)
            | Self::OrderNotFound(_)
            | Self::ItemNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::TourNotFound(_)
            | Self::ListingNotFound(_) => 404,

            Self::ItemUnavailable
            | Self::AlreadyReleased(_)
            | Self::NotCancellable { .. }
            | Self::AlreadyProcessed
            | Self::InvalidState(_) => 409,

            Self::InsufficientFunds | Self::PaymentNotSuccessful(_) => 422,

            Self::LedgerIntegrity(_) | Self::Database(_) => 500,

            Self::Gateway(_) => 502,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::ItemUnavailable => "ITEM_UNAVAILABLE",
            Self::AlreadyReleased(_) => "ALREADY_RELEASED",
            Self::NotCancellable { .. } => "NOT_CANCELLABLE",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::AlreadyProcessed => "ALREADY_PROCESSED",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::OwnershipMismatch => "OWNERSHIP_MISMATCH",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::LedgerIntegrity(_) => "LEDGER_INTEGRITY",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidBankDetails(_) => "INVALID_BANK_DETAILS",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::PaymentNotSuccessful(_) => "PAYMENT_NOT_SUCCESSFUL",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TourNotFound(_) => "TOUR_NOT_FOUND",
            Self::ListingNotFound(_) => "LISTING_NOT_FOUND",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if this error means the ledger itself is inconsistent.
    ///
    /// Fatal errors must be logged at error level and never retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LedgerIntegrity(_))
    }
}
