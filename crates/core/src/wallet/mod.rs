//! Wallet, escrow and ledger rules for CampusPay.
//!
//! Each service here is stateless and decides whether an operation is allowed
//! and which balance mutations it implies. The `campuspay-db` repositories
//! execute those plans atomically.
//!
//! # Modules
//!
//! - `types` - Transaction, order and listing status types
//! - `error` - Wallet error taxonomy
//! - `balance` - Balance fields and guarded mutations
//! - `escrow` - Marketplace purchase, release, cancel
//! - `transfer` - Acceptance-gated P2P transfers
//! - `withdrawal` - Withdrawal request and admin review
//! - `payment` - Tour fee and rent direct payments
//! - `gateway` - Payment gateway reconciliation and webhook signatures
//! - `events` - Post-commit event and notification contracts

pub mod balance;
pub mod error;
pub mod escrow;
pub mod events;
pub mod gateway;
pub mod payment;
pub mod transfer;
pub mod types;
pub mod withdrawal;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod gateway_props;
#[cfg(test)]
mod settlement_props;

pub use balance::{BalanceField, BalanceMutation, WalletBalance, validate_amount};
pub use error::WalletError;
pub use escrow::{CancelPlan, EscrowService, ItemSnapshot, OrderSnapshot, PurchasePlan, ReleasePlan};
pub use events::{EventPublisher, LedgerEvent, LedgerEventKind, Notification, NotificationDispatcher};
pub use gateway::{
    AccountIdentity, GatewayCharge, GatewayService, OwnerLookup, TopupCredit, WebhookEvent,
};
pub use payment::{DirectPaymentPlan, DirectPaymentService, ListingSnapshot, TourSnapshot};
pub use transfer::{SettlementPlan, TransferDecision, TransferPlan, TransferService, TransferSnapshot};
pub use types::{
    BankDetails, EscrowStatus, ItemStatus, ListingStatus, OrderStatus, TourPaymentStatus,
    TransactionStatus, TransactionType,
};
pub use withdrawal::{ReviewPlan, WithdrawalDecision, WithdrawalService};
