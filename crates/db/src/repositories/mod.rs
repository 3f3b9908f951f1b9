//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Money-moving repositories return `WalletError`; plain lookups return `DbErr`.

pub mod escrow;
pub mod ledger;
pub mod notification;
pub mod payment;
pub mod topup;
pub mod transfer;
pub mod user;
pub mod wallet;
pub mod withdrawal;

pub use escrow::{EscrowRepository, OrderOutcome, PurchaseOutcome};
pub use notification::NotificationRepository;
pub use payment::{DirectPaymentOutcome, DirectPaymentRepository};
pub use topup::{TopupOutcome, TopupRepository};
pub use transfer::{SettlementOutcome, TransferOutcome, TransferRepository};
pub use user::UserRepository;
pub use wallet::WalletRepository;
pub use withdrawal::{WithdrawalOutcome, WithdrawalRepository};
