//! Account balances and the mutations that move money between them.
//!
//! The database applies each [`BalanceMutation`] as one conditional update:
//! every positive delta is added, every negative delta is subtracted, and the
//! statement only matches when the guarded field covers the amount. [`apply`]
//! is the same rule over plain values.
//!
//! [`apply`]: BalanceMutation::apply

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use campuspay_shared::types::money::has_wallet_scale;

use crate::wallet::error::WalletError;

/// Balance fields held on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Spendable funds.
    pub available: Decimal,
    /// Funds locked for open marketplace orders.
    pub escrow: Decimal,
    /// Funds sent in transfers the recipient has not answered yet.
    pub in_transit: Decimal,
}

impl WalletBalance {
    /// Creates a balance with only available funds.
    #[must_use]
    pub fn with_available(available: Decimal) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }

    /// Sum of all fields.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.escrow + self.in_transit
    }

    /// Returns true if no field is negative.
    #[must_use]
    pub fn is_non_negative(&self) -> bool {
        !self.available.is_sign_negative()
            && !self.escrow.is_sign_negative()
            && !self.in_transit.is_sign_negative()
    }

    fn field(&self, field: BalanceField) -> Decimal {
        match field {
            BalanceField::Available => self.available,
            BalanceField::Escrow => self.escrow,
            BalanceField::InTransit => self.in_transit,
        }
    }

    fn field_mut(&mut self, field: BalanceField) -> &mut Decimal {
        match field {
            BalanceField::Available => &mut self.available,
            BalanceField::Escrow => &mut self.escrow,
            BalanceField::InTransit => &mut self.in_transit,
        }
    }
}

/// One of the balance columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceField {
    /// `available_balance`
    Available,
    /// `escrow_balance`
    Escrow,
    /// `in_transit_balance`
    InTransit,
}

/// A single-account balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMutation {
    /// available += amount
    Credit(Decimal),
    /// available -= amount, gated on available
    Debit(Decimal),
    /// available → escrow, gated on available
    Hold(Decimal),
    /// escrow -= amount, gated on escrow
    ReleaseEscrow(Decimal),
    /// escrow → available, gated on escrow
    RefundEscrow(Decimal),
    /// available → in_transit, gated on available
    SendInTransit(Decimal),
    /// in_transit -= amount, gated on in_transit
    SettleInTransit(Decimal),
    /// in_transit → available, gated on in_transit
    ReturnInTransit(Decimal),
}

impl BalanceMutation {
    /// Amount moved.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        match *self {
            Self::Credit(a)
            | Self::Debit(a)
            | Self::Hold(a)
            | Self::ReleaseEscrow(a)
            | Self::RefundEscrow(a)
            | Self::SendInTransit(a)
            | Self::SettleInTransit(a)
            | Self::ReturnInTransit(a) => a,
        }
    }

    /// Field that must cover the amount, if any.
    #[must_use]
    pub fn guard(&self) -> Option<BalanceField> {
        match self {
            Self::Credit(_) => None,
            Self::Debit(_) | Self::Hold(_) | Self::SendInTransit(_) => Some(BalanceField::Available),
            Self::ReleaseEscrow(_) | Self::RefundEscrow(_) => Some(BalanceField::Escrow),
            Self::SettleInTransit(_) | Self::ReturnInTransit(_) => Some(BalanceField::InTransit),
        }
    }

    /// Signed change per field.
    #[must_use]
    pub fn deltas(&self) -> Vec<(BalanceField, Decimal)> {
        let a = self.amount();
        match self {
            Self::Credit(_) => vec![(BalanceField::Available, a)],
            Self::Debit(_) => vec![(BalanceField::Available, -a)],
            Self::Hold(_) => vec![(BalanceField::Available, -a), (BalanceField::Escrow, a)],
            Self::ReleaseEscrow(_) => vec![(BalanceField::Escrow, -a)],
            Self::RefundEscrow(_) => vec![(BalanceField::Escrow, -a), (BalanceField::Available, a)],
            Self::SendInTransit(_) => {
                vec![(BalanceField::Available, -a), (BalanceField::InTransit, a)]
            }
            Self::SettleInTransit(_) => vec![(BalanceField::InTransit, -a)],
            Self::ReturnInTransit(_) => {
                vec![(BalanceField::InTransit, -a), (BalanceField::Available, a)]
            }
        }
    }

    /// Net change to the account total.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.deltas().iter().map(|(_, d)| *d).sum()
    }

    /// Applies the mutation, or returns `None` when the guarded field is short.
    #[must_use]
    pub fn apply(&self, balance: &WalletBalance) -> Option<WalletBalance> {
        if let Some(guard) = self.guard() {
            if balance.field(guard) < self.amount() {
                return None;
            }
        }
        let mut next = *balance;
        for (field, delta) in self.deltas() {
            *next.field_mut(field) += delta;
        }
        Some(next)
    }

    /// Error to report when the guard rejects the mutation.
    ///
    /// A short available balance is the caller's problem. A short escrow or
    /// in-transit balance means earlier bookkeeping went wrong.
    #[must_use]
    pub fn shortfall_error(&self, user_id: uuid::Uuid) -> WalletError {
        match self.guard() {
            Some(BalanceField::Escrow) => WalletError::LedgerIntegrity(format!(
                "escrow balance of user {user_id} does not cover {}",
                self.amount()
            )),
            Some(BalanceField::InTransit) => WalletError::LedgerIntegrity(format!(
                "in-transit balance of user {user_id} does not cover {}",
                self.amount()
            )),
            Some(BalanceField::Available) | None => WalletError::InsufficientFunds,
        }
    }
}

/// Validates a user-supplied amount: positive with at most two decimal places.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, WalletError> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if !has_wallet_scale(amount) {
        return Err(WalletError::InvalidAmount(
            "amount cannot have more than two decimal places".to_string(),
        ));
    }
    Ok(amount.normalize())
}
