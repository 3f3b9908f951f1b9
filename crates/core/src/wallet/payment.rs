//! One-shot direct payments: housing tour fees and rent.
//!
//! Both write a completed pair of rows sharing a pairing id, a `*_payment`
//! debit on the payer and a `*_earning` credit on the payee.

use rust_decimal::Decimal;
use uuid::Uuid;

use campuspay_shared::types::PairingId;

use crate::wallet::balance::{BalanceMutation, validate_amount};
use crate::wallet::error::WalletError;
use crate::wallet::types::{ListingStatus, TourPaymentStatus, TransactionType};

/// The parts of a tour request a fee payment needs.
#[derive(Debug, Clone, Copy)]
pub struct TourSnapshot {
    /// Student who asked for the tour.
    pub requester_id: Uuid,
    /// Host giving the tour.
    pub host_id: Uuid,
    /// Fee in major units.
    pub fee: Decimal,
    /// Whether the fee was paid.
    pub payment_status: TourPaymentStatus,
}

/// The parts of a housing listing a rent payment needs.
#[derive(Debug, Clone, Copy)]
pub struct ListingSnapshot {
    /// Landlord receiving rent.
    pub landlord_id: Uuid,
    /// Rent in major units.
    pub rent_amount: Decimal,
    /// Availability.
    pub status: ListingStatus,
}

/// A validated direct payment ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectPaymentPlan {
    /// Shared by both legs.
    pub pairing_id: PairingId,
    /// Who pays.
    pub payer_id: Uuid,
    /// Who gets paid.
    pub payee_id: Uuid,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Row type on the payer.
    pub debit_type: TransactionType,
    /// Row type on the payee.
    pub credit_type: TransactionType,
}

impl DirectPaymentPlan {
    /// Payer mutation.
    #[must_use]
    pub fn payer_mutation(&self) -> BalanceMutation {
        BalanceMutation::Debit(self.amount)
    }

    /// Payee mutation.
    #[must_use]
    pub fn payee_mutation(&self) -> BalanceMutation {
        BalanceMutation::Credit(self.amount)
    }
}

/// Stateless service for direct payment decisions.
pub struct DirectPaymentService;

impl DirectPaymentService {
    /// Checks a tour fee payment by `payer_id`.
    ///
    /// # Returns
    /// * `Err(WalletError::NotAuthorized)` if the payer did not request the tour
    /// * `Err(WalletError::AlreadyProcessed)` if the fee was already paid
    pub fn plan_tour_fee(
        tour: &TourSnapshot,
        payer_id: Uuid,
    ) -> Result<DirectPaymentPlan, WalletError> {
        if tour.requester_id != payer_id {
            return Err(WalletError::NotAuthorized);
        }
        if tour.payment_status == TourPaymentStatus::Paid {
            return Err(WalletError::AlreadyProcessed);
        }
        Self::plan(
            payer_id,
            tour.host_id,
            tour.fee,
            TransactionType::TourPayment,
            TransactionType::TourEarning,
        )
    }

    /// Checks a rent payment by `payer_id`.
    ///
    /// # Returns
    /// * `Err(WalletError::NotAuthorized)` if the payer is the landlord
    /// * `Err(WalletError::ItemUnavailable)` if the listing is already rented
    pub fn plan_rent(
        listing: &ListingSnapshot,
        payer_id: Uuid,
    ) -> Result<DirectPaymentPlan, WalletError> {
        if listing.landlord_id == payer_id {
            return Err(WalletError::NotAuthorized);
        }
        if listing.status != ListingStatus::Available {
            return Err(WalletError::ItemUnavailable);
        }
        Self::plan(
            payer_id,
            listing.landlord_id,
            listing.rent_amount,
            TransactionType::RentPayment,
            TransactionType::RentEarning,
        )
    }

    fn plan(
        payer_id: Uuid,
        payee_id: Uuid,
        amount: Decimal,
        debit_type: TransactionType,
        credit_type: TransactionType,
    ) -> Result<DirectPaymentPlan, WalletError> {
        if payer_id == payee_id {
            return Err(WalletError::SelfTransfer);
        }
        Ok(DirectPaymentPlan {
            pairing_id: PairingId::new(),
            payer_id,
            payee_id,
            amount: validate_amount(amount)?,
            debit_type,
            credit_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tour(status: TourPaymentStatus) -> TourSnapshot {
        TourSnapshot {
            requester_id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            fee: dec!(1500),
            payment_status: status,
        }
    }

    fn listing(status: ListingStatus) -> ListingSnapshot {
        ListingSnapshot {
            landlord_id: Uuid::new_v4(),
            rent_amount: dec!(250000),
            status,
        }
    }

    #[test]
    fn test_tour_fee_plan() {
        let t = tour(TourPaymentStatus::Unpaid);
        let plan = DirectPaymentService::plan_tour_fee(&t, t.requester_id).unwrap();
        assert_eq!(plan.payee_id, t.host_id);
        assert_eq!(plan.debit_type, TransactionType::TourPayment);
        assert_eq!(plan.credit_type, TransactionType::TourEarning);
        assert_eq!(plan.payer_mutation(), BalanceMutation::Debit(dec!(1500)));
        assert_eq!(plan.payee_mutation(), BalanceMutation::Credit(dec!(1500)));
    }

    #[test]
    fn test_tour_fee_paid_twice() {
        let t = tour(TourPaymentStatus::Paid);
        assert!(matches!(
            DirectPaymentService::plan_tour_fee(&t, t.requester_id),
            Err(WalletError::AlreadyProcessed)
        ));
    }

    #[test]
    fn test_tour_fee_by_stranger() {
        let t = tour(TourPaymentStatus::Unpaid);
        assert!(matches!(
            DirectPaymentService::plan_tour_fee(&t, Uuid::new_v4()),
            Err(WalletError::NotAuthorized)
        ));
    }

    #[test]
    fn test_rent_plan() {
        let l = listing(ListingStatus::Available);
        let tenant = Uuid::new_v4();
        let plan = DirectPaymentService::plan_rent(&l, tenant).unwrap();
        assert_eq!(plan.payer_id, tenant);
        assert_eq!(plan.payee_id, l.landlord_id);
        assert_eq!(plan.amount, dec!(250000));
    }

    #[test]
    fn test_rent_on_rented_listing() {
        let l = listing(ListingStatus::Rented);
        assert!(matches!(
            DirectPaymentService::plan_rent(&l, Uuid::new_v4()),
            Err(WalletError::ItemUnavailable)
        ));
    }

    #[test]
    fn test_landlord_cannot_pay_own_rent() {
        let l = listing(ListingStatus::Available);
        assert!(matches!(
            DirectPaymentService::plan_rent(&l, l.landlord_id),
            Err(WalletError::NotAuthorized)
        ));
    }
}
