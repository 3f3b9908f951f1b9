//! Direct payment repository: housing tour fees and rent.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use campuspay_core::wallet::{
    DirectPaymentPlan, DirectPaymentService, ListingSnapshot, TourSnapshot, WalletBalance,
    WalletError,
};

use crate::entities::{
    housing_listings, sea_orm_active_enums::{ListingStatus, TourPaymentStatus}, tour_requests,
    wallet_transactions,
};

use super::ledger::{NewTransaction, apply_mutation, db_err, fetch_balance, insert_transaction};

/// Result of a direct payment.
#[derive(Debug, Clone)]
pub struct DirectPaymentOutcome {
    /// Payer leg.
    pub payer_leg: wallet_transactions::Model,
    /// Payee leg.
    pub payee_leg: wallet_transactions::Model,
    /// Payer balances afterwards.
    pub payer_balance: WalletBalance,
    /// Payee balances afterwards.
    pub payee_balance: WalletBalance,
}

/// Direct payment repository.
#[derive(Debug, Clone)]
pub struct DirectPaymentRepository {
    db: DatabaseConnection,
}

impl DirectPaymentRepository {
    /// Creates a new direct payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pays the fee of a tour request to its host.
    ///
    /// # Errors
    ///
    /// * `WalletError::TourNotFound`
    /// * `WalletError::NotAuthorized` unless `payer_id` requested the tour
    /// * `WalletError::AlreadyProcessed` if the fee was already paid
    /// * `WalletError::InsufficientFunds`
    pub async fn pay_tour_fee(&self, tour_id: Uuid, payer_id: Uuid) -> Result<DirectPaymentOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let tour = tour_requests::Entity::find_by_id(tour_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WalletError::TourNotFound(tour_id))?;
        let plan = DirectPaymentService::plan_tour_fee(
            &TourSnapshot {
                requester_id: tour.requester_id,
                host_id: tour.host_id,
                fee: tour.fee,
                payment_status: tour.payment_status.into(),
            },
            payer_id,
        )?;

        let now = Utc::now();
        let marked = tour_requests::Entity::update_many()
            .col_expr(tour_requests::Column::PaymentStatus, Expr::value(TourPaymentStatus::Paid))
            .col_expr(tour_requests::Column::PaidAt, Expr::value(now))
            .col_expr(tour_requests::Column::UpdatedAt, Expr::value(now))
            .filter(tour_requests::Column::Id.eq(tour_id))
            .filter(tour_requests::Column::PaymentStatus.eq(TourPaymentStatus::Unpaid))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if marked.rows_affected == 0 {
            return Err(WalletError::AlreadyProcessed);
        }

        let outcome = execute(&txn, &plan, "Housing tour fee").await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            tour_id = %tour_id,
            payer_id = %plan.payer_id,
            host_id = %plan.payee_id,
            amount = %plan.amount,
            "tour fee paid"
        );
        Ok(outcome)
    }

    /// Pays rent on a listing to its landlord and marks it rented.
    ///
    /// # Errors
    ///
    /// * `WalletError::ListingNotFound`
    /// * `WalletError::NotAuthorized` when the landlord pays their own rent
    /// * `WalletError::ItemUnavailable` if the listing is already rented
    /// * `WalletError::InsufficientFunds`
    pub async fn pay_rent(&self, listing_id: Uuid, payer_id: Uuid) -> Result<DirectPaymentOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let listing = housing_listings::Entity::find_by_id(listing_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WalletError::ListingNotFound(listing_id))?;
        let plan = DirectPaymentService::plan_rent(
            &ListingSnapshot {
                landlord_id: listing.landlord_id,
                rent_amount: listing.rent_amount,
                status: listing.status.into(),
            },
            payer_id,
        )?;

        let marked = housing_listings::Entity::update_many()
            .col_expr(housing_listings::Column::Status, Expr::value(ListingStatus::Rented))
            .col_expr(housing_listings::Column::TenantId, Expr::value(payer_id))
            .col_expr(housing_listings::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(housing_listings::Column::Id.eq(listing_id))
            .filter(housing_listings::Column::Status.eq(ListingStatus::Available))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if marked.rows_affected == 0 {
            return Err(WalletError::ItemUnavailable);
        }

        let outcome = execute(&txn, &plan, &format!("Rent for {}", listing.title)).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            listing_id = %listing_id,
            payer_id = %plan.payer_id,
            landlord_id = %plan.payee_id,
            amount = %plan.amount,
            "rent paid"
        );
        Ok(outcome)
    }
}

/// Moves the money and writes both legs.
async fn execute(
    txn: &DatabaseTransaction,
    plan: &DirectPaymentPlan,
    description: &str,
) -> Result<DirectPaymentOutcome, WalletError> {
    apply_mutation(txn, plan.payer_id, plan.payer_mutation()).await?;
    apply_mutation(txn, plan.payee_id, plan.payee_mutation()).await?;

    let pairing_id = plan.pairing_id.into_inner();
    let payer_leg = insert_transaction(
        txn,
        NewTransaction::completed(plan.payer_id, plan.debit_type, plan.amount)
            .related_to(plan.payee_id)
            .paired(pairing_id)
            .described(description),
    )
    .await
    .map_err(db_err)?;
    let payee_leg = insert_transaction(
        txn,
        NewTransaction::completed(plan.payee_id, plan.credit_type, plan.amount)
            .related_to(plan.payer_id)
            .paired(pairing_id)
            .described(description),
    )
    .await
    .map_err(db_err)?;

    Ok(DirectPaymentOutcome {
        payer_leg,
        payee_leg,
        payer_balance: fetch_balance(txn, plan.payer_id).await?,
        payee_balance: fetch_balance(txn, plan.payee_id).await?,
    })
}
