//! Withdrawal repository: requests and admin review.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use campuspay_core::wallet::{
    BankDetails, TransactionStatus, TransactionType, WalletBalance, WalletError,
    WithdrawalDecision, WithdrawalService,
};
use campuspay_shared::types::{PageRequest, PageResponse};

use crate::entities::{sea_orm_active_enums, wallet_transactions};

use super::ledger::{NewTransaction, apply_mutation, db_err, fetch_balance, insert_transaction};

/// Result of a withdrawal request or review.
#[derive(Debug, Clone)]
pub struct WithdrawalOutcome {
    /// The withdrawal row.
    pub transaction: wallet_transactions::Model,
    /// Requester balances afterwards.
    pub balance: WalletBalance,
}

/// Withdrawal repository.
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    db: DatabaseConnection,
}

impl WithdrawalRepository {
    /// Creates a new withdrawal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Debits `amount` and records a pending withdrawal to `bank_details`.
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` / `InvalidBankDetails`
    /// * `WalletError::InsufficientFunds`
    pub async fn request(
        &self,
        user_id: Uuid,
        amount: Decimal,
        bank_details: &BankDetails,
    ) -> Result<WithdrawalOutcome, WalletError> {
        let debit = WithdrawalService::plan_request(amount, bank_details)?;
        let snapshot = serde_json::to_value(bank_details)
            .map_err(|e| WalletError::InvalidBankDetails(e.to_string()))?;

        let txn = self.db.begin().await.map_err(db_err)?;
        apply_mutation(&txn, user_id, debit).await?;

        let mut row = NewTransaction::completed(user_id, TransactionType::Withdrawal, debit.amount())
            .with_status(TransactionStatus::Pending)
            .described(format!("Withdrawal to {}", bank_details.bank_name));
        row.bank_details = Some(snapshot);
        let transaction = insert_transaction(&txn, row).await.map_err(db_err)?;

        let balance = fetch_balance(&txn, user_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            amount = %debit.amount(),
            "withdrawal requested"
        );

        Ok(WithdrawalOutcome {
            transaction,
            balance,
        })
    }

    /// Approves a pending withdrawal. The debit stands.
    ///
    /// # Errors
    ///
    /// * `WalletError::NotAuthorized` for non-admins
    /// * `WalletError::InvalidState` if not pending
    pub async fn approve(
        &self,
        transaction_id: Uuid,
        admin_id: Uuid,
        is_admin: bool,
    ) -> Result<WithdrawalOutcome, WalletError> {
        self.review(transaction_id, admin_id, is_admin, WithdrawalDecision::Approve)
            .await
    }

    /// Rejects a pending withdrawal and refunds the requester.
    ///
    /// # Errors
    ///
    /// Same as [`approve`](Self::approve).
    pub async fn reject(
        &self,
        transaction_id: Uuid,
        admin_id: Uuid,
        is_admin: bool,
    ) -> Result<WithdrawalOutcome, WalletError> {
        self.review(transaction_id, admin_id, is_admin, WithdrawalDecision::Reject)
            .await
    }

    async fn review(
        &self,
        transaction_id: Uuid,
        admin_id: Uuid,
        is_admin: bool,
        decision: WithdrawalDecision,
    ) -> Result<WithdrawalOutcome, WalletError> {
        if !is_admin {
            return Err(WalletError::NotAuthorized);
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let row = wallet_transactions::Entity::find_by_id(transaction_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .filter(|r| r.transaction_type == sea_orm_active_enums::TransactionType::Withdrawal)
            .ok_or(WalletError::TransactionNotFound(transaction_id))?;

        let plan =
            WithdrawalService::plan_review(row.status.into(), is_admin, row.amount.abs(), decision)?;

        let now = Utc::now();
        let updated = wallet_transactions::Entity::update_many()
            .col_expr(
                wallet_transactions::Column::Status,
                Expr::value(sea_orm_active_enums::TransactionStatus::from(plan.new_status)),
            )
            .col_expr(wallet_transactions::Column::ProcessedBy, Expr::value(admin_id))
            .col_expr(wallet_transactions::Column::ProcessedAt, Expr::value(now))
            .col_expr(wallet_transactions::Column::UpdatedAt, Expr::value(now))
            .filter(wallet_transactions::Column::Id.eq(transaction_id))
            .filter(
                wallet_transactions::Column::Status.eq(sea_orm_active_enums::TransactionStatus::Pending),
            )
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(WalletError::InvalidState(format!(
                "withdrawal {transaction_id} was already reviewed"
            )));
        }

        if let Some(refund) = plan.refund {
            apply_mutation(&txn, row.user_id, refund).await?;
        }

        let transaction = wallet_transactions::Entity::find_by_id(transaction_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WalletError::TransactionNotFound(transaction_id))?;
        let balance = fetch_balance(&txn, row.user_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            transaction_id = %transaction_id,
            admin_id = %admin_id,
            user_id = %row.user_id,
            status = %plan.new_status,
            "withdrawal reviewed"
        );

        Ok(WithdrawalOutcome {
            transaction,
            balance,
        })
    }

    /// Pending withdrawals for the admin dashboard, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending(
        &self,
        page: &PageRequest,
    ) -> Result<PageResponse<wallet_transactions::Model>, WalletError> {
        let page = page.clamped();
        let query = wallet_transactions::Entity::find()
            .filter(
                wallet_transactions::Column::TransactionType
                    .eq(sea_orm_active_enums::TransactionType::Withdrawal),
            )
            .filter(
                wallet_transactions::Column::Status.eq(sea_orm_active_enums::TransactionStatus::Pending),
            );

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_asc(wallet_transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }
}
