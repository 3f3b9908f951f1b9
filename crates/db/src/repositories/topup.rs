//! Gateway top-up repository: idempotent credits keyed by external reference.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use campuspay_core::wallet::{
    AccountIdentity, OwnerLookup, TopupCredit, TransactionType, WalletBalance, WalletError,
};

use crate::entities::{users, wallet_transactions};

use super::ledger::{
    NewTransaction, apply_mutation, db_err, db_err_unique_as_processed, fetch_balance,
    insert_transaction,
};
use super::user::UserRepository;

/// Result of a credited top-up.
#[derive(Debug, Clone)]
pub struct TopupOutcome {
    /// The `topup` row.
    pub transaction: wallet_transactions::Model,
    /// Balances after the credit.
    pub balance: WalletBalance,
}

fn identity(user: users::Model) -> AccountIdentity {
    AccountIdentity {
        id: user.id,
        email: user.email,
    }
}

/// Top-up repository.
#[derive(Debug, Clone)]
pub struct TopupRepository {
    db: DatabaseConnection,
    users: UserRepository,
}

impl TopupRepository {
    /// Creates a new top-up repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let users = UserRepository::new(db.clone());
        Self { db, users }
    }

    /// Returns true if a transaction already carries `reference`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reference_exists(&self, reference: &str) -> Result<bool, WalletError> {
        let count = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::Reference.eq(reference))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Identity of the account asking to be credited.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::UserNotFound` for an unknown user.
    pub async fn account(&self, user_id: Uuid) -> Result<AccountIdentity, WalletError> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(db_err)?
            .map(identity)
            .ok_or(WalletError::UserNotFound(user_id))
    }

    /// Resolves the owner of a webhook charge.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn resolve_owner(&self, lookup: &OwnerLookup) -> Result<Option<AccountIdentity>, WalletError> {
        let user = match lookup {
            OwnerLookup::ById(id) => self.users.find_by_id(*id).await,
            OwnerLookup::ByEmail(email) => self.users.find_by_email(email).await,
            OwnerLookup::Unknown => return Ok(None),
        };
        Ok(user.map_err(db_err)?.map(identity))
    }

    /// Credits a verified top-up exactly once per reference.
    ///
    /// The row is inserted before the balance moves, so a concurrent credit
    /// for the same reference fails on the unique index and rolls back.
    ///
    /// # Errors
    ///
    /// * `WalletError::AlreadyProcessed` if the reference was already credited
    /// * `WalletError::UserNotFound`
    pub async fn credit(&self, credit: &TopupCredit) -> Result<TopupOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut row = NewTransaction::completed(credit.user_id, TransactionType::Topup, credit.amount)
            .described("Wallet top-up");
        row.reference = Some(credit.reference.clone());
        let transaction = insert_transaction(&txn, row)
            .await
            .map_err(db_err_unique_as_processed)?;

        apply_mutation(&txn, credit.user_id, credit.mutation()).await?;

        let balance = fetch_balance(&txn, credit.user_id).await?;
        txn.commit().await.map_err(db_err_unique_as_processed)?;

        info!(
            user_id = %credit.user_id,
            reference = %credit.reference,
            amount = %credit.amount,
            "gateway top-up credited"
        );

        Ok(TopupOutcome {
            transaction,
            balance,
        })
    }
}
