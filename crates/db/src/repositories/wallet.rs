//! Wallet read model: balances, history and pending incoming transfers.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use campuspay_core::wallet::{WalletBalance, WalletError};
use campuspay_shared::types::{PageRequest, PageResponse};

use crate::entities::{
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    wallet_transactions,
};

use super::ledger::{db_err, fetch_balance};

/// Wallet repository for read-side queries.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current balances of a user.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::UserNotFound` for an unknown user.
    pub async fn balance(&self, user_id: Uuid) -> Result<WalletBalance, WalletError> {
        fetch_balance(&self.db, user_id).await
    }

    /// Transaction history of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<wallet_transactions::Model>, WalletError> {
        let page = page.clamped();
        let query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id));

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .order_by_desc(wallet_transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }

    /// Transfers awaiting this user's decision (recipient legs), oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_incoming(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<wallet_transactions::Model>, WalletError> {
        wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id))
            .filter(wallet_transactions::Column::TransactionType.eq(TransactionType::TransferIn))
            .filter(wallet_transactions::Column::Status.eq(TransactionStatus::PendingAcceptance))
            .order_by_asc(wallet_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::TransactionNotFound` if it does not exist.
    pub async fn find_transaction(
        &self,
        id: Uuid,
    ) -> Result<wallet_transactions::Model, WalletError> {
        wallet_transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WalletError::TransactionNotFound(id))
    }
}
