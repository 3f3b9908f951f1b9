//! Primitives shared by every money-moving repository.
//!
//! All functions take any `ConnectionTrait` so they run inside the caller's
//! database transaction. Balance changes are single conditional `UPDATE`s;
//! nothing here reads a balance and writes it back.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::error;
use uuid::Uuid;

use campuspay_core::wallet::{
    BalanceField, BalanceMutation, TransactionStatus, TransactionType, WalletBalance, WalletError,
};
use campuspay_shared::types::WalletTransactionId;

use crate::entities::{users, wallet_transactions};

/// Maps a database error into the wallet taxonomy.
pub(crate) fn db_err(e: DbErr) -> WalletError {
    WalletError::Database(e.to_string())
}

/// Like [`db_err`], but a unique violation means the reference was already used.
pub(crate) fn db_err_unique_as_processed(e: DbErr) -> WalletError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => WalletError::AlreadyProcessed,
        _ => db_err(e),
    }
}

/// Logs fatal errors before handing them back.
pub(crate) fn log_fatal(e: WalletError) -> WalletError {
    if e.is_fatal() {
        error!(error = %e, "ledger integrity violation");
    }
    e
}

fn column(field: BalanceField) -> users::Column {
    match field {
        BalanceField::Available => users::Column::AvailableBalance,
        BalanceField::Escrow => users::Column::EscrowBalance,
        BalanceField::InTransit => users::Column::InTransitBalance,
    }
}

fn delta_expr(field: BalanceField, delta: Decimal) -> SimpleExpr {
    if delta.is_sign_negative() {
        Expr::col(column(field)).sub(-delta)
    } else {
        Expr::col(column(field)).add(delta)
    }
}

/// Applies one balance mutation to `user_id` as a single guarded `UPDATE`.
///
/// # Errors
///
/// * `WalletError::UserNotFound` if the user does not exist
/// * the mutation's shortfall error if the guarded field does not cover the amount
pub async fn apply_mutation<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    mutation: BalanceMutation,
) -> Result<(), WalletError> {
    let mut update = users::Entity::update_many();
    for (field, delta) in mutation.deltas() {
        update = update.col_expr(column(field), delta_expr(field, delta));
    }
    update = update
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id));
    if let Some(guard) = mutation.guard() {
        update = update.filter(column(guard).gte(mutation.amount()));
    }

    let result = update.exec(conn).await.map_err(db_err)?;
    if result.rows_affected == 1 {
        return Ok(());
    }

    let exists = users::Entity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .is_some();
    if exists {
        Err(log_fatal(mutation.shortfall_error(user_id)))
    } else {
        Err(WalletError::UserNotFound(user_id))
    }
}

/// Reads the current balances of `user_id`.
///
/// # Errors
///
/// Returns `WalletError::UserNotFound` if the user does not exist.
pub async fn fetch_balance<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<WalletBalance, WalletError> {
    let user = users::Entity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WalletError::UserNotFound(user_id))?;
    Ok(balance_of(&user))
}

/// Balances held on a user row.
#[must_use]
pub fn balance_of(user: &users::Model) -> WalletBalance {
    WalletBalance {
        available: user.available_balance,
        escrow: user.escrow_balance,
        in_transit: user.in_transit_balance,
    }
}

/// A transaction row to append.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owner.
    pub user_id: Uuid,
    /// Kind.
    pub transaction_type: TransactionType,
    /// Signed from the owner's perspective.
    pub amount: Decimal,
    /// Initial status.
    pub status: TransactionStatus,
    /// Counterparty.
    pub related_user_id: Option<Uuid>,
    /// Shared by both legs of a pair.
    pub pairing_id: Option<Uuid>,
    /// External gateway reference.
    pub reference: Option<String>,
    /// Marketplace order.
    pub order_id: Option<Uuid>,
    /// Marketplace item.
    pub market_item_id: Option<Uuid>,
    /// Free-text description.
    pub description: Option<String>,
    /// Bank snapshot for withdrawals.
    pub bank_details: Option<serde_json::Value>,
}

impl NewTransaction {
    /// A completed row with no links.
    ///
    /// `amount` is the positive magnitude; outflow types are stored negative.
    #[must_use]
    pub fn completed(user_id: Uuid, transaction_type: TransactionType, amount: Decimal) -> Self {
        let magnitude = amount.abs();
        Self {
            user_id,
            transaction_type,
            amount: if transaction_type.is_outflow() {
                -magnitude
            } else {
                magnitude
            },
            status: TransactionStatus::Completed,
            related_user_id: None,
            pairing_id: None,
            reference: None,
            order_id: None,
            market_item_id: None,
            description: None,
            bank_details: None,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the counterparty.
    #[must_use]
    pub fn related_to(mut self, user_id: Uuid) -> Self {
        self.related_user_id = Some(user_id);
        self
    }

    /// Sets the pairing id.
    #[must_use]
    pub fn paired(mut self, pairing_id: Uuid) -> Self {
        self.pairing_id = Some(pairing_id);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Appends a transaction row.
///
/// # Errors
///
/// Returns the raw `DbErr` so callers inserting a `reference` can detect
/// unique violations.
pub async fn insert_transaction<C: ConnectionTrait>(
    conn: &C,
    tx: NewTransaction,
) -> Result<wallet_transactions::Model, DbErr> {
    let now = Utc::now().into();
    wallet_transactions::ActiveModel {
        id: Set(WalletTransactionId::new().into_inner()),
        user_id: Set(tx.user_id),
        transaction_type: Set(tx.transaction_type.into()),
        amount: Set(tx.amount),
        status: Set(tx.status.into()),
        related_user_id: Set(tx.related_user_id),
        pairing_id: Set(tx.pairing_id),
        reference: Set(tx.reference),
        order_id: Set(tx.order_id),
        market_item_id: Set(tx.market_item_id),
        description: Set(tx.description),
        bank_details: Set(tx.bank_details),
        processed_by: Set(None),
        processed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}
