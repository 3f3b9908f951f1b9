//! Transfer repository: acceptance-gated P2P transfers.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use campuspay_core::wallet::{
    TransactionStatus, TransactionType, TransferDecision, TransferService, TransferSnapshot,
    WalletBalance, WalletError,
};

use crate::entities::{sea_orm_active_enums, users, wallet_transactions};

use super::ledger::{
    NewTransaction, apply_mutation, db_err, fetch_balance, insert_transaction, log_fatal,
};

/// Result of initiating a transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Sender leg (`transfer_out`).
    pub sender_leg: wallet_transactions::Model,
    /// Recipient leg (`transfer_in`).
    pub recipient_leg: wallet_transactions::Model,
    /// Sender balances after the debit.
    pub sender_balance: WalletBalance,
}

/// Result of accepting or rejecting a transfer.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// Sender leg id.
    pub sender_transaction_id: Uuid,
    /// Sender.
    pub sender_id: Uuid,
    /// Recipient.
    pub recipient_id: Uuid,
    /// Amount moved.
    pub amount: Decimal,
    /// Status both legs ended in.
    pub status: TransactionStatus,
    /// Sender balances after settlement.
    pub sender_balance: WalletBalance,
    /// Recipient balances after settlement.
    pub recipient_balance: WalletBalance,
}

/// Transfer repository.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
}

impl TransferRepository {
    /// Creates a new transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Starts a transfer. Funds move from the sender's available to in-transit
    /// balance and wait for the recipient.
    ///
    /// # Errors
    ///
    /// * `WalletError::SelfTransfer` / `InvalidAmount`
    /// * `WalletError::UserNotFound` for an unknown recipient
    /// * `WalletError::InsufficientFunds`
    pub async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome, WalletError> {
        let plan = TransferService::plan_transfer(sender_id, recipient_id, amount)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        users::Entity::find_by_id(recipient_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WalletError::UserNotFound(recipient_id))?;

        apply_mutation(&txn, sender_id, plan.sender).await?;

        let pairing_id = plan.pairing_id.into_inner();
        let mut out = NewTransaction::completed(sender_id, TransactionType::TransferOut, plan.amount)
            .with_status(TransactionStatus::PendingAcceptance)
            .related_to(recipient_id)
            .paired(pairing_id);
        out.description.clone_from(&description);
        let mut incoming =
            NewTransaction::completed(recipient_id, TransactionType::TransferIn, plan.amount)
                .with_status(TransactionStatus::PendingAcceptance)
                .related_to(sender_id)
                .paired(pairing_id);
        incoming.description = description;

        let sender_leg = insert_transaction(&txn, out).await.map_err(db_err)?;
        let recipient_leg = insert_transaction(&txn, incoming).await.map_err(db_err)?;

        let sender_balance = fetch_balance(&txn, sender_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            sender_id = %sender_id,
            recipient_id = %recipient_id,
            amount = %plan.amount,
            pairing_id = %pairing_id,
            "transfer initiated"
        );

        Ok(TransferOutcome {
            sender_leg,
            recipient_leg,
            sender_balance,
        })
    }

    /// Recipient accepts a pending transfer.
    ///
    /// # Errors
    ///
    /// * `WalletError::TransactionNotFound`
    /// * `WalletError::NotAuthorized` unless `actor_id` is the recipient
    /// * `WalletError::AlreadyProcessed` if the transfer is no longer pending
    pub async fn accept(&self, transaction_id: Uuid, actor_id: Uuid) -> Result<SettlementOutcome, WalletError> {
        self.settle(transaction_id, actor_id, TransferDecision::Accept).await
    }

    /// Recipient rejects a pending transfer; funds return to the sender.
    ///
    /// # Errors
    ///
    /// Same as [`accept`](Self::accept).
    pub async fn reject(&self, transaction_id: Uuid, actor_id: Uuid) -> Result<SettlementOutcome, WalletError> {
        self.settle(transaction_id, actor_id, TransferDecision::Reject).await
    }

    async fn settle(
        &self,
        transaction_id: Uuid,
        actor_id: Uuid,
        decision: TransferDecision,
    ) -> Result<SettlementOutcome, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let (out_leg, in_leg) = load_legs(&txn, transaction_id).await?;
        let snapshot = TransferSnapshot {
            sender_id: out_leg.user_id,
            recipient_id: in_leg.user_id,
            amount: in_leg.amount,
            status: in_leg.status.into(),
        };
        let plan = TransferService::plan_settlement(&snapshot, actor_id, decision)?;

        let pairing_id = in_leg.pairing_id.ok_or(WalletError::TransactionNotFound(transaction_id))?;
        let flipped = wallet_transactions::Entity::update_many()
            .col_expr(
                wallet_transactions::Column::Status,
                Expr::value(sea_orm_active_enums::TransactionStatus::from(plan.new_status)),
            )
            .col_expr(wallet_transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallet_transactions::Column::PairingId.eq(pairing_id))
            .filter(
                wallet_transactions::Column::Status
                    .eq(sea_orm_active_enums::TransactionStatus::PendingAcceptance),
            )
            .exec(&txn)
            .await
            .map_err(db_err)?;
        match flipped.rows_affected {
            2 => {}
            0 => return Err(WalletError::AlreadyProcessed),
            n => {
                return Err(log_fatal(WalletError::LedgerIntegrity(format!(
                    "transfer {pairing_id} flipped {n} legs instead of 2"
                ))));
            }
        }

        apply_mutation(&txn, snapshot.sender_id, plan.sender).await?;
        if let Some(credit) = plan.recipient {
            apply_mutation(&txn, snapshot.recipient_id, credit).await?;
        }

        let sender_balance = fetch_balance(&txn, snapshot.sender_id).await?;
        let recipient_balance = fetch_balance(&txn, snapshot.recipient_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            pairing_id = %pairing_id,
            sender_id = %snapshot.sender_id,
            recipient_id = %snapshot.recipient_id,
            amount = %snapshot.amount,
            status = %plan.new_status,
            "transfer settled"
        );

        Ok(SettlementOutcome {
            sender_transaction_id: out_leg.id,
            sender_id: snapshot.sender_id,
            recipient_id: snapshot.recipient_id,
            amount: snapshot.amount,
            status: plan.new_status,
            sender_balance,
            recipient_balance,
        })
    }
}

/// Loads both legs of the transfer that `transaction_id` belongs to.
async fn load_legs(
    txn: &DatabaseTransaction,
    transaction_id: Uuid,
) -> Result<(wallet_transactions::Model, wallet_transactions::Model), WalletError> {
    let leg = wallet_transactions::Entity::find_by_id(transaction_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(WalletError::TransactionNotFound(transaction_id))?;

    let is_transfer = matches!(
        TransactionType::from(leg.transaction_type),
        TransactionType::TransferOut | TransactionType::TransferIn
    );
    let pairing_id = match (is_transfer, leg.pairing_id) {
        (true, Some(p)) => p,
        _ => return Err(WalletError::TransactionNotFound(transaction_id)),
    };

    let legs = wallet_transactions::Entity::find()
        .filter(wallet_transactions::Column::PairingId.eq(pairing_id))
        .all(txn)
        .await
        .map_err(db_err)?;

    let find = |ty: TransactionType| {
        legs.iter()
            .find(|l| TransactionType::from(l.transaction_type) == ty)
            .cloned()
    };
    match (find(TransactionType::TransferOut), find(TransactionType::TransferIn)) {
        (Some(out_leg), Some(in_leg)) => Ok((out_leg, in_leg)),
        _ => Err(log_fatal(WalletError::LedgerIntegrity(format!(
            "transfer {pairing_id} is missing a leg"
        )))),
    }
}
