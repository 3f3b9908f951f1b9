//! Integration tests for peer-to-peer transfers.

mod common;

use rust_decimal_macros::dec;

use campuspay_core::wallet::{TransactionStatus, WalletError};
use campuspay_db::entities::sea_orm_active_enums;
use campuspay_db::{TransferRepository, WalletRepository};

use common::{connect_or_skip, create_user};

#[tokio::test]
async fn test_transfer_accept_moves_funds() {
    let Some(db) = connect_or_skip().await else { return };
    let sender = create_user(&db, dec!(1000)).await.expect("sender");
    let recipient = create_user(&db, dec!(0)).await.expect("recipient");

    let transfers = TransferRepository::new(db.clone());
    let wallets = WalletRepository::new(db.clone());

    let sent = transfers
        .transfer(sender.id, recipient.id, dec!(400), Some("Lunch".to_string()))
        .await
        .expect("transfer");
    assert_eq!(sent.sender_balance.available, dec!(600));
    assert_eq!(sent.sender_balance.in_transit, dec!(400));
    assert_eq!(sent.sender_leg.pairing_id, sent.recipient_leg.pairing_id);
    assert_eq!(
        sent.recipient_leg.status,
        sea_orm_active_enums::TransactionStatus::PendingAcceptance
    );

    let pending = wallets.pending_incoming(recipient.id).await.expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, sent.recipient_leg.id);

    let settled = transfers
        .accept(sent.recipient_leg.id, recipient.id)
        .await
        .expect("accept");
    assert_eq!(settled.status, TransactionStatus::Completed);
    assert_eq!(settled.sender_balance.in_transit, dec!(0));
    assert_eq!(settled.sender_balance.available, dec!(600));
    assert_eq!(settled.recipient_balance.available, dec!(400));

    let out_leg = wallets.find_transaction(sent.sender_leg.id).await.unwrap();
    assert_eq!(out_leg.status, sea_orm_active_enums::TransactionStatus::Completed);
}

#[tokio::test]
async fn test_transfer_reject_returns_funds() {
    let Some(db) = connect_or_skip().await else { return };
    let sender = create_user(&db, dec!(1000)).await.expect("sender");
    let recipient = create_user(&db, dec!(0)).await.expect("recipient");
    let transfers = TransferRepository::new(db.clone());

    let sent = transfers
        .transfer(sender.id, recipient.id, dec!(250), None)
        .await
        .expect("transfer");

    let settled = transfers
        .reject(sent.recipient_leg.id, recipient.id)
        .await
        .expect("reject");
    assert_eq!(settled.status, TransactionStatus::Rejected);
    assert_eq!(settled.sender_balance.available, dec!(1000));
    assert_eq!(settled.sender_balance.in_transit, dec!(0));
    assert_eq!(settled.recipient_balance.available, dec!(0));
}

#[tokio::test]
async fn test_transfer_settles_once() {
    let Some(db) = connect_or_skip().await else { return };
    let sender = create_user(&db, dec!(500)).await.expect("sender");
    let recipient = create_user(&db, dec!(0)).await.expect("recipient");
    let transfers = TransferRepository::new(db.clone());

    let sent = transfers
        .transfer(sender.id, recipient.id, dec!(500), None)
        .await
        .expect("transfer");
    transfers
        .accept(sent.recipient_leg.id, recipient.id)
        .await
        .expect("accept");

    assert!(matches!(
        transfers.accept(sent.recipient_leg.id, recipient.id).await,
        Err(WalletError::AlreadyProcessed)
    ));
    assert!(matches!(
        transfers.reject(sent.recipient_leg.id, recipient.id).await,
        Err(WalletError::AlreadyProcessed)
    ));

    let balance = WalletRepository::new(db.clone()).balance(recipient.id).await.unwrap();
    assert_eq!(balance.available, dec!(500));
}

#[tokio::test]
async fn test_transfer_rejections() {
    let Some(db) = connect_or_skip().await else { return };
    let sender = create_user(&db, dec!(100)).await.expect("sender");
    let recipient = create_user(&db, dec!(0)).await.expect("recipient");
    let transfers = TransferRepository::new(db.clone());

    assert!(matches!(
        transfers.transfer(sender.id, sender.id, dec!(10), None).await,
        Err(WalletError::SelfTransfer)
    ));
    assert!(matches!(
        transfers.transfer(sender.id, recipient.id, dec!(100.01), None).await,
        Err(WalletError::InsufficientFunds)
    ));
    assert!(matches!(
        transfers.transfer(sender.id, recipient.id, dec!(0), None).await,
        Err(WalletError::InvalidAmount(_))
    ));

    let sent = transfers
        .transfer(sender.id, recipient.id, dec!(50), None)
        .await
        .expect("transfer");
    // Only the recipient decides.
    assert!(matches!(
        transfers.accept(sent.recipient_leg.id, sender.id).await,
        Err(WalletError::NotAuthorized)
    ));

    let balance = WalletRepository::new(db.clone()).balance(sender.id).await.unwrap();
    assert_eq!(balance.available, dec!(50));
    assert_eq!(balance.in_transit, dec!(50));
}
