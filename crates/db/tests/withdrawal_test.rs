//! Integration tests for withdrawal requests and admin review.

mod common;

use rust_decimal_macros::dec;

use campuspay_core::wallet::{BankDetails, WalletError};
use campuspay_db::entities::sea_orm_active_enums::TransactionStatus;
use campuspay_db::{WalletRepository, WithdrawalRepository};

use common::{connect_or_skip, create_user};

fn bank() -> BankDetails {
    BankDetails {
        bank_name: "Access Bank".to_string(),
        account_number: "0123456789".to_string(),
        account_name: "Ada Obi".to_string(),
    }
}

#[tokio::test]
async fn test_rejected_withdrawal_round_trips() {
    let Some(db) = connect_or_skip().await else { return };
    let student = create_user(&db, dec!(1500)).await.expect("student");
    let admin = create_user(&db, dec!(0)).await.expect("admin");
    let withdrawals = WithdrawalRepository::new(db.clone());

    let requested = withdrawals
        .request(student.id, dec!(1000), &bank())
        .await
        .expect("request");
    assert_eq!(requested.balance.available, dec!(500));
    assert_eq!(requested.transaction.status, TransactionStatus::Pending);
    assert_eq!(requested.transaction.amount, dec!(-1000));
    assert!(requested.transaction.bank_details.is_some());

    let rejected = withdrawals
        .reject(requested.transaction.id, admin.id, true)
        .await
        .expect("reject");
    assert_eq!(rejected.transaction.status, TransactionStatus::Failed);
    assert_eq!(rejected.transaction.processed_by, Some(admin.id));
    assert_eq!(rejected.balance.available, dec!(1500));

    let again = withdrawals.approve(requested.transaction.id, admin.id, true).await;
    assert!(matches!(again, Err(WalletError::InvalidState(_))));
    let balance = WalletRepository::new(db.clone()).balance(student.id).await.unwrap();
    assert_eq!(balance.available, dec!(1500));
}

#[tokio::test]
async fn test_approved_withdrawal_keeps_debit() {
    let Some(db) = connect_or_skip().await else { return };
    let student = create_user(&db, dec!(800)).await.expect("student");
    let admin = create_user(&db, dec!(0)).await.expect("admin");
    let withdrawals = WithdrawalRepository::new(db.clone());

    let requested = withdrawals
        .request(student.id, dec!(800), &bank())
        .await
        .expect("request");
    let approved = withdrawals
        .approve(requested.transaction.id, admin.id, true)
        .await
        .expect("approve");
    assert_eq!(approved.transaction.status, TransactionStatus::Completed);
    assert_eq!(approved.balance.available, dec!(0));
}

#[tokio::test]
async fn test_withdrawal_guards() {
    let Some(db) = connect_or_skip().await else { return };
    let student = create_user(&db, dec!(300)).await.expect("student");
    let withdrawals = WithdrawalRepository::new(db.clone());

    assert!(matches!(
        withdrawals.request(student.id, dec!(300.01), &bank()).await,
        Err(WalletError::InsufficientFunds)
    ));
    let short = BankDetails {
        account_number: "12345".to_string(),
        ..bank()
    };
    assert!(matches!(
        withdrawals.request(student.id, dec!(100), &short).await,
        Err(WalletError::InvalidBankDetails(_))
    ));

    let requested = withdrawals
        .request(student.id, dec!(100), &bank())
        .await
        .expect("request");
    assert!(matches!(
        withdrawals.approve(requested.transaction.id, student.id, false).await,
        Err(WalletError::NotAuthorized)
    ));

    let pending = withdrawals.pending(&Default::default()).await.expect("pending");
    assert!(pending.data.iter().any(|t| t.id == requested.transaction.id));
}
