//! Integration tests for gateway top-up crediting.

mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use campuspay_core::wallet::{OwnerLookup, TopupCredit, WalletError};
use campuspay_db::{TopupRepository, WalletRepository};

use common::{connect_or_skip, create_user};

#[tokio::test]
async fn test_topup_credits_once_per_reference() {
    let Some(db) = connect_or_skip().await else { return };
    let student = create_user(&db, dec!(0)).await.expect("student");
    let topups = TopupRepository::new(db.clone());
    let credit = TopupCredit {
        user_id: student.id,
        reference: format!("ref-{}", Uuid::new_v4()),
        amount: dec!(2500),
    };

    assert!(!topups.reference_exists(&credit.reference).await.unwrap());
    let first = topups.credit(&credit).await.expect("credit");
    assert_eq!(first.balance.available, dec!(2500));
    assert_eq!(first.transaction.reference.as_deref(), Some(credit.reference.as_str()));
    assert!(topups.reference_exists(&credit.reference).await.unwrap());

    let second = topups.credit(&credit).await;
    assert!(matches!(second, Err(WalletError::AlreadyProcessed)));

    let balance = WalletRepository::new(db.clone()).balance(student.id).await.unwrap();
    assert_eq!(balance.available, dec!(2500));
}

#[tokio::test]
async fn test_resolve_owner() {
    let Some(db) = connect_or_skip().await else { return };
    let student = create_user(&db, dec!(0)).await.expect("student");
    let topups = TopupRepository::new(db.clone());

    let by_id = topups
        .resolve_owner(&OwnerLookup::ById(student.id))
        .await
        .unwrap()
        .expect("owner by id");
    assert_eq!(by_id.email, student.email);

    let by_email = topups
        .resolve_owner(&OwnerLookup::ByEmail(student.email.to_uppercase()))
        .await
        .unwrap()
        .expect("owner by email");
    assert_eq!(by_email.id, student.id);

    assert!(topups.resolve_owner(&OwnerLookup::Unknown).await.unwrap().is_none());
    assert!(matches!(
        topups.account(Uuid::new_v4()).await,
        Err(WalletError::UserNotFound(_))
    ));
}
