//! Property-based tests for webhook signatures and minor-unit conversion.

use proptest::prelude::*;
use rust_decimal::Decimal;

use campuspay_shared::types::Currency;

use crate::wallet::error::WalletError;
use crate::wallet::gateway::GatewayService;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A body signed with the secret verifies.
    #[test]
    fn prop_signature_round_trip(
        secret in "[a-zA-Z0-9_]{8,64}",
        body in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let sig = GatewayService::sign(&secret, &body).unwrap();
        prop_assert!(GatewayService::verify_signature(&secret, &body, &sig).is_ok());
    }

    /// Flipping any byte of the body breaks the signature.
    #[test]
    fn prop_tampered_body_rejected(
        body in proptest::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
    ) {
        let sig = GatewayService::sign("sk_test_secret", &body).unwrap();
        let mut tampered = body.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 0x01;
        prop_assert!(matches!(
            GatewayService::verify_signature("sk_test_secret", &tampered, &sig),
            Err(WalletError::InvalidSignature)
        ));
    }

    /// Kobo amounts survive the major/minor conversion exactly.
    #[test]
    fn prop_minor_units_exact(minor in 1i64..1_000_000_000) {
        let major = Decimal::new(minor, 2);
        prop_assert_eq!(GatewayService::minor_amount(major, Currency::Ngn).unwrap(), minor);
    }
}
