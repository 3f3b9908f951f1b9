//! Payment gateway reconciliation rules.
//!
//! Webhook signatures are HMAC-SHA512 over the raw request body keyed with the
//! gateway secret, hex encoded. Amounts arrive in minor units.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use uuid::Uuid;

use campuspay_shared::types::{Currency, Money};

use crate::wallet::balance::{BalanceMutation, validate_amount};
use crate::wallet::error::WalletError;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Webhook event that credits a wallet.
pub const CHARGE_SUCCESS: &str = "charge.success";

/// Gateway status of a settled charge.
pub const STATUS_SUCCESS: &str = "success";

/// Customer attached to a gateway charge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayCustomer {
    /// Email the customer paid with.
    #[serde(default)]
    pub email: Option<String>,
}

/// A charge as reported by the gateway (verify response `data` or webhook `data`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCharge {
    /// Unique merchant reference.
    pub reference: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Gateway status (`success`, `failed`, `abandoned`...).
    pub status: String,
    /// ISO 4217 code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Paying customer.
    #[serde(default)]
    pub customer: GatewayCustomer,
    /// Metadata passed at initialization. Shape is not guaranteed.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl GatewayCharge {
    /// User id placed in `metadata.user_id` at initialization, if readable.
    #[must_use]
    pub fn claimed_user_id(&self) -> Option<Uuid> {
        self.metadata
            .get("user_id")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Customer email, if present.
    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.customer.email.as_deref().filter(|e| !e.is_empty())
    }

    /// Fails unless the gateway answered for `requested`.
    pub fn ensure_reference(&self, requested: &str) -> Result<(), WalletError> {
        if self.reference == requested {
            Ok(())
        } else {
            Err(WalletError::Gateway(format!(
                "verify for {requested} returned charge {}",
                self.reference
            )))
        }
    }

    /// Amount in major units.
    #[must_use]
    pub fn major_amount(&self, currency: Currency) -> Decimal {
        Money::from_minor_units(self.amount, currency).amount
    }
}

/// Webhook envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `charge.success`.
    pub event: String,
    /// Charge payload.
    pub data: GatewayCharge,
}

impl WebhookEvent {
    /// Returns true for events that credit a wallet.
    #[must_use]
    pub fn is_charge_success(&self) -> bool {
        self.event == CHARGE_SUCCESS
    }
}

/// The account a charge is being credited to.
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    /// User id.
    pub id: Uuid,
    /// Registered email.
    pub email: String,
}

/// A validated top-up credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopupCredit {
    /// Account credited.
    pub user_id: Uuid,
    /// Gateway reference stored on the `topup` row.
    pub reference: String,
    /// Amount in major units.
    pub amount: Decimal,
}

impl TopupCredit {
    /// Mutation applied to the account.
    #[must_use]
    pub fn mutation(&self) -> BalanceMutation {
        BalanceMutation::Credit(self.amount)
    }
}

/// How the owner of a webhook charge is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerLookup {
    /// From `metadata.user_id`.
    ById(Uuid),
    /// From the customer email when metadata has no user id.
    ByEmail(String),
    /// Neither is present.
    Unknown,
}

/// Stateless service for gateway reconciliation decisions.
pub struct GatewayService;

impl GatewayService {
    /// Converts a top-up amount to gateway minor units.
    pub fn minor_amount(amount: Decimal, currency: Currency) -> Result<i64, WalletError> {
        let amount = validate_amount(amount)?;
        Money::new(amount, currency)
            .to_minor_units()
            .ok_or_else(|| WalletError::InvalidAmount("amount is out of range".to_string()))
    }

    /// Computes the hex signature of `payload`.
    pub fn sign(secret: &str, payload: &[u8]) -> Result<String, WalletError> {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
            .map_err(|_| WalletError::InvalidSignature)?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verifies a webhook signature in constant time.
    pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> Result<(), WalletError> {
        let expected = hex::decode(signature.trim()).map_err(|_| WalletError::InvalidSignature)?;
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
            .map_err(|_| WalletError::InvalidSignature)?;
        mac.update(payload);
        mac.verify_slice(&expected)
            .map_err(|_| WalletError::InvalidSignature)
    }

    /// Decides whose wallet a webhook charge belongs to.
    #[must_use]
    pub fn owner_lookup(charge: &GatewayCharge) -> OwnerLookup {
        if let Some(id) = charge.claimed_user_id() {
            return OwnerLookup::ById(id);
        }
        charge
            .customer_email()
            .map_or(OwnerLookup::Unknown, |email| OwnerLookup::ByEmail(email.to_string()))
    }

    /// Checks a verified charge against the account asking to be credited.
    ///
    /// # Returns
    /// * `Err(WalletError::OwnershipMismatch)` if `metadata.user_id` (or, when
    ///   absent, the customer email) does not identify `account`
    /// * `Err(WalletError::PaymentNotSuccessful)` unless the gateway status is `success`
    /// * `Err(WalletError::CurrencyMismatch)` if the charge names another currency
    /// * `Err(WalletError::InvalidAmount)` for a non-positive amount
    pub fn plan_credit(
        charge: &GatewayCharge,
        account: &AccountIdentity,
        currency: Currency,
    ) -> Result<TopupCredit, WalletError> {
        let owns = match charge.claimed_user_id() {
            Some(id) => id == account.id,
            None => charge
                .customer_email()
                .is_some_and(|email| email.eq_ignore_ascii_case(&account.email)),
        };
        if !owns {
            return Err(WalletError::OwnershipMismatch);
        }
        Self::credit_if_successful(charge, account.id, currency)
    }

    /// Webhook variant of [`plan_credit`](Self::plan_credit).
    ///
    /// The owner was resolved from the charge itself, so the customer email,
    /// when present, must also agree with that account.
    pub fn plan_webhook_credit(
        charge: &GatewayCharge,
        account: &AccountIdentity,
        currency: Currency,
    ) -> Result<TopupCredit, WalletError> {
        if let Some(email) = charge.customer_email() {
            if !email.eq_ignore_ascii_case(&account.email) {
                return Err(WalletError::OwnershipMismatch);
            }
        }
        Self::plan_credit(charge, account, currency)
    }

    fn credit_if_successful(
        charge: &GatewayCharge,
        user_id: Uuid,
        currency: Currency,
    ) -> Result<TopupCredit, WalletError> {
        if charge.status != STATUS_SUCCESS {
            return Err(WalletError::PaymentNotSuccessful(charge.status.clone()));
        }
        if let Some(charged) = charge.currency.as_deref() {
            if !charged.trim().eq_ignore_ascii_case(currency.code()) {
                return Err(WalletError::CurrencyMismatch {
                    charged: charged.to_string(),
                    wallet: currency.code().to_string(),
                });
            }
        }
        let amount = validate_amount(charge.major_amount(currency))?;
        Ok(TopupCredit {
            user_id,
            reference: charge.reference.clone(),
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const SECRET: &str = "sk_test_campuspay";

    fn charge(user_id: Option<Uuid>, email: &str, status: &str) -> GatewayCharge {
        GatewayCharge {
            reference: "CP-ref-1".to_string(),
            amount: 500_000,
            status: status.to_string(),
            currency: Some("NGN".to_string()),
            customer: GatewayCustomer {
                email: Some(email.to_string()),
            },
            metadata: user_id.map_or(serde_json::Value::Null, |id| json!({ "user_id": id })),
        }
    }

    fn account(id: Uuid) -> AccountIdentity {
        AccountIdentity {
            id,
            email: "ada@uni.edu.ng".to_string(),
        }
    }

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"event":"charge.success"}"#;
        let sig = GatewayService::sign(SECRET, body).unwrap();
        assert_eq!(sig.len(), 128);
        assert!(GatewayService::verify_signature(SECRET, body, &sig).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let sig = GatewayService::sign(SECRET, b"original").unwrap();
        assert!(matches!(
            GatewayService::verify_signature(SECRET, b"tampered", &sig),
            Err(WalletError::InvalidSignature)
        ));
        assert!(matches!(
            GatewayService::verify_signature("other", b"original", &sig),
            Err(WalletError::InvalidSignature)
        ));
        assert!(matches!(
            GatewayService::verify_signature(SECRET, b"original", "not-hex"),
            Err(WalletError::InvalidSignature)
        ));
    }

    #[test]
    fn test_credit_by_metadata() {
        let id = Uuid::new_v4();
        let credit = GatewayService::plan_credit(
            &charge(Some(id), "someone@else.com", "success"),
            &account(id),
            Currency::Ngn,
        )
        .unwrap();
        assert_eq!(credit.amount, dec!(5000));
        assert_eq!(credit.user_id, id);
        assert_eq!(credit.mutation(), BalanceMutation::Credit(dec!(5000)));
    }

    #[test]
    fn test_credit_by_email_fallback() {
        let id = Uuid::new_v4();
        let credit =
            GatewayService::plan_credit(&charge(None, "ADA@uni.edu.ng", "success"), &account(id), Currency::Ngn);
        assert!(credit.is_ok());
    }

    #[test]
    fn test_ownership_mismatch() {
        let result = GatewayService::plan_credit(
            &charge(Some(Uuid::new_v4()), "ada@uni.edu.ng", "success"),
            &account(Uuid::new_v4()),
            Currency::Ngn,
        );
        assert!(matches!(result, Err(WalletError::OwnershipMismatch)));
    }

    #[test]
    fn test_unsuccessful_payment() {
        let id = Uuid::new_v4();
        let result =
            GatewayService::plan_credit(&charge(Some(id), "ada@uni.edu.ng", "abandoned"), &account(id), Currency::Ngn);
        assert!(matches!(result, Err(WalletError::PaymentNotSuccessful(s)) if s == "abandoned"));
    }

    #[test]
    fn test_foreign_currency_is_not_credited() {
        let id = Uuid::new_v4();
        let mut usd = charge(Some(id), "ada@uni.edu.ng", "success");
        usd.currency = Some("USD".to_string());
        let result = GatewayService::plan_credit(&usd, &account(id), Currency::Ngn);
        assert!(matches!(
            result,
            Err(WalletError::CurrencyMismatch { ref charged, ref wallet })
                if charged == "USD" && wallet == "NGN"
        ));

        let result = GatewayService::plan_webhook_credit(&usd, &account(id), Currency::Ngn);
        assert!(matches!(result, Err(WalletError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_currency_code_is_case_insensitive() {
        let id = Uuid::new_v4();
        let mut lower = charge(Some(id), "ada@uni.edu.ng", "success");
        lower.currency = Some("ngn".to_string());
        assert!(GatewayService::plan_credit(&lower, &account(id), Currency::Ngn).is_ok());

        lower.currency = None;
        assert!(GatewayService::plan_credit(&lower, &account(id), Currency::Ngn).is_ok());
    }

    #[test]
    fn test_webhook_cross_checks_email() {
        let id = Uuid::new_v4();
        let result = GatewayService::plan_webhook_credit(
            &charge(Some(id), "mallory@evil.com", "success"),
            &account(id),
            Currency::Ngn,
        );
        assert!(matches!(result, Err(WalletError::OwnershipMismatch)));
    }

    #[test]
    fn test_verify_must_answer_for_requested_reference() {
        let c = charge(None, "ada@uni.edu.ng", "success");
        assert!(c.ensure_reference("CP-ref-1").is_ok());
        assert!(matches!(
            c.ensure_reference("CP-ref-2"),
            Err(WalletError::Gateway(msg)) if msg.contains("CP-ref-2")
        ));
    }

    #[test]
    fn test_owner_lookup() {
        let id = Uuid::new_v4();
        assert_eq!(
            GatewayService::owner_lookup(&charge(Some(id), "a@b.c", "success")),
            OwnerLookup::ById(id)
        );
        assert_eq!(
            GatewayService::owner_lookup(&charge(None, "a@b.c", "success")),
            OwnerLookup::ByEmail("a@b.c".to_string())
        );
        assert_eq!(
            GatewayService::owner_lookup(&charge(None, "", "success")),
            OwnerLookup::Unknown
        );
    }

    #[test]
    fn test_minor_amount() {
        assert_eq!(GatewayService::minor_amount(dec!(2500.50), Currency::Ngn).unwrap(), 250_050);
        assert!(GatewayService::minor_amount(dec!(0), Currency::Ngn).is_err());
        assert!(GatewayService::minor_amount(dec!(1.234), Currency::Ngn).is_err());
    }

    #[test]
    fn test_webhook_event_parsing() {
        let raw = json!({
            "event": "charge.success",
            "data": {
                "reference": "CP-abc",
                "amount": 100_000,
                "status": "success",
                "customer": { "email": "ada@uni.edu.ng" },
                "metadata": { "user_id": Uuid::nil() }
            }
        });
        let event: WebhookEvent = serde_json::from_value(raw).unwrap();
        assert!(event.is_charge_success());
        assert_eq!(event.data.claimed_user_id(), Some(Uuid::nil()));
        assert_eq!(event.data.major_amount(Currency::Ngn), dec!(1000));
    }

    #[test]
    fn test_metadata_as_string_is_tolerated() {
        let raw = json!({
            "reference": "CP-abc",
            "amount": 100,
            "status": "success",
            "metadata": ""
        });
        let charge: GatewayCharge = serde_json::from_value(raw).unwrap();
        assert_eq!(charge.claimed_user_id(), None);
        assert_eq!(charge.customer_email(), None);
    }
}
