//! Payment gateway client.
//!
//! [`PaymentGateway`] is the seam handlers call; [`PaystackClient`] talks to
//! the Paystack REST API with the merchant secret key as bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use campuspay_core::wallet::{GatewayCharge, WalletError};
use campuspay_shared::GatewayConfig;

/// Errors talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure or undecodable body.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway returned {status}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Body or message returned.
        message: String,
    },

    /// The gateway answered `status: false`.
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

impl From<GatewayError> for WalletError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err.to_string())
    }
}

/// Checkout session to start a top-up.
#[derive(Debug, Clone, Serialize)]
pub struct InitializePayment {
    /// Payer email.
    pub email: String,
    /// Amount in minor units.
    pub amount: i64,
    /// ISO 4217 code.
    pub currency: String,
    /// Redirect after checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Echoed back on verify and webhook; carries `user_id`.
    pub metadata: serde_json::Value,
}

impl InitializePayment {
    /// Checkout for `user_id`, tagging the charge with the account id.
    #[must_use]
    pub fn for_user(user_id: Uuid, email: String, amount: i64, config: &GatewayConfig) -> Self {
        Self {
            email,
            amount,
            currency: config.currency.clone(),
            callback_url: config.callback_url.clone(),
            metadata: serde_json::json!({ "user_id": user_id }),
        }
    }
}

/// Checkout session returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    /// Hosted checkout page.
    pub authorization_url: String,
    /// Access code for inline checkout.
    pub access_code: String,
    /// Merchant reference to verify later.
    pub reference: String,
}

/// Payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session. No ledger effect.
    async fn initialize(
        &self,
        request: &InitializePayment,
    ) -> Result<PaymentAuthorization, GatewayError>;

    /// Fetches the settled state of a charge.
    async fn verify(&self, reference: &str) -> Result<GatewayCharge, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, GatewayError> {
        match (self.status, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(GatewayError::Rejected(self.message)),
        }
    }
}

/// Paystack REST client.
#[derive(Debug, Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    /// Creates a client from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn read<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        response.json::<Envelope<T>>().await?.into_data()
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        request: &InitializePayment,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let url = format!("{}/transaction/initialize", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(request)
            .send()
            .await?;

        Self::read(response).await
    }

    async fn verify(&self, reference: &str) -> Result<GatewayCharge, GatewayError> {
        let url = format!("{}/transaction/verify/{reference}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        Self::read(response).await
    }
}
