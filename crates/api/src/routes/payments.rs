//! Gateway top-up routes: checkout, verification and the webhook.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::wallet::{BalanceResponse, TransactionResponse};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    gateway::{InitializePayment, PaymentAuthorization},
    middleware::AuthUser,
};
use campuspay_core::wallet::{
    EventPublisher, GatewayService, LedgerEvent, Notification, NotificationDispatcher,
    TopupCredit, WalletError, WebhookEvent, gateway::SIGNATURE_HEADER, validate_amount,
};
use campuspay_db::{TopupRepository, repositories::TopupOutcome};

/// Authenticated payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments/initialize", post(initialize_payment))
        .route("/payments/verify/{reference}", get(verify_payment))
}

/// Public webhook route; requests are authenticated by signature.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/payments/webhook", post(gateway_webhook))
}

/// Request body to start a top-up.
#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    /// Amount in major units.
    pub amount: Decimal,
}

/// A credited top-up.
#[derive(Debug, Serialize)]
pub struct TopupResponse {
    /// Topup row.
    pub transaction: TransactionResponse,
    /// Balances afterwards.
    pub balance: BalanceResponse,
}

/// POST /payments/initialize
async fn initialize_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<InitializeRequest>,
) -> ApiResult<Json<PaymentAuthorization>> {
    let amount = validate_amount(req.amount)?;
    let minor = GatewayService::minor_amount(amount, state.currency)?;
    let account = TopupRepository::new(state.conn())
        .account(auth.user_id())
        .await?;

    let request =
        InitializePayment::for_user(account.id, account.email, minor, &state.gateway_config);
    let authorization = state.gateway.initialize(&request).await?;

    info!(
        user_id = %account.id,
        reference = %authorization.reference,
        amount = %amount,
        "gateway checkout initialized"
    );
    Ok(Json(authorization))
}

/// GET /payments/verify/{reference}
async fn verify_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(reference): Path<String>,
) -> ApiResult<Json<TopupResponse>> {
    let repo = TopupRepository::new(state.conn());
    if repo.reference_exists(&reference).await? {
        return Err(WalletError::AlreadyProcessed.into());
    }

    let charge = state.gateway.verify(&reference).await?;
    charge.ensure_reference(&reference)?;
    let account = repo.account(auth.user_id()).await?;
    let credit = GatewayService::plan_credit(&charge, &account, state.currency)?;
    let outcome = repo.credit(&credit).await?;

    Ok(Json(credited(&state, &credit, outcome)))
}

/// POST /payments/webhook
///
/// Answers 200 for anything the gateway should not retry: ignored events,
/// duplicates, and charges that can never be credited. Database failures
/// answer 500 so the gateway delivers again.
async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WalletError::InvalidSignature)?;
    GatewayService::verify_signature(&state.gateway_config.secret_key, &body, signature)?;

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_PAYLOAD",
            format!("Unreadable webhook payload: {e}"),
        )
    })?;
    if !event.is_charge_success() {
        return Ok(acknowledged("ignored"));
    }

    let charge = event.data;
    let repo = TopupRepository::new(state.conn());
    let Some(owner) = repo
        .resolve_owner(&GatewayService::owner_lookup(&charge))
        .await?
    else {
        warn!(reference = %charge.reference, "webhook charge has no matching account");
        return Ok(acknowledged("unmatched"));
    };

    let credit = match GatewayService::plan_webhook_credit(&charge, &owner, state.currency) {
        Ok(credit) => credit,
        Err(e) => {
            warn!(reference = %charge.reference, error = %e, "webhook charge not credited");
            return Ok(acknowledged("rejected"));
        }
    };

    match repo.credit(&credit).await {
        Ok(outcome) => {
            credited(&state, &credit, outcome);
            Ok(acknowledged("credited"))
        }
        Err(WalletError::AlreadyProcessed) => Ok(acknowledged("duplicate")),
        Err(e) => Err(e.into()),
    }
}

fn acknowledged(status: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": status })))
}

fn credited(state: &AppState, credit: &TopupCredit, outcome: TopupOutcome) -> TopupResponse {
    state
        .events
        .publish(LedgerEvent::balance(credit.user_id, outcome.balance));
    state.notifier.dispatch(Notification::topup_credited(
        credit.user_id,
        &credit.reference,
        credit.amount,
    ));

    TopupResponse {
        transaction: outcome.transaction.into(),
        balance: outcome.balance.into(),
    }
}
