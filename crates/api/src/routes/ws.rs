//! WebSocket stream of ledger events.
//!
//! Browsers cannot set headers on a WebSocket handshake, so the access token
//! travels in the query string. Each socket only sees its own user's events.

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use serde::Deserialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::auth::authenticate};
use campuspay_core::wallet::LedgerEvent;

/// Creates the WebSocket route. Authenticates from `?token=`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(event_stream))
}

/// Handshake query.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token.
    pub token: String,
}

/// GET /ws?token=
async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    upgrade: WebSocketUpgrade,
) -> ApiResult<Response> {
    let user_id = authenticate(&state.jwt_service, &query.token)?.user_id();
    let events = state.events.subscribe();

    Ok(upgrade.on_upgrade(move |socket| forward_events(socket, events, user_id)))
}

async fn forward_events(mut socket: WebSocket, mut events: Receiver<LedgerEvent>, user_id: Uuid) {
    debug!(user_id = %user_id, "event stream opened");
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) if event.user_id == user_id => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %user_id, skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!(user_id = %user_id, "event stream closed");
}
