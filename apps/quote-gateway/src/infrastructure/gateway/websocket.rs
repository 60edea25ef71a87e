//! WebSocket quote streaming.
//!
//! `GET /ws/{ticker}` upgrades to a WebSocket that receives one JSON text
//! message per published quote. Client messages are ignored apart from
//! Close. The subscription is released on every exit path because it is
//! dropped when the connection task returns.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use super::error::ApiError;
use super::server::{GatewayState, parse_ticker};
use crate::domain::symbol::Symbol;
use crate::infrastructure::broadcast::BroadcastHub;
use crate::infrastructure::metrics;

/// Why a streaming connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    ClientClosed,
    SocketError,
    SendFailed,
    EncodeFailed,
    StreamEnded,
}

impl CloseReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::SocketError => "socket_error",
            Self::SendFailed => "send_failed",
            Self::EncodeFailed => "encode_failed",
            Self::StreamEnded => "stream_ended",
        }
    }
}

/// Upgrade handler for `/ws/{*ticker}`.
///
/// # Errors
///
/// Rejects a blank ticker with 400 before upgrading.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(ticker): Path<String>,
    State(state): State<GatewayState>,
) -> Result<Response, ApiError> {
    let symbol = parse_ticker(&ticker)?;
    let hub = Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| stream_quotes(socket, hub, symbol)))
}

async fn stream_quotes(socket: WebSocket, hub: Arc<BroadcastHub>, symbol: Symbol) {
    let connection_id = Uuid::new_v4();
    let mut subscription = hub.subscribe(symbol);
    let symbol = subscription.symbol().normalized().to_string();

    metrics::websocket_client_connected();
    tracing::info!(%connection_id, symbol = %symbol, "WebSocket client connected");

    let (mut sender, mut receiver) = socket.split();

    let reason = loop {
        tokio::select! {
            quote = subscription.recv() => {
                let Some(quote) = quote else {
                    break CloseReason::StreamEnded;
                };
                let text = match serde_json::to_string(&quote) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(%connection_id, error = %e, "Failed to encode quote");
                        break CloseReason::EncodeFailed;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break CloseReason::SendFailed;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break CloseReason::ClientClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%connection_id, error = %e, "WebSocket receive error");
                    break CloseReason::SocketError;
                }
            },
        }
    };

    drop(subscription);
    if reason != CloseReason::ClientClosed {
        let _ = sender.send(Message::Close(None)).await;
    }

    metrics::websocket_client_disconnected();
    tracing::info!(
        %connection_id,
        symbol = %symbol,
        reason = reason.as_str(),
        "WebSocket client disconnected"
    );
}
