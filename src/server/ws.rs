//! Real-time WebSocket feed
//!
//! ## Protocol
//!
//! Connect: `ws://localhost:8080/api/feed`
//!
//! Messages (server → client):
//! - `connected` - Sent once after the upgrade completes
//! - `notification` - One per stored notification insert
//!
//! Messages (client → server):
//! - `ping` - Keep-alive ping, answered with `pong`
//!
//! Delivery is best-effort: a slow client that lags past the feed buffer
//! misses events rather than stalling the hub.

use futures_util::{SinkExt, StreamExt};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::db::schemas::NotificationRecord;
use crate::server::AppState;

/// WebSocket type after upgrade
type HyperWebSocket =
    hyper_tungstenite::WebSocketStream<hyper_util::rt::TokioIo<hyper::upgrade::Upgraded>>;

/// Message sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Sent once after connection
    Connected { timestamp: String },
    /// A notification was inserted
    Notification {
        timestamp: String,
        notification: NotificationRecord,
    },
}

/// Message received from client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Keep-alive ping
    Ping,
}

/// Handle WebSocket upgrade for the notification feed
pub async fn handle_feed_upgrade(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let (response, websocket) = match hyper_tungstenite::upgrade(req, None) {
        Ok((resp, ws)) => (resp, ws),
        Err(e) => {
            error!("WebSocket upgrade failed: {}", e);
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from("WebSocket upgrade failed")))
                .unwrap();
        }
    };

    tokio::spawn(async move {
        match websocket.await {
            Ok(ws) => {
                let ws: HyperWebSocket = ws;
                if let Err(e) = handle_feed_connection(ws, state).await {
                    warn!("Feed WebSocket error: {}", e);
                }
            }
            Err(e) => {
                error!("WebSocket connection failed: {}", e);
            }
        }
    });

    let (parts, _body) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Handle an individual feed WebSocket connection
async fn handle_feed_connection(
    ws: HyperWebSocket,
    state: Arc<AppState>,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (mut sender, mut receiver) = ws.split();

    info!("Feed WebSocket client connected");

    let hello = FeedMessage::Connected {
        timestamp: now_iso(),
    };
    sender
        .send(WsMessage::Text(serde_json::to_string(&hello)?))
        .await?;

    let mut rx = state.feed.subscribe();

    loop {
        tokio::select! {
            // Insert event from the feed
            event = rx.recv() => {
                match event {
                    Ok(notification) => {
                        let msg = FeedMessage::Notification {
                            timestamp: now_iso(),
                            notification,
                        };
                        let json = serde_json::to_string(&msg)?;
                        if sender.send(WsMessage::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("feed client lagged, {} events dropped", skipped);
                    }
                }
            }

            // Message from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(&text) {
                            let pong = serde_json::json!({ "type": "pong", "timestamp": now_iso() });
                            let _ = sender.send(WsMessage::Text(pong.to_string())).await;
                        } else {
                            debug!("Unhandled feed client message: {}", text);
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        info!("Feed WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sender.send(WsMessage::Pong(data)).await;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
        }
    }

    info!("Feed WebSocket connection closed");
    Ok(())
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
