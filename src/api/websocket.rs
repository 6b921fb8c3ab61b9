use crate::api::world::AppState;
use crate::subscription::PeerChannel;
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Text frames in both directions; pings are answered by the transport
impl PeerChannel for WebSocket {
    async fn send(&mut self, message: &str) -> Result<()> {
        SinkExt::send(self, Message::Text(message.to_string())).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Option<String> {
        loop {
            match StreamExt::next(self).await? {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Binary(data)) => {
                    return Some(String::from_utf8_lossy(&data).into_owned());
                }
                Ok(Message::Close(_)) => return None,
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = SinkExt::close(self).await;
    }
}

/// GET /subscribe - WebSocket upgrade into a subscriber session
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Create WebSocket router
pub fn create_ws_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/subscribe", get(ws_handler))
        .with_state(state)
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let metrics = &state.engine.metrics;
    metrics.increment_ws_connection();

    let reason = state.engine.session(socket).run().await;

    metrics.decrement_ws_connection();
    debug!(reason = %reason, "WebSocket connection finished");
}
