//! Axum websocket adapters for the session engines

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serverguard_core::{Error, MessageSink, MessageStream, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Outbound half; shared by a receive loop and its background senders
pub struct WsSink {
    inner: Mutex<SplitSink<WebSocket, Message>>,
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send_text(&self, text: String) -> Result<()> {
        self.inner
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::transport(e.to_string()))
    }

    async fn close(&self) {
        let mut sink = self.inner.lock().await;
        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    }
}

/// Inbound half
pub struct WsStream {
    inner: SplitStream<WebSocket>,
}

#[async_trait]
impl MessageStream for WsStream {
    async fn next_text(&mut self) -> Result<Option<String>> {
        while let Some(message) = self.inner.next().await {
            match message.map_err(|e| Error::transport(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Close(_) => return Ok(None),
                // pings are answered by the websocket layer
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Binary(data) => {
                    debug!(bytes = data.len(), "Ignoring binary frame");
                }
            }
        }
        Ok(None)
    }
}

/// Split an upgraded socket for the engines
pub fn split(socket: WebSocket) -> (Arc<WsSink>, WsStream) {
    let (sink, stream) = socket.split();
    (
        Arc::new(WsSink {
            inner: Mutex::new(sink),
        }),
        WsStream { inner: stream },
    )
}
