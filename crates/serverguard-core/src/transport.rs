//! Connection transport abstraction
//!
//! Session engines talk to clients through a pair of traits: a shareable
//! [`MessageSink`] for outbound text frames and an exclusively owned
//! [`MessageStream`] for inbound ones. The HTTP server adapts websockets to
//! these; tests use the in-memory channel in [`memory`].

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Outbound half of a connection
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send one text frame. Any error means the connection is unusable.
    async fn send_text(&self, text: String) -> Result<()>;

    /// Close the connection. Failures are ignored.
    async fn close(&self) {}
}

/// Inbound half of a connection
#[async_trait]
pub trait MessageStream: Send {
    /// Next text frame, or `Ok(None)` once the peer has disconnected.
    async fn next_text(&mut self) -> Result<Option<String>>;
}

/// Sink shared between a receive loop and its background tasks
pub type SharedSink = Arc<dyn MessageSink>;

/// Serialize a message to JSON and send it
pub async fn send_json<T: Serialize + ?Sized>(sink: &dyn MessageSink, message: &T) -> Result<()> {
    let json = serde_json::to_string(message)?;
    sink.send_text(json).await
}

/// In-memory duplex channel
pub mod memory {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Server-side sink backed by an unbounded channel
    pub struct MemorySink {
        tx: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl MessageSink for MemorySink {
        async fn send_text(&self, text: String) -> Result<()> {
            self.tx
                .send(text)
                .map_err(|_| Error::transport("peer receiver dropped"))
        }
    }

    /// Server-side stream backed by an unbounded channel
    pub struct MemoryStream {
        rx: mpsc::UnboundedReceiver<String>,
    }

    #[async_trait]
    impl MessageStream for MemoryStream {
        async fn next_text(&mut self) -> Result<Option<String>> {
            Ok(self.rx.recv().await)
        }
    }

    /// Client end of an in-memory connection
    pub struct MemoryClient {
        tx: Option<mpsc::UnboundedSender<String>>,
        rx: Option<mpsc::UnboundedReceiver<String>>,
    }

    impl MemoryClient {
        /// Send a raw text frame to the server
        pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
            match &self.tx {
                Some(tx) => tx
                    .send(text.into())
                    .map_err(|_| Error::transport("server stream dropped")),
                None => Err(Error::ConnectionClosed),
            }
        }

        /// Send a JSON value to the server
        pub fn send_json(&self, value: &serde_json::Value) -> Result<()> {
            self.send_text(value.to_string())
        }

        /// Receive the next frame within `wait`, parsed as JSON.
        ///
        /// Returns `None` on timeout or once the server side is gone.
        pub async fn recv_json_within(&mut self, wait: Duration) -> Option<serde_json::Value> {
            let rx = self.rx.as_mut()?;
            let text = tokio::time::timeout(wait, rx.recv()).await.ok()??;
            serde_json::from_str(&text).ok()
        }

        /// Receive the next frame, waiting up to five seconds
        pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
            self.recv_json_within(Duration::from_secs(5)).await
        }

        /// Receive frames until one has the given `type`, discarding others
        pub async fn recv_type(&mut self, kind: &str) -> Option<serde_json::Value> {
            loop {
                let msg = self.recv_json().await?;
                if msg["type"] == kind {
                    return Some(msg);
                }
            }
        }

        /// Hang up the client's sending half, which the server sees as a disconnect
        pub fn disconnect(&mut self) {
            self.tx.take();
        }

        /// Stop reading, so further server sends fail
        pub fn drop_receiver(&mut self) {
            self.rx.take();
        }
    }

    /// Create a connected (server sink, server stream, client) triple
    #[must_use]
    pub fn channel() -> (Arc<MemorySink>, MemoryStream, MemoryClient) {
        let (to_client, client_rx) = mpsc::unbounded_channel();
        let (to_server, server_rx) = mpsc::unbounded_channel();
        (
            Arc::new(MemorySink { tx: to_client }),
            MemoryStream { rx: server_rx },
            MemoryClient {
                tx: Some(to_server),
                rx: Some(client_rx),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::memory;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_channel_roundtrip() {
        let (sink, mut stream, mut client) = memory::channel();

        send_json(sink.as_ref(), &json!({"type": "pong"})).await.unwrap();
        let received = client.recv_json().await.unwrap();
        assert_eq!(received["type"], "pong");

        client.send_text("hello").unwrap();
        assert_eq!(stream.next_text().await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_client_disconnect_ends_stream() {
        let (_sink, mut stream, mut client) = memory::channel();
        client.disconnect();
        assert!(stream.next_text().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_fails_sends() {
        let (sink, _stream, mut client) = memory::channel();
        client.drop_receiver();
        let err = sink.send_text("lost".into()).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
