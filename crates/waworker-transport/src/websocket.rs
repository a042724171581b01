// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production transport over a WebSocket to the pairing endpoint.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use waworker_config::model::TransportConfig;
use waworker_core::traits::{Transport, TransportFactory};
use waworker_core::types::{CloseReason, SessionCreds, TransportEvent};
use waworker_core::WorkerError;

use crate::wire::{self, WireCommand};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket sessions against the configured endpoint.
pub struct WsTransportFactory {
    endpoint: String,
    connect_timeout: Duration,
}

impl WsTransportFactory {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl TransportFactory for WsTransportFactory {
    async fn connect(
        &self,
        channel_id: &str,
        creds: Option<SessionCreds>,
        cancel: CancellationToken,
    ) -> Result<Box<dyn Transport>, WorkerError> {
        let handshake = tokio_tungstenite::connect_async(&self.endpoint);
        let (stream, _response) = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(WorkerError::Transport {
                    message: "connect cancelled".into(),
                    source: None,
                });
            }
            result = tokio::time::timeout(self.connect_timeout, handshake) => {
                match result {
                    Err(_) => {
                        return Err(WorkerError::Timeout {
                            duration: self.connect_timeout,
                        });
                    }
                    Ok(Err(e)) => {
                        return Err(WorkerError::Transport {
                            message: format!("websocket connect to {}", self.endpoint),
                            source: Some(Box::new(e)),
                        });
                    }
                    Ok(Ok(pair)) => pair,
                }
            }
        };
        debug!(channel_id, endpoint = %self.endpoint, "websocket session opened");

        let mut transport = WebSocketTransport {
            stream,
            io_timeout: self.connect_timeout,
        };
        transport
            .send_command(&WireCommand::Init {
                channel_id,
                creds: creds.as_ref().map(|c| &c.0),
            })
            .await?;
        Ok(Box::new(transport))
    }
}

/// One live WebSocket session.
pub struct WebSocketTransport {
    stream: WsStream,
    /// Bound on individual sink operations; shares the connect budget.
    io_timeout: Duration,
}

/// Run `op` with a deadline, mapping elapse to [`WorkerError::Timeout`].
async fn bounded<T>(limit: Duration, op: impl Future<Output = T>) -> Result<T, WorkerError> {
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| WorkerError::Timeout { duration: limit })
}

impl WebSocketTransport {
    async fn send_command(&mut self, command: &WireCommand<'_>) -> Result<(), WorkerError> {
        let frame = serde_json::to_string(command).map_err(|e| WorkerError::Transport {
            message: "encode wire command".into(),
            source: Some(Box::new(e)),
        })?;
        // A peer that stops draining its socket must not wedge the
        // channel's command loop behind this send.
        bounded(self.io_timeout, self.stream.send(Message::Text(frame.into())))
            .await?
            .map_err(|e| WorkerError::Transport {
                message: "send wire command".into(),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if let Some(event) = wire::decode(&text) {
                        return Some(event);
                    }
                }
                // Close frame without a prior close event: the stream
                // died rather than the session ending deliberately.
                Ok(Message::Close(_)) => {
                    return Some(TransportEvent::Closed(CloseReason::ConnectionLost));
                }
                Ok(_) => {} // binary/ping/pong handled by tungstenite
                Err(e) => {
                    warn!(error = %e, "websocket stream error");
                    return Some(TransportEvent::Closed(CloseReason::ConnectionLost));
                }
            }
        }
        None
    }

    async fn send_text(&mut self, to: &str, text: &str) -> Result<String, WorkerError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.send_command(&WireCommand::Send { id: &id, to, text })
            .await?;
        Ok(id)
    }

    async fn close(&mut self) {
        match bounded(self.io_timeout, self.stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "websocket close handshake failed"),
            Err(e) => debug!(error = %e, "websocket close handshake timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_maps_a_stalled_operation_to_timeout() {
        let err = bounded(Duration::from_secs(5), std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Timeout { .. }));
    }

    #[tokio::test]
    async fn bounded_passes_through_a_prompt_result() {
        let value = bounded(Duration::from_secs(5), async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }
}
