//! Client end of the persistent relay connection.
//!
//! A supervisor task owns the socket: it connects, writes every outbound
//! envelope (the only writer), routes inbound envelopes to the correlation
//! registry and reconnects with backoff when the session ends.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::backoff::ReconnectPolicy;
use super::transport::RelayTransport;
use crate::domain::generation::{CorrelationRegistry, GenerationError};
use crate::domain::relay::Envelope;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Session ended; a reconnection is scheduled
    Closed,
    /// Reconnection attempts exhausted; terminal
    Failed,
}

enum SessionEnd {
    Lost(String),
    Shutdown,
}

pub struct RelayConnection {
    state: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<Envelope>,
    supervisor: JoinHandle<()>,
}

impl RelayConnection {
    /// Start connecting to `url` in the background
    pub fn spawn(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        correlation: Arc<CorrelationRegistry>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let supervisor = tokio::spawn(supervise(
            url.into(),
            policy,
            correlation,
            state_tx,
            outbound_rx,
        ));

        Self {
            state: state_rx,
            outbound: outbound_tx,
            supervisor,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.supervisor.abort();
    }
}

#[async_trait]
impl RelayTransport for RelayConnection {
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    async fn wait_until_connected(&self, timeout: Duration) -> Result<(), GenerationError> {
        let mut state = self.state.clone();
        let settled = async move {
            state
                .wait_for(|s| matches!(s, ConnectionState::Connected | ConnectionState::Failed))
                .await
                .map(|s| *s)
        };

        match tokio::time::timeout(timeout, settled).await {
            Ok(Ok(ConnectionState::Connected)) => Ok(()),
            Ok(Ok(_)) => Err(GenerationError::Connectivity(
                "gave up reconnecting to the gateway".to_string(),
            )),
            Ok(Err(_)) => Err(GenerationError::Connectivity(
                "connection supervisor stopped".to_string(),
            )),
            Err(_) => Err(GenerationError::Connectivity(format!(
                "not connected after {} ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn send(&self, envelope: Envelope) -> Result<(), GenerationError> {
        if !self.is_connected() {
            return Err(GenerationError::Connectivity("not connected".to_string()));
        }
        self.outbound
            .send(envelope)
            .map_err(|_| GenerationError::Connectivity("connection closed".to_string()))
    }
}

async fn supervise(
    url: String,
    policy: ReconnectPolicy,
    correlation: Arc<CorrelationRegistry>,
    state: watch::Sender<ConnectionState>,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
) {
    let mut failures: u32 = 0;

    loop {
        state.send_replace(ConnectionState::Connecting);
        tracing::debug!(url = %url, attempt = failures + 1, "Connecting to gateway");

        match tokio::time::timeout(HANDSHAKE_TIMEOUT, connect_async(url.as_str())).await {
            Ok(Ok((socket, _response))) => {
                failures = 0;

                // Requests queued against a previous session were already rejected
                while outbound.try_recv().is_ok() {}

                state.send_replace(ConnectionState::Connected);
                tracing::info!(url = %url, "Connected to gateway");

                let end = run_session(socket, &mut outbound, &correlation).await;
                state.send_replace(ConnectionState::Closed);

                let reason = match end {
                    SessionEnd::Shutdown => {
                        tracing::info!("Relay connection shut down");
                        return;
                    }
                    SessionEnd::Lost(reason) => reason,
                };

                let rejected = correlation.reject_all(GenerationError::Connectivity(format!(
                    "connection lost: {}",
                    reason
                )));
                tracing::warn!(reason = %reason, rejected_chunks = rejected, "Gateway connection lost");
            }
            Ok(Err(e)) => {
                failures += 1;
                state.send_replace(ConnectionState::Disconnected);
                tracing::warn!(error = %e, failures, "Failed to connect to gateway");
            }
            Err(_) => {
                failures += 1;
                state.send_replace(ConnectionState::Disconnected);
                tracing::warn!(failures, "Gateway handshake timed out");
            }
        }

        if !policy.allows(failures) {
            state.send_replace(ConnectionState::Failed);
            tracing::error!(
                failures,
                max_attempts = policy.max_attempts,
                "Giving up on the gateway connection"
            );
            return;
        }

        let delay = policy.delay_for(failures);
        tracing::info!(delay_ms = delay.as_millis() as u64, "Reconnecting after delay");
        tokio::time::sleep(delay).await;
    }
}

async fn run_session(
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<Envelope>,
    correlation: &CorrelationRegistry,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            next = outbound.recv() => match next {
                Some(envelope) => {
                    let text = match envelope.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            if let Some(chunk_id) = envelope.chunk_id() {
                                correlation.resolve(chunk_id, Err(GenerationError::Transport(e.to_string())));
                            }
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        return SessionEnd::Lost(e.to_string());
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match Envelope::from_json(&text) {
                    Ok(envelope) => {
                        correlation.dispatch(envelope);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Discarding malformed envelope from gateway");
                    }
                },
                Some(Ok(Message::Close(_))) => return SessionEnd::Lost("closed by gateway".to_string()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                None => return SessionEnd::Lost("stream ended".to_string()),
            },
        }
    }
}
