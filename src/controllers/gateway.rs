use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
    domain::{
        relay::{Envelope, TtsRequestPayload, TtsResponsePayload},
        tts::TtsServiceApi,
    },
    error::{AppError, AppResult},
    infrastructure::gateway::{ConnectionRegistry, Outbound, OutboundSender},
};

/// Minimum advance of the download ratio between two progress envelopes
const PROGRESS_STEP: f32 = 0.05;

pub struct GatewayController {
    tts_service: Arc<dyn TtsServiceApi>,
    registry: Arc<ConnectionRegistry>,
}

impl GatewayController {
    pub fn new(tts_service: Arc<dyn TtsServiceApi>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            tts_service,
            registry,
        }
    }

    /// GET /ws - upgrade to the persistent relay connection
    pub async fn connect(
        ws: WebSocketUpgrade,
        State(controller): State<Arc<GatewayController>>,
    ) -> AppResult<Response> {
        if controller.registry.is_draining() {
            return Err(AppError::Unavailable("gateway is shutting down".to_string()));
        }
        Ok(ws.on_upgrade(move |socket| controller.handle_socket(socket)))
    }

    async fn handle_socket(self: Arc<Self>, socket: WebSocket) {
        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
        let connection_id = self.registry.register(tx.clone());

        tracing::info!(connection_id = %connection_id, "Relay connection accepted");

        // Sole writer of this transport
        let writer = tokio::spawn(async move {
            while let Some(outbound) = rx.recv().await {
                match outbound {
                    Outbound::Envelope(envelope) => {
                        let text = match envelope.to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!(error = %e, kind = envelope.kind(), "Failed to encode envelope");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        send(&tx, Envelope::connected());
        self.registry.mark_open(connection_id);

        let mut requests = JoinSet::new();

        while let Some(frame) = stream.next().await {
            let message = match frame {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Relay connection errored");
                    break;
                }
            };
            self.registry.touch(connection_id);
            while requests.try_join_next().is_some() {}

            match message {
                Message::Text(text) => match Envelope::from_json(&text) {
                    Ok(Envelope::TtsRequest(payload)) => {
                        let controller = self.clone();
                        let tx = tx.clone();
                        requests.spawn(async move {
                            controller.relay_chunk(connection_id, payload, tx).await;
                        });
                    }
                    Ok(other) => {
                        tracing::warn!(connection_id = %connection_id, kind = other.kind(), "Unexpected envelope from client");
                        let err = AppError::BadRequest(format!("unexpected envelope type {}", other.kind()));
                        send(&tx, Envelope::Error(err.to_payload(other.chunk_id().map(str::to_string))));
                    }
                    Err(e) => {
                        let err = AppError::BadRequest(format!("invalid envelope: {}", e));
                        send(&tx, Envelope::Error(err.to_payload(None)));
                    }
                },
                Message::Binary(_) => {
                    let err = AppError::BadRequest("binary frames are not supported".to_string());
                    send(&tx, Envelope::Error(err.to_payload(None)));
                }
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }

        // Nothing survives the transport
        requests.abort_all();
        let removed = self.registry.remove(connection_id);
        drop(tx);
        let _ = writer.await;

        match removed {
            Some(snapshot) => tracing::info!(
                connection_id = %connection_id,
                open_for_secs = (Utc::now() - snapshot.connected_at).num_seconds(),
                idle_for_secs = (Utc::now() - snapshot.last_activity).num_seconds(),
                "Relay connection closed"
            ),
            None => tracing::info!(connection_id = %connection_id, "Relay connection closed"),
        }
    }

    /// Run one chunk through the synthesis service and answer on the same connection
    async fn relay_chunk(&self, connection_id: Uuid, payload: TtsRequestPayload, tx: OutboundSender) {
        let chunk_id = payload.chunk_id.clone();
        let label = match (payload.chunk_index, payload.total_chunks) {
            (Some(index), Some(total)) => format!("Synthesizing chunk {}/{}", index + 1, total),
            _ => "Synthesizing chunk".to_string(),
        };

        tracing::info!(
            connection_id = %connection_id,
            chunk_id = ?chunk_id,
            voice_id = %payload.voice_id,
            text_length = payload.text.chars().count(),
            "Relaying chunk to provider"
        );

        if !self.tts_service.has_credential() {
            tracing::warn!(connection_id = %connection_id, chunk_id = ?chunk_id, "No provider credential configured");
            send(&tx, Envelope::Error(AppError::CredentialMissing.to_payload(chunk_id)));
            return;
        }

        send(&tx, Envelope::starting(chunk_id.clone(), label));

        let throttle = ProgressThrottle::new();
        let on_progress = |ratio: f32| {
            if throttle.should_emit(ratio) {
                send(&tx, Envelope::downloading(chunk_id.clone(), ratio));
            }
        };

        let reply = match self.tts_service.synthesize(payload, &on_progress).await {
            Ok(audio) => Envelope::TtsResponse(TtsResponsePayload::from_audio(
                chunk_id.clone(),
                &audio.audio,
                &audio.content_type,
            )),
            Err(e) => {
                let err = AppError::from(e);
                tracing::warn!(
                    connection_id = %connection_id,
                    chunk_id = ?chunk_id,
                    error = %err,
                    "Chunk synthesis failed"
                );
                Envelope::Error(err.to_payload(chunk_id.clone()))
            }
        };

        send(&tx, reply);
    }
}

fn send(tx: &OutboundSender, envelope: Envelope) {
    if tx.send(Outbound::Envelope(envelope)).is_err() {
        tracing::debug!("Dropping envelope for a closed connection");
    }
}

/// Decides which download ratios are worth an envelope
struct ProgressThrottle {
    last_emitted: Mutex<Option<f32>>,
}

impl ProgressThrottle {
    fn new() -> Self {
        Self {
            last_emitted: Mutex::new(None),
        }
    }

    fn should_emit(&self, ratio: f32) -> bool {
        let mut last = self.last_emitted.lock();
        let emit = match *last {
            None => true,
            Some(previous) => {
                (ratio >= 1.0 && previous < 1.0) || ratio - previous >= PROGRESS_STEP
            }
        };
        if emit {
            *last = Some(ratio);
        }
        emit
    }
}
