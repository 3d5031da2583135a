//! Client-side correlation of chunk responses to outstanding requests.
//!
//! Every registered chunk id owns exactly one resolver. The resolver leaves
//! the table exactly once: on a matching response, on its deadline, or when
//! the connection it was sent on is lost. Whichever path removes it fulfils
//! the waiting future; the others find nothing and do nothing.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use super::error::GenerationError;
use crate::domain::relay::{ChunkAudio, ChunkResponse, Envelope};

type Outcome = Result<ChunkAudio, GenerationError>;

struct PendingResolver {
    sender: oneshot::Sender<Outcome>,
    timer: AbortHandle,
}

/// What happened to an inbound envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A pending chunk was fulfilled or rejected
    Resolved(String),
    /// Response for a chunk that is no longer pending
    Unmatched,
    /// Response without chunk id that could not be attributed
    Ambiguous { pending: usize },
    /// Progress or status; nothing to resolve
    Informational,
    /// Envelope a client never expects
    Ignored,
}

/// Future side of a registration
pub struct PendingChunk {
    chunk_id: String,
    receiver: oneshot::Receiver<Outcome>,
}

impl PendingChunk {
    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub async fn wait(self) -> Outcome {
        self.receiver.await.unwrap_or_else(|_| {
            Err(GenerationError::Connectivity(
                "correlation registry dropped".to_string(),
            ))
        })
    }
}

pub struct CorrelationRegistry {
    pending: Mutex<HashMap<String, PendingResolver>>,
    /// Drop responses that carry no chunk id instead of guessing
    strict: bool,
}

impl CorrelationRegistry {
    pub fn new(strict: bool) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(HashMap::new()),
            strict,
        })
    }

    /// Start waiting for `chunk_id`, rejecting with a timeout after `timeout`
    pub fn register(
        self: &Arc<Self>,
        chunk_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<PendingChunk, GenerationError> {
        let chunk_id = chunk_id.into();
        let mut pending = self.pending.lock();

        if pending.contains_key(&chunk_id) {
            return Err(GenerationError::DuplicateChunk(chunk_id));
        }

        let (sender, receiver) = oneshot::channel();
        let deadline = Instant::now() + timeout;
        let timer = tokio::spawn(expire_at(
            Arc::downgrade(self),
            chunk_id.clone(),
            deadline,
            timeout,
        ))
        .abort_handle();

        pending.insert(
            chunk_id.clone(),
            PendingResolver { sender, timer },
        );

        Ok(PendingChunk { chunk_id, receiver })
    }

    /// Fulfil or reject `chunk_id`; false when it is not pending
    pub fn resolve(&self, chunk_id: &str, outcome: Outcome) -> bool {
        let resolver = self.pending.lock().remove(chunk_id);
        match resolver {
            Some(resolver) => {
                resolver.timer.abort();
                let _ = resolver.sender.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Reject every pending chunk with `error`; returns how many were pending
    pub fn reject_all(&self, error: GenerationError) -> usize {
        let drained: Vec<PendingResolver> =
            self.pending.lock().drain().map(|(_, resolver)| resolver).collect();
        let count = drained.len();
        for resolver in drained {
            resolver.timer.abort();
            let _ = resolver.sender.send(Err(error.clone()));
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Route an inbound envelope to the resolver it answers
    pub fn dispatch(&self, envelope: Envelope) -> Dispatch {
        match &envelope {
            Envelope::Progress(progress) => {
                tracing::debug!(
                    chunk_id = ?progress.chunk_id,
                    status = ?progress.status,
                    progress = ?progress.progress,
                    message = ?progress.message,
                    "Chunk progress"
                );
                return Dispatch::Informational;
            }
            Envelope::ConnectionStatus(status) => {
                tracing::info!(status = ?status.status, "Gateway connection status");
                return Dispatch::Informational;
            }
            Envelope::TtsRequest(_) => {
                tracing::warn!("Gateway sent a tts_request; ignoring");
                return Dispatch::Ignored;
            }
            Envelope::TtsResponse(_) | Envelope::Error(_) => {}
        }

        let Some(response) = ChunkResponse::from_envelope(envelope) else {
            return Dispatch::Ignored;
        };
        let outcome = response.outcome.map_err(GenerationError::Provider);

        match response.chunk_id {
            Some(chunk_id) => {
                if self.resolve(&chunk_id, outcome) {
                    Dispatch::Resolved(chunk_id)
                } else {
                    tracing::debug!(chunk_id = %chunk_id, "Dropping response for a chunk that is no longer pending");
                    Dispatch::Unmatched
                }
            }
            None => self.dispatch_unattributed(outcome),
        }
    }

    fn dispatch_unattributed(&self, outcome: Outcome) -> Dispatch {
        let mut pending = self.pending.lock();
        let count = pending.len();

        if count == 0 {
            tracing::debug!("Dropping response without chunk id; nothing is pending");
            return Dispatch::Unmatched;
        }

        if count == 1 && !self.strict {
            if let Some(chunk_id) = pending.keys().next().cloned() {
                if let Some(resolver) = pending.remove(&chunk_id) {
                    drop(pending);
                    tracing::debug!(chunk_id = %chunk_id, "Attributing response without chunk id to the only pending chunk");
                    resolver.timer.abort();
                    let _ = resolver.sender.send(outcome);
                    return Dispatch::Resolved(chunk_id);
                }
            }
        }

        let error = GenerationError::CorrelationAmbiguity { pending: count };
        tracing::warn!(error = %error, "Discarding response without chunk id");
        Dispatch::Ambiguous { pending: count }
    }

    fn expire(&self, chunk_id: &str, timeout: Duration) {
        let resolver = self.pending.lock().remove(chunk_id);
        if let Some(resolver) = resolver {
            tracing::warn!(chunk_id = %chunk_id, timeout_ms = timeout.as_millis() as u64, "Chunk deadline expired");
            let _ = resolver.sender.send(Err(GenerationError::Timeout {
                chunk_id: chunk_id.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }));
        }
    }
}

async fn expire_at(
    registry: Weak<CorrelationRegistry>,
    chunk_id: String,
    deadline: Instant,
    timeout: Duration,
) {
    tokio::time::sleep_until(deadline).await;
    if let Some(registry) = registry.upgrade() {
        registry.expire(&chunk_id, timeout);
    }
}
