use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::artifact::GeneratedArtifact;
use super::correlation::CorrelationRegistry;
use super::entry::{BatchReport, Entry, EntryOutcome};
use super::error::GenerationError;
use crate::domain::relay::{ChunkAudio, ChunkRequest};
use crate::domain::segmentation::{normalize_text, segment};
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::relay_client::{GatewayProbe, RelayTransport};

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub chunk_char_limit: usize,
    pub chunk_timeout: Duration,
    pub connect_timeout: Duration,
}

impl From<&ClientConfig> for GenerationSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            chunk_char_limit: config.chunk_char_limit,
            chunk_timeout: config.chunk_timeout,
            connect_timeout: config.connect_timeout,
        }
    }
}

pub struct GenerationService {
    transport: Arc<dyn RelayTransport>,
    probe: Arc<dyn GatewayProbe>,
    correlation: Arc<CorrelationRegistry>,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        transport: Arc<dyn RelayTransport>,
        probe: Arc<dyn GatewayProbe>,
        correlation: Arc<CorrelationRegistry>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            transport,
            probe,
            correlation,
            settings,
        }
    }
}

#[async_trait]
pub trait GenerationServiceApi: Send + Sync {
    /// Synthesize every entry of a batch over the relay
    ///
    /// This operation:
    /// - Probes the gateway and refuses to start if it is unavailable
    /// - Waits for the persistent connection before the first entry
    /// - Dispatches chunks one at a time, in segmentation order
    /// - Reports failures per entry and keeps going with the next one
    async fn run_batch(&self, entries: Vec<Entry>) -> Result<BatchReport, GenerationError>;
}

#[async_trait]
impl GenerationServiceApi for GenerationService {
    async fn run_batch(&self, entries: Vec<Entry>) -> Result<BatchReport, GenerationError> {
        let start_time = Instant::now();

        let status = self.probe.probe().await.map_err(|e| {
            tracing::warn!(error = %e, "Gateway probe failed; batch not started");
            GenerationError::Connectivity("server unavailable".to_string())
        })?;
        if !status.is_ok() {
            tracing::warn!(server = %status.server, "Gateway reported not ok; batch not started");
            return Err(GenerationError::Connectivity("server unavailable".to_string()));
        }

        self.transport
            .wait_until_connected(self.settings.connect_timeout)
            .await?;

        tracing::info!(
            entry_count = entries.len(),
            open_connections = status.websocket,
            "Batch started"
        );

        let mut report = BatchReport::default();
        let total_entries = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            let entry_ordinal = index + 1;

            if !self.transport.is_connected() {
                tracing::info!(entry_ordinal, "Connection lost between entries; waiting to reconnect");
                if let Err(error) = self
                    .transport
                    .wait_until_connected(self.settings.connect_timeout)
                    .await
                {
                    tracing::error!(error = %error, entry_ordinal, "Gave up waiting for the connection");
                    for remaining in entry_ordinal..=total_entries {
                        report
                            .outcomes
                            .push(EntryOutcome::failed(remaining, None, error.clone()));
                    }
                    break;
                }
            }

            let outcome = self
                .run_entry(entry_ordinal, entry, &mut report.artifacts)
                .await;
            if outcome.is_failed() {
                tracing::warn!(outcome = %outcome.describe(), "Entry failed");
            }
            report.outcomes.push(outcome);
        }

        tracing::info!(
            entry_count = total_entries,
            artifact_count = report.artifacts.len(),
            failed_entries = report.failure_count(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Batch finished"
        );

        Ok(report)
    }
}

impl GenerationService {
    async fn run_entry(
        &self,
        entry_ordinal: usize,
        entry: &Entry,
        artifacts: &mut Vec<GeneratedArtifact>,
    ) -> EntryOutcome {
        if let Err(error) = entry.validate() {
            return EntryOutcome::failed(entry_ordinal, None, error);
        }

        let text = normalize_text(&entry.text);
        if text.is_empty() {
            return EntryOutcome::failed(
                entry_ordinal,
                None,
                GenerationError::Validation("text has nothing to speak".to_string()),
            );
        }

        let chunks = segment(&text, self.settings.chunk_char_limit);
        let total_chunks = chunks.len();

        tracing::debug!(
            entry_ordinal,
            voice_id = %entry.voice_id,
            text_length = text.chars().count(),
            total_chunks,
            "Entry segmented"
        );

        for (chunk_index, chunk_text) in chunks.into_iter().enumerate() {
            let request = ChunkRequest {
                chunk_id: Uuid::new_v4().to_string(),
                entry_index: entry_ordinal - 1,
                chunk_index,
                total_chunks,
                text: chunk_text,
                voice_id: entry.voice_id.clone(),
                language: entry.language.clone(),
                settings: entry.settings,
            };

            match self.dispatch_chunk(request).await {
                Ok(audio) => artifacts.push(GeneratedArtifact::new(
                    Utc::now(),
                    entry.display_name(),
                    entry_ordinal,
                    chunk_index + 1,
                    audio,
                )),
                Err(error) => {
                    return EntryOutcome::failed(entry_ordinal, Some(chunk_index + 1), error)
                }
            }
        }

        EntryOutcome::completed(entry_ordinal, total_chunks)
    }

    /// One round-trip: register, send, await the correlated outcome
    async fn dispatch_chunk(&self, request: ChunkRequest) -> Result<ChunkAudio, GenerationError> {
        let start_time = Instant::now();
        let chunk_id = request.chunk_id.clone();
        let pending = self
            .correlation
            .register(chunk_id.clone(), self.settings.chunk_timeout)?;

        tracing::debug!(
            chunk_id = %chunk_id,
            entry_index = request.entry_index,
            chunk_index = request.chunk_index,
            total_chunks = request.total_chunks,
            text_length = request.text.chars().count(),
            "Dispatching chunk"
        );

        if let Err(error) = self.transport.send(request.into_envelope()).await {
            self.correlation.resolve(&chunk_id, Err(error));
        }

        let outcome = pending.wait().await;
        if let Ok(audio) = &outcome {
            tracing::info!(
                chunk_id = %chunk_id,
                audio_size_bytes = audio.audio.len(),
                latency_ms = start_time.elapsed().as_millis() as u64,
                "Chunk synthesized"
            );
        }
        outcome
    }
}
