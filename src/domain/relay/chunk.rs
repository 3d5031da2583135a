use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use super::envelope::{Envelope, TtsRequestPayload, TtsResponsePayload, VoiceSettings};

/// One synthesis round-trip issued by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest {
    pub chunk_id: String,
    pub entry_index: usize,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
    pub voice_id: String,
    pub language: Option<String>,
    pub settings: VoiceSettings,
}

impl ChunkRequest {
    pub fn into_envelope(self) -> Envelope {
        Envelope::TtsRequest(TtsRequestPayload {
            voice_id: self.voice_id,
            text: self.text,
            language: self.language,
            settings: self.settings,
            chunk_id: Some(self.chunk_id),
            total_chunks: Some(self.total_chunks),
            entry_index: Some(self.entry_index),
            chunk_index: Some(self.chunk_index),
        })
    }
}

/// Raw audio returned for a chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkAudio {
    pub audio: Vec<u8>,
    pub content_type: String,
}

/// A response envelope reduced to what the correlation layer needs
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResponse {
    pub chunk_id: Option<String>,
    pub outcome: Result<ChunkAudio, String>,
}

impl ChunkResponse {
    /// Returns `None` for envelopes that do not answer a chunk
    pub fn from_envelope(envelope: Envelope) -> Option<Self> {
        match envelope {
            Envelope::TtsResponse(payload) => {
                let chunk_id = payload.chunk_id.clone();
                let outcome = if payload.success {
                    payload.decode_audio()
                } else {
                    Err("provider reported an unsuccessful synthesis".to_string())
                };
                Some(Self { chunk_id, outcome })
            }
            Envelope::Error(payload) => Some(Self {
                chunk_id: payload.chunk_id,
                outcome: Err(payload.message),
            }),
            _ => None,
        }
    }
}

impl TtsResponsePayload {
    pub fn from_audio(chunk_id: Option<String>, audio: &[u8], content_type: &str) -> Self {
        Self {
            audio: BASE64.encode(audio),
            content_type: content_type.to_string(),
            success: true,
            chunk_id,
        }
    }

    pub fn decode_audio(&self) -> Result<ChunkAudio, String> {
        let audio = BASE64
            .decode(self.audio.as_bytes())
            .map_err(|e| format!("invalid audio payload: {}", e))?;
        Ok(ChunkAudio {
            audio,
            content_type: self.content_type.clone(),
        })
    }
}
