use serde::{Deserialize, Serialize};

/// Tagged message exchanged over the persistent connection.
///
/// Serialized as `{"type": "<kind>", "payload": {...}}`, one envelope per
/// text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Envelope {
    ConnectionStatus(ConnectionStatusPayload),
    TtsRequest(TtsRequestPayload),
    Progress(ProgressPayload),
    TtsResponse(TtsResponsePayload),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatusPayload {
    pub status: ConnectionStatus,
}

/// Voice shaping parameters forwarded to the provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceSettings {
    pub speed: f32,
    pub pitch_shift: f32,
    pub pitch_variance: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch_shift: 0.0,
            pitch_variance: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequestPayload {
    pub voice_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub settings: VoiceSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Starting,
    Downloading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Fraction of the provider response received, 0..=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponsePayload {
    /// Base64 encoded audio bytes
    pub audio: String,
    pub content_type: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

impl Envelope {
    pub fn connected() -> Self {
        Envelope::ConnectionStatus(ConnectionStatusPayload {
            status: ConnectionStatus::Connected,
        })
    }

    pub fn starting(chunk_id: Option<String>, message: impl Into<String>) -> Self {
        Envelope::Progress(ProgressPayload {
            status: ProgressStatus::Starting,
            message: Some(message.into()),
            progress: None,
            chunk_id,
        })
    }

    pub fn downloading(chunk_id: Option<String>, ratio: f32) -> Self {
        Envelope::Progress(ProgressPayload {
            status: ProgressStatus::Downloading,
            message: None,
            progress: Some(ratio.clamp(0.0, 1.0)),
            chunk_id,
        })
    }

    /// Short name of the envelope kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::ConnectionStatus(_) => "connection_status",
            Envelope::TtsRequest(_) => "tts_request",
            Envelope::Progress(_) => "progress",
            Envelope::TtsResponse(_) => "tts_response",
            Envelope::Error(_) => "error",
        }
    }

    pub fn chunk_id(&self) -> Option<&str> {
        match self {
            Envelope::ConnectionStatus(_) => None,
            Envelope::TtsRequest(p) => p.chunk_id.as_deref(),
            Envelope::Progress(p) => p.chunk_id.as_deref(),
            Envelope::TtsResponse(p) => p.chunk_id.as_deref(),
            Envelope::Error(p) => p.chunk_id.as_deref(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
