use crate::domain::relay::VoiceSettings;

/// Provider call for a single chunk, after validation and language resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    /// ISO 639-1 code
    pub language: String,
    pub settings: VoiceSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub content_type: String,
}
