use chrono::{DateTime, Utc};

use crate::domain::relay::ChunkAudio;

/// Audio for one synthesized chunk, held in memory until packaged
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub audio: Vec<u8>,
    pub content_type: String,
}

impl GeneratedArtifact {
    /// Name the artifact after its creation time, voice and 1-based ordinals
    pub fn new(
        created_at: DateTime<Utc>,
        voice_name: &str,
        entry_ordinal: usize,
        chunk_ordinal: usize,
        audio: ChunkAudio,
    ) -> Self {
        let file_name = format!(
            "{}_{}_{:02}-{:02}.{}",
            created_at.format("%Y%m%d-%H%M%S%3f"),
            sanitize_voice_name(voice_name),
            entry_ordinal,
            chunk_ordinal,
            extension_for(&audio.content_type)
        );

        Self {
            file_name,
            audio: audio.audio,
            content_type: audio.content_type,
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/flac" => "flac",
        "audio/aac" => "aac",
        _ => "bin",
    }
}

fn sanitize_voice_name(voice_name: &str) -> String {
    let sanitized: String = voice_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        "voice".to_string()
    } else {
        sanitized
    }
}
