use serde::{Deserialize, Serialize};

use super::artifact::GeneratedArtifact;
use super::error::GenerationError;
use crate::domain::relay::VoiceSettings;

/// One user-supplied text item with its own voice selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub text: String,
    pub voice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub settings: VoiceSettings,
}

impl Entry {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            voice_name: None,
            language: None,
            settings: VoiceSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.text.trim().is_empty() {
            return Err(GenerationError::Validation("text is required".to_string()));
        }
        if self.voice_id.trim().is_empty() {
            return Err(GenerationError::Validation("a voice must be selected".to_string()));
        }
        Ok(())
    }

    /// Name used in artifact file names; falls back to the voice id
    pub fn display_name(&self) -> &str {
        self.voice_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.voice_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryStatus {
    Completed { chunks: usize },
    Failed {
        /// 1-based ordinal of the failing chunk; `None` when no chunk was sent
        chunk_ordinal: Option<usize>,
        error: GenerationError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    /// 1-based position of the entry in the batch
    pub entry_ordinal: usize,
    pub status: EntryStatus,
}

impl EntryOutcome {
    pub fn completed(entry_ordinal: usize, chunks: usize) -> Self {
        Self {
            entry_ordinal,
            status: EntryStatus::Completed { chunks },
        }
    }

    pub fn failed(entry_ordinal: usize, chunk_ordinal: Option<usize>, error: GenerationError) -> Self {
        Self {
            entry_ordinal,
            status: EntryStatus::Failed {
                chunk_ordinal,
                error,
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, EntryStatus::Failed { .. })
    }

    /// Human-readable line naming the entry, the chunk and the reason
    pub fn describe(&self) -> String {
        match &self.status {
            EntryStatus::Completed { chunks } => {
                format!("entry {}: completed ({} chunks)", self.entry_ordinal, chunks)
            }
            EntryStatus::Failed {
                chunk_ordinal: Some(chunk),
                error,
            } => format!("entry {} chunk {}: failed: {}", self.entry_ordinal, chunk, error),
            EntryStatus::Failed {
                chunk_ordinal: None,
                error,
            } => format!("entry {}: failed: {}", self.entry_ordinal, error),
        }
    }
}

/// Result of a batch: every artifact produced plus one outcome per entry
#[derive(Debug, Default)]
pub struct BatchReport {
    pub artifacts: Vec<GeneratedArtifact>,
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_failed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}
