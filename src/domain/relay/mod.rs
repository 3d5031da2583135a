pub mod chunk;
pub mod envelope;
pub mod probe;

pub use chunk::{ChunkAudio, ChunkRequest, ChunkResponse};
pub use envelope::{
    ConnectionStatus, ConnectionStatusPayload, Envelope, ErrorPayload, ProgressPayload,
    ProgressStatus, TtsRequestPayload, TtsResponsePayload, VoiceSettings,
};
pub use probe::ProbeStatus;
