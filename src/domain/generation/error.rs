/// Failures of a generation batch, by the scope they affect
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Not connected or probe failed; aborts a batch before it starts
    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("chunk {chunk_id} timed out after {timeout_ms} ms")]
    Timeout { chunk_id: String, timeout_ms: u64 },

    #[error("provider error: {0}")]
    Provider(String),

    /// Entry rejected before any network I/O
    #[error("validation error: {0}")]
    Validation(String),

    /// Response without a chunk id that cannot be attributed; logged, never surfaced
    #[error("unattributable response while {pending} chunks are pending")]
    CorrelationAmbiguity { pending: usize },

    /// The request could not be written to the connection
    #[error("transport error: {0}")]
    Transport(String),

    #[error("chunk id {0} is already pending")]
    DuplicateChunk(String),

    #[error("packaging error: {0}")]
    Packaging(String),
}

impl GenerationError {
    /// Errors that end the whole batch rather than a single entry
    pub fn is_batch_level(&self) -> bool {
        matches!(self, GenerationError::Connectivity(_))
    }
}
