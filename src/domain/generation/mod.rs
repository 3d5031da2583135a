pub mod artifact;
pub mod correlation;
pub mod entry;
pub mod error;
pub mod packager;
pub mod service;

pub use artifact::GeneratedArtifact;
pub use correlation::{CorrelationRegistry, Dispatch, PendingChunk};
pub use entry::{BatchReport, Entry, EntryOutcome, EntryStatus};
pub use error::GenerationError;
pub use packager::package_artifacts;
pub use service::{GenerationService, GenerationServiceApi, GenerationSettings};
