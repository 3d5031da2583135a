use async_trait::async_trait;
use std::time::Duration;

use crate::domain::generation::GenerationError;
use crate::domain::relay::{Envelope, ProbeStatus};

/// Persistent connection to the gateway as seen by the orchestrator
#[async_trait]
pub trait RelayTransport: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Resolve once connected; `Connectivity` on timeout or when the
    /// connection has given up for good
    async fn wait_until_connected(&self, timeout: Duration) -> Result<(), GenerationError>;

    /// Queue an envelope on the connection's single writer
    async fn send(&self, envelope: Envelope) -> Result<(), GenerationError>;
}

/// Liveness check issued before every batch
#[async_trait]
pub trait GatewayProbe: Send + Sync {
    async fn probe(&self) -> Result<ProbeStatus, GenerationError>;
}
