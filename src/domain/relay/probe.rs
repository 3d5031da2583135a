use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the liveness probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeStatus {
    pub server: String,
    /// Open persistent connections
    pub websocket: usize,
    pub timestamp: DateTime<Utc>,
}

impl ProbeStatus {
    pub fn ok(open_connections: usize) -> Self {
        Self {
            server: "ok".to_string(),
            websocket: open_connections,
            timestamp: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.server == "ok"
    }
}
