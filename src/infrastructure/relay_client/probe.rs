use async_trait::async_trait;
use std::time::Duration;

use super::transport::GatewayProbe;
use crate::domain::generation::GenerationError;
use crate::domain::relay::ProbeStatus;

/// Liveness probe against the gateway's `/api/health` endpoint
pub struct HttpGatewayProbe {
    http_client: reqwest::Client,
    url: String,
}

impl HttpGatewayProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Connectivity(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl GatewayProbe for HttpGatewayProbe {
    async fn probe(&self) -> Result<ProbeStatus, GenerationError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| GenerationError::Connectivity(e.to_string()))?;

        let status: ProbeStatus = response
            .json()
            .await
            .map_err(|e| GenerationError::Connectivity(format!("invalid probe body: {}", e)))?;

        tracing::debug!(
            url = %self.url,
            open_connections = status.websocket,
            "Gateway probe succeeded"
        );

        Ok(status)
    }
}
