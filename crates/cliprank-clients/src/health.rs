//! Endpoint health checks.

use std::time::Duration;

use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Health probe timeout per endpoint.
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Health status of both model endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointHealth {
    pub asr_healthy: bool,
    pub chat_healthy: bool,
}

impl EndpointHealth {
    pub fn all_healthy(&self) -> bool {
        self.asr_healthy && self.chat_healthy
    }
}

/// Probe `GET /health` on both endpoints.
pub async fn check_endpoints(asr_base_url: &str, chat_base_url: &str) -> EndpointHealth {
    let client = reqwest::Client::new();
    let (asr, chat) = tokio::join!(
        check_one(&client, asr_base_url),
        check_one(&client, chat_base_url)
    );
    EndpointHealth {
        asr_healthy: asr,
        chat_healthy: chat,
    }
}

/// Probe both endpoints and fail unless both are healthy.
pub async fn require_healthy(asr_base_url: &str, chat_base_url: &str) -> ClientResult<()> {
    let health = check_endpoints(asr_base_url, chat_base_url).await;
    if health.all_healthy() {
        return Ok(());
    }

    let mut unhealthy = Vec::new();
    if !health.asr_healthy {
        unhealthy.push(format!("transcription endpoint {}", asr_base_url));
    }
    if !health.chat_healthy {
        unhealthy.push(format!("chat endpoint {}", chat_base_url));
    }
    Err(ClientError::Unhealthy(unhealthy.join(", ")))
}

async fn check_one(client: &reqwest::Client, base_url: &str) -> bool {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    match client
        .get(&url)
        .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            warn!(url = %url, "Health check failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_healthy() {
        let h = EndpointHealth {
            asr_healthy: true,
            chat_healthy: true,
        };
        assert!(h.all_healthy());

        let h = EndpointHealth {
            asr_healthy: true,
            chat_healthy: false,
        };
        assert!(!h.all_healthy());
    }
}
