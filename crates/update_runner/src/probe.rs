//! Health Probe - direkte Erreichbarkeitsprüfung gegen einen Node
//!
//! Unabhängig vom API-Status: ein `GET http://<adresse>:10248/healthz`
//! direkt gegen den Node. Jeder Fehlschlag (Netzwerkfehler, Timeout,
//! Nicht-200) ist ein boolesches "unhealthy", nie ein Fehler.

use async_trait::async_trait;
use std::time::Duration;

/// Port des Node-Health-Endpoints (kubelet healthz).
pub const HEALTH_PORT: u16 = 10248;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait für die direkte Node-Health-Probe.
/// Ermöglicht Mocking für Tests.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Prüft ob der Node unter der Adresse gesund antwortet.
    async fn check(&self, address: &str) -> bool;
}

/// Echte HTTP-Probe gegen den healthz-Endpoint.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    port: u16,
}

impl HttpHealthProbe {
    pub fn new() -> Self {
        Self::with_port(HEALTH_PORT)
    }

    pub fn with_port(port: u16) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { client, port }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self, address: &str) -> bool {
        let url = format!("http://{}:{}/healthz", address, self.port);

        match self.client.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }
}
