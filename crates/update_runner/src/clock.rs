//! Clock - injizierbare Wartezeiten
//!
//! Die Stabilisierungs-Waits laufen über dieses Trait, damit Tests die
//! angeforderte Wartezeit prüfen können ohne real zu schlafen.

use async_trait::async_trait;
use std::time::Duration;

/// Trait für blockierende Wartezeiten.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn settle(&self, duration: Duration);
}

/// Echte Clock über tokio::time::sleep.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
