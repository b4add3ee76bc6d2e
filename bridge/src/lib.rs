//! tsbridge – Bibliotheks-Root
//!
//! Verdrahtet ServerQuery-Sitzung, Event-Dispatcher und Webhook-Senke.

pub mod config;
pub mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::BridgeConfig;
use tokio_util::sync::CancellationToken;
use tsbridge_core::SystemUhr;
use tsbridge_query::{EventDispatcher, Sitzung, TcpVerbinder};
use tsbridge_webhook::{zeitzone_parsen, WebhookSenke};

/// Haelt die laufende Bridge zusammen
pub struct Bridge {
    pub config: BridgeConfig,
}

impl Bridge {
    pub fn neu(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Laeuft bis `abbruch` ausgeloest wird oder ein fataler Fehler auftritt
    pub async fn starten(self, abbruch: CancellationToken) -> Result<()> {
        self.config.validieren()?;

        let zeitzone = zeitzone_parsen(&self.config.webhook.zeitzone)?;
        let senke = WebhookSenke::neu(
            self.config.webhook.url.clone(),
            zeitzone,
            self.config.webhook_timeout(),
        )
        .context("HTTP-Client konnte nicht erstellt werden")?;

        let dispatcher = EventDispatcher::neu(Arc::new(senke), Arc::new(SystemUhr));
        let verbinder = TcpVerbinder::neu(self.config.query.host.clone(), self.config.query.port);

        tracing::info!(
            query = %self.config.query_adresse(),
            server_id = self.config.query.server_id,
            zeitzone = %zeitzone,
            "Bridge startet"
        );

        Sitzung::neu(verbinder, self.config.session_konfig())
            .starten(dispatcher, abbruch)
            .await
            .with_context(|| format!("ServerQuery-Sitzung zu {} beendet", self.config.query_adresse()))?;

        tracing::info!("Bridge beendet");
        Ok(())
    }
}
