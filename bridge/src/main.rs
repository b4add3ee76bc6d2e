//! tsbridge – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet die Bridge.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tsbridge::config::{BridgeConfig, ConfigQuelle};
use tsbridge::logging::logging_initialisieren;
use tsbridge::Bridge;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("TSBRIDGE_CONFIG").unwrap_or_else(|_| "tsbridge.toml".into());

    let (mut config, quelle) = BridgeConfig::laden(&config_pfad)?;
    config.umgebung_anwenden(|name| std::env::var(name).ok())?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    if quelle == ConfigQuelle::Standardwerte {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "tsbridge wird initialisiert"
    );

    let abbruch = CancellationToken::new();
    let signal = abbruch.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown-Signal empfangen, Bridge wird beendet");
            signal.cancel();
        }
    });

    if let Err(e) = Bridge::neu(config).starten(abbruch).await {
        tracing::error!(fehler = ?e, "Fataler Fehler");
        return Err(e);
    }
    Ok(())
}
