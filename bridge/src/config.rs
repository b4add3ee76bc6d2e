//! Bridge-Konfiguration
//!
//! Wird beim Start aus einer optionalen TOML-Datei geladen und danach von
//! den `TS3_DISCORD_BOT_*`-Umgebungsvariablen ueberschrieben. Alle Felder
//! haben Standardwerte, nur die Webhook-URL muss gesetzt werden.

use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use tsbridge_query::{ReconnectKonfig, SessionKonfig};

use crate::logging::log_format_gueltig;

/// Vollstaendige Bridge-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// ServerQuery-Verbindung
    pub query: QueryEinstellungen,
    /// Ausgangs-Webhook
    pub webhook: WebhookEinstellungen,
    /// Wiederverbindungs-Strategie
    pub reconnect: ReconnectEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// ServerQuery-Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryEinstellungen {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub passwort: String,
    /// Virtueller Server (`use sid=<n>`)
    pub server_id: u32,
}

impl Default for QueryEinstellungen {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 10011,
            login: "serveradmin".into(),
            passwort: String::new(),
            server_id: 1,
        }
    }
}

/// Ausgangs-Webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookEinstellungen {
    pub url: String,
    /// IANA-Name, leer = UTC
    pub zeitzone: String,
    pub timeout_secs: u64,
}

impl Default for WebhookEinstellungen {
    fn default() -> Self {
        Self {
            url: String::new(),
            zeitzone: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Wiederverbindungs-Strategie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectEinstellungen {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub faktor: f64,
}

impl Default for ReconnectEinstellungen {
    fn default() -> Self {
        Self {
            initial_ms: 1_000,
            max_ms: 60_000,
            faktor: 2.0,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter-Direktive, z.B. "info" oder "info,tsbridge_query=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Herkunft der geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigQuelle {
    Datei,
    /// Datei nicht gefunden
    Standardwerte,
}

impl BridgeConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt Standardwerte zurueck falls die Datei nicht existiert.
    ///
    /// Laeuft vor der Logging-Initialisierung, daher meldet die
    /// [`ConfigQuelle`] dem Aufrufer, ob die Datei gefehlt hat.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, ConfigQuelle)> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map(|config| (config, ConfigQuelle::Datei))
                .map_err(|e| anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), ConfigQuelle::Standardwerte))
            }
            Err(e) => Err(anyhow!("Konfigurationsdatei '{pfad}' nicht lesbar: {e}")),
        }
    }

    /// Uebernimmt gesetzte `TS3_DISCORD_BOT_*`-Variablen.
    ///
    /// `lesen` liefert den Wert einer Variable, produktiv
    /// `|name| std::env::var(name).ok()`.
    pub fn umgebung_anwenden<F>(&mut self, lesen: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lesen("TS3_DISCORD_BOT_HOST") {
            self.query.host = host;
        }
        if let Some(port) = lesen("TS3_DISCORD_BOT_PORT") {
            self.query.port = port
                .trim()
                .parse()
                .with_context(|| format!("TS3_DISCORD_BOT_PORT ist kein Port: '{port}'"))?;
        }
        if let Some(login) = lesen("TS3_DISCORD_BOT_LOGIN") {
            self.query.login = login;
        }
        if let Some(passwort) = lesen("TS3_DISCORD_BOT_PASSWORD") {
            self.query.passwort = passwort;
        }
        if let Some(server_id) = lesen("TS3_DISCORD_BOT_SERVER_ID") {
            self.query.server_id = server_id.trim().parse().with_context(|| {
                format!("TS3_DISCORD_BOT_SERVER_ID ist keine Zahl: '{server_id}'")
            })?;
        }
        if let Some(url) = lesen("TS3_DISCORD_BOT_WEBHOOK_URL") {
            self.webhook.url = url;
        }
        if let Some(zeitzone) = lesen("TS3_DISCORD_BOT_TIMEZONE") {
            self.webhook.zeitzone = zeitzone;
        }
        Ok(())
    }

    /// Prueft die Konfiguration vor dem Start. Jeder Fehler ist fatal.
    pub fn validieren(&self) -> anyhow::Result<()> {
        if self.query.host.trim().is_empty() {
            return Err(anyhow!("query.host darf nicht leer sein"));
        }
        if self.query.port == 0 {
            return Err(anyhow!("query.port darf nicht 0 sein"));
        }
        if self.webhook.url.trim().is_empty() {
            return Err(anyhow!(
                "Keine Webhook-URL gesetzt (webhook.url oder TS3_DISCORD_BOT_WEBHOOK_URL)"
            ));
        }
        tsbridge_webhook::zeitzone_parsen(&self.webhook.zeitzone)?;
        if self.reconnect.initial_ms == 0 || self.reconnect.max_ms < self.reconnect.initial_ms {
            return Err(anyhow!(
                "reconnect: initial_ms muss > 0 und <= max_ms sein"
            ));
        }
        if self.reconnect.faktor < 1.0 {
            return Err(anyhow!("reconnect.faktor muss >= 1.0 sein"));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(anyhow!(
                "Unbekanntes Log-Format '{}' (text oder json)",
                self.logging.format
            ));
        }
        Ok(())
    }

    /// Host und Port in der Form `host:port`
    pub fn query_adresse(&self) -> String {
        format!("{}:{}", self.query.host, self.query.port)
    }

    pub fn session_konfig(&self) -> SessionKonfig {
        SessionKonfig {
            login: self.query.login.clone(),
            passwort: self.query.passwort.clone(),
            server_id: self.query.server_id,
            reconnect: ReconnectKonfig {
                initial: Duration::from_millis(self.reconnect.initial_ms),
                maximum: Duration::from_millis(self.reconnect.max_ms),
                faktor: self.reconnect.faktor,
            },
        }
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook.timeout_secs)
    }
}
