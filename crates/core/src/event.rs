//! Ereignis-Datenmodell und Ausgangs-Senke
//!
//! Ein [`ClientEreignis`] ist genau eine dekodierte Benachrichtigung des
//! Voice-Servers. Die [`EreignisSenke`] ist der externe Kollaborateur, der
//! ein fertig angereichertes Ereignis nach aussen zustellt (z.B. Webhook).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ClientId;

/// Platzhalter fuer einen unbekannten Nickname. Wird ausschliesslich bei der
/// Darstellung eingesetzt, nie im Cache oder im Ereignis selbst.
pub const ANONYM_PLATZHALTER: &str = "Anonymous";

/// Was mit dem Client passiert ist (aus `reasonid`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aktion {
    /// `reasonid=0`
    Verbunden,
    /// `reasonid=3`
    VerbindungVerloren,
    /// `reasonid=8`
    Getrennt,
    /// Kein oder unbekannter `reasonid`
    #[default]
    Unbekannt,
}

impl Aktion {
    /// Bildet einen `reasonid`-Wert auf eine Aktion ab
    pub fn aus_reason_id(wert: &str) -> Self {
        match wert {
            "0" => Self::Verbunden,
            "3" => Self::VerbindungVerloren,
            "8" => Self::Getrennt,
            _ => Self::Unbekannt,
        }
    }

    /// Lesbarer Text fuer die Chat-Nachricht
    pub fn als_text(&self) -> &'static str {
        match self {
            Self::Verbunden => "has connected",
            Self::VerbindungVerloren => "has lost the connection",
            Self::Getrennt => "has disconnected",
            Self::Unbekannt => "did something unknown",
        }
    }

    pub fn ist_unbekannt(&self) -> bool {
        matches!(self, Self::Unbekannt)
    }
}

impl std::fmt::Display for Aktion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_text())
    }
}

/// Eine dekodierte Client-Benachrichtigung
///
/// Nicht jedes Feld ist immer befuellt: fehlende Tokens in der Zeile
/// bleiben leer, ein unbekannter `reasonid` wird zu [`Aktion::Unbekannt`]
/// und bleibt in `reason_id` fuer das Log erhalten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEreignis {
    pub aktion: Aktion,
    pub client_id: ClientId,
    /// Langlebige Identitaet, fuer die Bridge opak
    pub client_unique_id: String,
    /// Anzeigename, leer falls die Zeile keinen trug
    pub nickname: String,
    /// Empfangszeitpunkt in UTC
    pub empfangen_um: DateTime<Utc>,
    /// Roher `reasonid`-Wert der Zeile, falls vorhanden
    #[serde(default)]
    pub reason_id: Option<String>,
}

impl ClientEreignis {
    /// Leeres Ereignis mit gesetztem Empfangszeitpunkt
    pub fn neu(empfangen_um: DateTime<Utc>) -> Self {
        Self {
            aktion: Aktion::Unbekannt,
            client_id: ClientId::default(),
            client_unique_id: String::new(),
            nickname: String::new(),
            empfangen_um,
            reason_id: None,
        }
    }

    /// Nickname fuer die Darstellung, `Anonymous` falls unbekannt
    pub fn anzeigename(&self) -> &str {
        if self.nickname.is_empty() {
            ANONYM_PLATZHALTER
        } else {
            &self.nickname
        }
    }
}

/// Ausgangs-Senke fuer fertig angereicherte Ereignisse
///
/// Die Zustellung ist best-effort: ein Fehler wird vom Aufrufer geloggt und
/// verworfen, nie wiederholt.
#[async_trait]
pub trait EreignisSenke: Send + Sync + 'static {
    /// Stellt ein Ereignis zu
    async fn zustellen(&self, ereignis: &ClientEreignis) -> crate::Result<()>;
}
