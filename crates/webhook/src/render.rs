//! Darstellung eines Ereignisses als Chat-Nachricht
//!
//! Format: `<HH:MM:SS> <Nickname> <Aktion>`, die Uhrzeit in der
//! konfigurierten Zeitzone. Ein leerer Nickname wird erst hier durch
//! `Anonymous` ersetzt.

use chrono_tz::Tz;
use serde::Serialize;
use tsbridge_core::ClientEreignis;

use crate::error::{WebhookError, WebhookResult};

/// JSON-Body des Webhooks
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Nutzlast {
    pub content: String,
}

impl Nutzlast {
    pub fn fuer(ereignis: &ClientEreignis, zeitzone: Tz) -> Self {
        Self {
            content: nachricht_rendern(ereignis, zeitzone),
        }
    }
}

/// Parst einen IANA-Zeitzonennamen. Leer bedeutet UTC.
pub fn zeitzone_parsen(name: &str) -> WebhookResult<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Tz::UTC);
    }
    name.parse::<Tz>()
        .map_err(|_| WebhookError::Zeitzone(name.to_string()))
}

pub fn nachricht_rendern(ereignis: &ClientEreignis, zeitzone: Tz) -> String {
    let zeit = ereignis.empfangen_um.with_timezone(&zeitzone);
    format!(
        "{} {} {}",
        zeit.format("%H:%M:%S"),
        ereignis.anzeigename(),
        ereignis.aktion.als_text()
    )
}
