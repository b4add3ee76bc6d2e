//! Notification-Decoder
//!
//! Wandelt eine einzelne Benachrichtigungszeile in ein [`ClientEreignis`].
//! Der Decoder ist zustandslos: kein Netzwerk, kein Nickname-Cache.
//!
//! Erfasst wird jedes nicht-ueberlappende Paar `token=wert`, wobei `token`
//! aus Wortzeichen und `wert` aus Nicht-Leerzeichen besteht. Das ist lockerer
//! als die volle Protokoll-Grammatik, reicht aber fuer die Client-Felder.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tsbridge_core::{Aktion, ClientEreignis, ClientId, Uhr};

/// Prefix aller asynchronen Server-Benachrichtigungen
pub const BENACHRICHTIGUNGS_PREFIX: &str = "notify";

static PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Za-z_]+)=([^\t\n\x0C\r ]+)").expect("statisches Muster ist gueltig")
});

/// true wenn die Zeile eine Server-Benachrichtigung ist
pub fn ist_benachrichtigung(zeile: &str) -> bool {
    zeile.starts_with(BENACHRICHTIGUNGS_PREFIX)
}

/// Typ der Benachrichtigung, z.B. `notifycliententerview`
pub fn benachrichtigungs_typ(zeile: &str) -> &str {
    zeile.split_whitespace().next().unwrap_or_default()
}

/// Dekodiert eine Benachrichtigungszeile.
///
/// Der Empfangszeitpunkt wird genau einmal zu Beginn von `uhr` gelesen und
/// nach UTC konvertiert. Unbekannte Tokens werden ignoriert, ein unbekannter
/// `reasonid` laesst die Aktion auf [`Aktion::Unbekannt`].
pub fn dekodieren(zeile: &str, uhr: &dyn Uhr) -> ClientEreignis {
    let mut ereignis = ClientEreignis::neu(uhr.jetzt().with_timezone(&Utc));

    for parameter in PARAMETER.captures_iter(zeile) {
        let (_, [token, wert]) = parameter.extract();
        match token {
            "clid" => ereignis.client_id = ClientId::new(wert),
            "client_nickname" => ereignis.nickname = wert.replace("\\s", " "),
            "client_unique_identifier" => ereignis.client_unique_id = wert.to_string(),
            "reasonid" => {
                ereignis.reason_id = Some(wert.to_string());
                let aktion = Aktion::aus_reason_id(wert);
                if !aktion.ist_unbekannt() {
                    ereignis.aktion = aktion;
                }
            }
            _ => {}
        }
    }

    ereignis
}
