//! Event-Dispatcher
//!
//! Einziger Konsument des Zeilen-Kanals. Verarbeitet jede Zeile strikt in
//! Ankunftsreihenfolge: dekodieren, ueber den Nickname-Cache anreichern,
//! an die Ausgangs-Senke zustellen. Die Zustellung wird abgewartet, eine
//! langsame Senke haelt also alle folgenden Ereignisse auf.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tsbridge_core::{ClientEreignis, EreignisSenke, Uhr};
use tsbridge_protocol::notification::{benachrichtigungs_typ, dekodieren, ist_benachrichtigung};
use tsbridge_protocol::Antwort;

use crate::cache::NicknameCache;

pub struct EventDispatcher {
    senke: Arc<dyn EreignisSenke>,
    uhr: Arc<dyn Uhr>,
    cache: NicknameCache,
}

impl EventDispatcher {
    pub fn neu(senke: Arc<dyn EreignisSenke>, uhr: Arc<dyn Uhr>) -> Self {
        Self {
            senke,
            uhr,
            cache: NicknameCache::neu(),
        }
    }

    pub fn cache(&self) -> &NicknameCache {
        &self.cache
    }

    /// Verarbeitet eine empfangene Zeile.
    ///
    /// Gibt fuer Benachrichtigungen das angereicherte Ereignis zurueck,
    /// fuer Befehlsantworten `None`.
    pub async fn zeile_verarbeiten(&mut self, zeile: &str) -> Option<ClientEreignis> {
        if !ist_benachrichtigung(zeile) {
            match Antwort::parsen(zeile) {
                Some(antwort) if !antwort.ist_ok() => tracing::warn!(
                    id = antwort.id,
                    nachricht = %antwort.nachricht,
                    "Fehlerantwort vom Server"
                ),
                _ => tracing::info!(zeile = %zeile, "Antwort"),
            }
            return None;
        }

        tracing::info!(zeile = %zeile, "Benachrichtigung");
        let ereignis = dekodieren(zeile, self.uhr.as_ref());
        Some(self.ausliefern(ereignis, benachrichtigungs_typ(zeile)).await)
    }

    /// Reichert ein Ereignis an und stellt es zu
    async fn ausliefern(&mut self, mut ereignis: ClientEreignis, typ: &str) -> ClientEreignis {
        self.cache.nickname_ergaenzen(&mut ereignis);

        if ereignis.aktion.ist_unbekannt() {
            tracing::debug!(
                typ = typ,
                reasonid = ereignis.reason_id.as_deref().unwrap_or("-"),
                client = %ereignis.client_id,
                "Ereignis ohne bekannte Aktion wird nicht zugestellt"
            );
            return ereignis;
        }

        if let Err(e) = self.senke.zustellen(&ereignis).await {
            tracing::warn!(
                fehler = %e,
                client = %ereignis.client_id,
                aktion = %ereignis.aktion,
                "Zustellung fehlgeschlagen, Ereignis verworfen"
            );
        }
        ereignis
    }

    /// Konsumiert den Zeilen-Kanal bis er geschlossen oder `abbruch`
    /// ausgeloest wird. Eine laufende Zustellung wird beim Abbruch noch
    /// abgeschlossen, danach endet die Schleife.
    pub async fn laufen(mut self, mut zeilen: mpsc::Receiver<String>, abbruch: CancellationToken) {
        loop {
            let zeile = tokio::select! {
                biased;
                _ = abbruch.cancelled() => break,
                zeile = zeilen.recv() => match zeile {
                    Some(z) => z,
                    None => break,
                },
            };

            self.zeile_verarbeiten(&zeile).await;
        }
        tracing::debug!(eintraege = self.cache.len(), "Event-Dispatcher beendet");
    }
}
