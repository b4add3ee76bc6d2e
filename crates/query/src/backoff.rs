//! Exponentielles Backoff mit Jitter fuer Reconnects
//!
//! Die Bridge gibt nie auf, wartet aber zwischen zwei Versuchen
//! 1s -> 2s -> 4s -> ... -> 60s (plus bis zu 25 % Jitter), damit sie nicht
//! gegen einen unerreichbaren Server im Kreis laeuft.

use std::time::Duration;

use rand::RngExt;

/// Reconnect-Konfiguration
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectKonfig {
    /// Wartezeit vor dem ersten Reconnect
    pub initial: Duration,
    /// Obergrenze der Wartezeit
    pub maximum: Duration,
    /// Multiplikator pro fehlgeschlagenem Versuch
    pub faktor: f64,
}

impl Default for ReconnectKonfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            maximum: Duration::from_secs(60),
            faktor: 2.0,
        }
    }
}

/// Zustand des Backoffs ueber mehrere Versuche
#[derive(Debug, Clone)]
pub struct Backoff {
    konfig: ReconnectKonfig,
    aktuell: Duration,
    versuche: u32,
}

impl Backoff {
    pub fn neu(konfig: ReconnectKonfig) -> Self {
        Self {
            aktuell: konfig.initial,
            konfig,
            versuche: 0,
        }
    }

    /// Liefert die naechste Wartezeit und erhoeht die Basis
    pub fn naechste_verzoegerung(&mut self) -> Duration {
        let basis = self.aktuell.min(self.konfig.maximum);
        let verzoegerung = (basis + jitter(basis / 4)).min(self.konfig.maximum);

        self.aktuell = basis.mul_f64(self.konfig.faktor.max(1.0)).min(self.konfig.maximum);
        self.versuche = self.versuche.saturating_add(1);
        verzoegerung
    }

    /// Nach einer erfolgreichen Sitzung wieder bei `initial` beginnen
    pub fn zuruecksetzen(&mut self) {
        self.aktuell = self.konfig.initial;
        self.versuche = 0;
    }

    /// Anzahl der Versuche seit dem letzten Zuruecksetzen
    pub fn versuche(&self) -> u32 {
        self.versuche
    }
}

fn jitter(obergrenze: Duration) -> Duration {
    let ms = obergrenze.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(0..=ms))
}
