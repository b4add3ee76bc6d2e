//! Zeitquelle fuer den Notification-Decoder
//!
//! Der Decoder liest die Uhrzeit nie direkt, sondern ueber [`Uhr`]. So bleibt
//! das Dekodieren deterministisch und in Tests mit [`FesteUhr`] pruefbar.

use chrono::{DateTime, FixedOffset, Local};

/// Capability: liefert den aktuellen Zeitpunkt
pub trait Uhr: Send + Sync {
    /// Aktueller Zeitpunkt mit dem Offset der Quelle
    fn jetzt(&self) -> DateTime<FixedOffset>;
}

/// Echte Systemuhr
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUhr;

impl Uhr for SystemUhr {
    fn jetzt(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Uhr die immer denselben Zeitpunkt liefert
#[derive(Debug, Clone, Copy)]
pub struct FesteUhr(pub DateTime<FixedOffset>);

impl FesteUhr {
    /// Parst einen RFC-3339-Zeitstempel, z.B. `2020-01-01T00:00:00Z`
    pub fn aus_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(Self)
    }
}

impl Uhr for FesteUhr {
    fn jetzt(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
