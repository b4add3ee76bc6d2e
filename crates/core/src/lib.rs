//! tsbridge-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die Protokoll-, Query- und
//! Webhook-Crate gemeinsam nutzen: das Ereignis-Datenmodell, die
//! Zeitquelle und die Schnittstelle zur Ausgangs-Senke.

pub mod clock;
pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use clock::{FesteUhr, SystemUhr, Uhr};
pub use error::{BridgeError, Result};
pub use event::{Aktion, ClientEreignis, EreignisSenke, ANONYM_PLATZHALTER};
pub use types::ClientId;
