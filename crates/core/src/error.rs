//! Fehlertypen fuer die Bridge
//!
//! Fehler, die eine [`crate::EreignisSenke`] an den Dispatcher meldet.
//! Query- und Webhook-Crate definieren eigene Fehler und konvertieren
//! bei Bedarf hierher.

use thiserror::Error;

/// Globaler Result-Alias fuer die Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Zustellung fehlgeschlagen: {0}")]
    Zustellung(String),
}
