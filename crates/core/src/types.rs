//! Identifikationstypen fuer ServerQuery-Clients
//!
//! Die Client-ID wird vom Voice-Server pro Verbindung vergeben und ist nur
//! innerhalb einer Verbindungsepoche des Clients eindeutig. Das Newtype-Pattern
//! verhindert Verwechslungen mit der langlebigen Unique-ID.

use serde::{Deserialize, Serialize};

/// Sitzungsbezogene Client-ID (`clid`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    /// Erstellt eine ClientId aus dem Rohwert des Protokolls
    pub fn new(roh: impl Into<String>) -> Self {
        Self(roh.into())
    }

    /// Gibt den Rohwert zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// true wenn die Zeile keine `clid` enthielt
    pub fn ist_leer(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ClientId {
    fn from(roh: &str) -> Self {
        Self(roh.to_string())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clid:{}", self.0)
    }
}
