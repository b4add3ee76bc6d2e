//! Fehlertypen fuer den ServerQuery-Client

use std::io;

use thiserror::Error;

/// Alle Fehler die eine Sitzung beenden koennen
///
/// Lesefehler und Stream-Ende tauchen hier nicht auf: sie loesen immer einen
/// Reconnect aus und werden nie an den Aufrufer gemeldet.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Adresse '{adresse}' nicht aufloesbar: {grund}")]
    Adresse { adresse: String, grund: String },

    #[error("Verbindung zu {ziel} fehlgeschlagen: {quelle}")]
    Verbindungsaufbau {
        ziel: String,
        #[source]
        quelle: io::Error,
    },

    #[error("TCP-Keep-Alive nicht konfigurierbar: {0}")]
    KeepAlive(#[source] io::Error),

    #[error("Befehl '{befehl}' konnte nicht gesendet werden: {quelle}")]
    Senden {
        befehl: String,
        #[source]
        quelle: io::Error,
    },

    #[error("Event-Dispatcher wurde unerwartet beendet")]
    DispatcherBeendet,
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// true wenn ein erneuter Verbindungsversuch den Fehler nicht beheben kann.
    ///
    /// Ein fehlgeschlagener Verbindungsaufbau ist nur waehrend eines
    /// Reconnects wiederholbar; beim Prozessstart behandelt die Sitzung
    /// jeden Fehler als fatal.
    pub fn ist_fatal(&self) -> bool {
        !matches!(self, Self::Verbindungsaufbau { .. })
    }
}
