//! tsbridge-query – ServerQuery-Client
//!
//! Haelt die Verbindung zum Voice-Server und liefert Client-Ereignisse an
//! eine [`tsbridge_core::EreignisSenke`]:
//!
//! ```text
//! Bytes -> QueryCodec -> Zeile -> (Kanal) -> Decoder -> Nickname-Cache -> Senke
//! ```
//!
//! Ein Task liest Zeilen (Supervisor in [`Sitzung`]), ein zweiter Task
//! ([`EventDispatcher`]) verarbeitet sie strikt nacheinander.

pub mod backoff;
pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod session;
pub mod verbindung;

pub use backoff::ReconnectKonfig;
pub use cache::NicknameCache;
pub use dispatcher::EventDispatcher;
pub use error::{QueryError, QueryResult};
pub use session::{SessionKonfig, SessionZustand, Sitzung};
pub use verbindung::{TcpVerbinder, Verbinder};
