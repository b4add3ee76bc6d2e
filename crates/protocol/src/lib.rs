//! tsbridge-protocol – ServerQuery-Zeilenprotokoll
//!
//! Dieses Crate kennt nur Bytes und Zeilen, keinen Netzwerk-Zustand:
//! - [`wire`]: Zeilen-Framing mit dem Zeilenende `"\n\r"` und der `QueryCodec`
//! - [`notification`]: Dekodieren von Client-Benachrichtigungen
//! - [`befehl`]: Ausgehende Befehle und Befehlsantworten

pub mod befehl;
pub mod notification;
pub mod wire;

pub use befehl::{Antwort, Befehl};
pub use notification::{dekodieren, ist_benachrichtigung};
pub use wire::{naechste_zeile, Framing, QueryCodec};
