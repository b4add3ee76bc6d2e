//! Nickname-Cache
//!
//! Verlassens-Benachrichtigungen tragen keinen Nickname. Der Cache merkt sich
//! den letzten Namen pro Client-ID aus der Verbindungs-Benachrichtigung.
//!
//! Eintraege leben so lange wie der Prozess und werden nur durch eine
//! spaetere Verbindung mit derselben Client-ID ueberschrieben. Da Client-IDs
//! nur innerhalb einer Verbindungsepoche eindeutig sind, kann ein alter Name
//! an einer wiederverwendeten ID haengen bleiben. Das ist bekannt und gewollt.
//!
//! Der Cache gehoert dem Event-Dispatcher und wird nur aus dessen Task
//! benutzt, daher ohne Lock.

use std::collections::HashMap;

use tsbridge_core::{Aktion, ClientEreignis, ClientId};

/// Ein Cache-Eintrag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEintrag {
    pub letzte_client_id: ClientId,
    pub nickname: String,
}

#[derive(Debug, Default)]
pub struct NicknameCache {
    eintraege: HashMap<ClientId, CacheEintrag>,
}

impl NicknameCache {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Ueberschreibt den Eintrag fuer `client_id` bedingungslos
    pub fn verbindung_merken(&mut self, client_id: &ClientId, nickname: &str) {
        self.eintraege.insert(
            client_id.clone(),
            CacheEintrag {
                letzte_client_id: client_id.clone(),
                nickname: nickname.to_string(),
            },
        );
    }

    /// Reichert ein Ereignis an.
    ///
    /// Bei [`Aktion::Verbunden`] wird der Nickname gemerkt. Sonst wird ein
    /// leerer Nickname aus dem Cache ergaenzt (bleibt leer, falls die ID
    /// unbekannt ist).
    pub fn nickname_ergaenzen(&mut self, ereignis: &mut ClientEreignis) {
        if ereignis.aktion == Aktion::Verbunden {
            self.verbindung_merken(&ereignis.client_id, &ereignis.nickname);
        } else if ereignis.nickname.is_empty() {
            if let Some(nickname) = self.nickname(&ereignis.client_id) {
                ereignis.nickname = nickname.to_string();
            }
        }
    }

    pub fn nickname(&self, client_id: &ClientId) -> Option<&str> {
        self.eintraege.get(client_id).map(|e| e.nickname.as_str())
    }

    pub fn eintrag(&self, client_id: &ClientId) -> Option<&CacheEintrag> {
        self.eintraege.get(client_id)
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }
}
