//! Session-Manager
//!
//! Besitzt die Verbindung zum Server und treibt den Zustandsautomaten:
//!
//! ```text
//! Getrennt -> Verbinden -> Authentifizieren -> Registrieren -> Aktiv
//!                ^                                              |
//!                +------------- Wiederverbinden <---------------+
//! ```
//!
//! Die Supervisor-Schleife in [`Sitzung::starten`] ist die einzige Stelle,
//! die eine neue Verbindung aufbaut. Die Leseschleife einer Verbindung endet
//! immer zuerst, bevor der naechste Versuch beginnt, es gibt also nie zwei
//! Leser gleichzeitig.
//!
//! Fehlerverhalten:
//! - Lesefehler / Stream-Ende: Reconnect mit Backoff, nie fatal
//! - Schreibfehler beim Senden eines Befehls: fatal fuer den Prozess
//! - Verbindungsaufbau: fatal beim ersten Versuch, danach wiederholt
//!
//! Das Backoff beginnt erst wieder bei `initial`, wenn eine Verbindung
//! mindestens eine Zeile vom Server geliefert hat.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tsbridge_protocol::{Befehl, QueryCodec};
use uuid::Uuid;

use crate::backoff::{Backoff, ReconnectKonfig};
use crate::dispatcher::EventDispatcher;
use crate::error::{QueryError, QueryResult};
use crate::verbindung::Verbinder;

/// Puffergroesse des Zeilen-Kanals zwischen Leser und Dispatcher
const ZEILEN_PUFFER: usize = 256;

/// Zustand der Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZustand {
    /// Noch nie verbunden
    Getrennt,
    /// TCP-Verbindung wird aufgebaut
    Verbinden,
    /// Login wird gesendet
    Authentifizieren,
    /// Server-Auswahl und Benachrichtigungs-Registrierung
    Registrieren,
    /// Zeilen werden gelesen und weitergereicht
    Aktiv,
    /// Verbindung verloren, Wartezeit vor dem naechsten Versuch
    Wiederverbinden,
    /// Durch Abbruch beendet
    Beendet,
}

/// Zugangsdaten und Verhalten einer Sitzung
#[derive(Debug, Clone)]
pub struct SessionKonfig {
    pub login: String,
    pub passwort: String,
    /// Virtueller Server fuer `use sid=<n>`
    pub server_id: u32,
    pub reconnect: ReconnectKonfig,
}

impl Default for SessionKonfig {
    fn default() -> Self {
        Self {
            login: "serveradmin".into(),
            passwort: String::new(),
            server_id: 1,
            reconnect: ReconnectKonfig::default(),
        }
    }
}

/// Wie eine einzelne Verbindung geendet hat
enum Verbindungsende {
    /// EOF oder Lesefehler; `produktiv` wenn vorher mindestens eine Zeile kam
    StreamEnde { produktiv: bool },
    Abgebrochen,
    DispatcherWeg,
}

pub struct Sitzung<V: Verbinder> {
    verbinder: V,
    konfig: SessionKonfig,
    zustand: SessionZustand,
    beobachter: Option<mpsc::UnboundedSender<SessionZustand>>,
}

impl<V: Verbinder> Sitzung<V> {
    pub fn neu(verbinder: V, konfig: SessionKonfig) -> Self {
        Self {
            verbinder,
            konfig,
            zustand: SessionZustand::Getrennt,
            beobachter: None,
        }
    }

    /// Meldet jeden Zustandswechsel zusaetzlich an `beobachter`
    pub fn mit_beobachter(mut self, beobachter: mpsc::UnboundedSender<SessionZustand>) -> Self {
        self.beobachter = Some(beobachter);
        self
    }

    pub fn zustand(&self) -> SessionZustand {
        self.zustand
    }

    /// Startet Dispatcher und Supervisor-Schleife.
    ///
    /// Laeuft bis `abbruch` ausgeloest wird (dann `Ok(())`) oder ein fataler
    /// Fehler auftritt. Der Dispatcher lebt ueber alle Reconnects hinweg,
    /// der Nickname-Cache bleibt also erhalten.
    pub async fn starten(
        mut self,
        dispatcher: EventDispatcher,
        abbruch: CancellationToken,
    ) -> QueryResult<()> {
        let (zeilen_tx, zeilen_rx) = mpsc::channel::<String>(ZEILEN_PUFFER);
        let verbraucher = tokio::spawn(dispatcher.laufen(zeilen_rx, abbruch.clone()));

        let ergebnis = self.supervisor(zeilen_tx, &abbruch).await;

        // Sender ist weg: der Dispatcher arbeitet den Rest ab und endet
        if let Err(e) = verbraucher.await {
            tracing::error!(fehler = %e, "Event-Dispatcher-Task abgestuerzt");
        }
        ergebnis
    }

    async fn supervisor(
        &mut self,
        zeilen_tx: mpsc::Sender<String>,
        abbruch: &CancellationToken,
    ) -> QueryResult<()> {
        let mut backoff = Backoff::neu(self.konfig.reconnect.clone());
        let mut war_aktiv = false;

        loop {
            self.uebergang(SessionZustand::Verbinden);
            let verbunden = tokio::select! {
                _ = abbruch.cancelled() => None,
                v = self.verbinder.verbinden() => Some(v),
            };
            let Some(verbunden) = verbunden else {
                self.uebergang(SessionZustand::Beendet);
                return Ok(());
            };

            let stream = match verbunden {
                Ok(stream) => stream,
                Err(e) if !war_aktiv || e.ist_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(fehler = %e, "Verbindungsaufbau fehlgeschlagen");
                    self.uebergang(SessionZustand::Wiederverbinden);
                    if !warten(&mut backoff, abbruch).await {
                        self.uebergang(SessionZustand::Beendet);
                        return Ok(());
                    }
                    continue;
                }
            };

            let span = tracing::info_span!("verbindung", id = %Uuid::new_v4());
            let ende = self
                .verbindung_betreiben(stream, &zeilen_tx, abbruch)
                .instrument(span)
                .await?;

            match ende {
                Verbindungsende::Abgebrochen => {
                    self.uebergang(SessionZustand::Beendet);
                    return Ok(());
                }
                Verbindungsende::DispatcherWeg => {
                    if abbruch.is_cancelled() {
                        self.uebergang(SessionZustand::Beendet);
                        return Ok(());
                    }
                    return Err(QueryError::DispatcherBeendet);
                }
                Verbindungsende::StreamEnde { produktiv } => {
                    // Ein Server, der sofort wieder schliesst, laesst das Backoff wachsen
                    if produktiv {
                        backoff.zuruecksetzen();
                    }
                }
            }

            war_aktiv = true;
            self.uebergang(SessionZustand::Wiederverbinden);
            if !warten(&mut backoff, abbruch).await {
                self.uebergang(SessionZustand::Beendet);
                return Ok(());
            }
        }
    }

    /// Handshake und Leseschleife einer einzelnen Verbindung
    async fn verbindung_betreiben(
        &mut self,
        stream: V::Stream,
        zeilen_tx: &mpsc::Sender<String>,
        abbruch: &CancellationToken,
    ) -> QueryResult<Verbindungsende> {
        let mut framed = Framed::new(stream, QueryCodec::new());
        let [login, use_sid, registrieren] =
            Befehl::handshake(&self.konfig.login, &self.konfig.passwort, self.konfig.server_id);

        self.uebergang(SessionZustand::Authentifizieren);
        senden(&mut framed, &login).await?;

        self.uebergang(SessionZustand::Registrieren);
        senden(&mut framed, &use_sid).await?;
        senden(&mut framed, &registrieren).await?;

        self.uebergang(SessionZustand::Aktiv);
        let mut produktiv = false;
        loop {
            let naechste = tokio::select! {
                _ = abbruch.cancelled() => return Ok(Verbindungsende::Abgebrochen),
                n = framed.next() => n,
            };

            match naechste {
                Some(Ok(zeile)) => {
                    tracing::trace!(zeile = %zeile, "Zeile empfangen");
                    produktiv = true;
                    if zeilen_tx.send(zeile).await.is_err() {
                        return Ok(Verbindungsende::DispatcherWeg);
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(fehler = %e, "Lesefehler, Verbindung wird neu aufgebaut");
                    return Ok(Verbindungsende::StreamEnde { produktiv });
                }
                None => {
                    tracing::warn!(produktiv, "Verbindung vom Server geschlossen");
                    return Ok(Verbindungsende::StreamEnde { produktiv });
                }
            }
        }
    }

    fn uebergang(&mut self, neu: SessionZustand) {
        tracing::debug!(von = ?self.zustand, nach = ?neu, "Zustandswechsel");
        self.zustand = neu;
        if let Some(beobachter) = &self.beobachter {
            let _ = beobachter.send(neu);
        }
    }
}

/// Sendet einen Befehl; das Log zeigt die Zeile vor der Uebertragung
async fn senden<S>(framed: &mut Framed<S, QueryCodec>, befehl: &Befehl) -> QueryResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!(befehl = %befehl.log_zeile(), "Sende");
    framed
        .send(befehl.zeile())
        .await
        .map_err(|quelle| QueryError::Senden {
            befehl: befehl.name().to_string(),
            quelle,
        })
}

/// Wartet die naechste Backoff-Zeit ab. `false` bei Abbruch.
async fn warten(backoff: &mut Backoff, abbruch: &CancellationToken) -> bool {
    let verzoegerung = backoff.naechste_verzoegerung();
    tracing::warn!(
        versuch = backoff.versuche(),
        verzoegerung_ms = verzoegerung.as_millis() as u64,
        "Neuer Verbindungsversuch"
    );
    tokio::select! {
        _ = abbruch.cancelled() => false,
        _ = tokio::time::sleep(verzoegerung) => true,
    }
}
