//! Integrationstests: Sitzung gegen einen lokalen Fake-ServerQuery-Server

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tsbridge_core::{Aktion, ClientEreignis, EreignisSenke, FesteUhr};
use tsbridge_query::{
    EventDispatcher, QueryError, ReconnectKonfig, SessionKonfig, SessionZustand, Sitzung,
    TcpVerbinder,
};

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

struct KanalSenke(mpsc::UnboundedSender<ClientEreignis>);

#[async_trait]
impl EreignisSenke for KanalSenke {
    async fn zustellen(&self, ereignis: &ClientEreignis) -> tsbridge_core::Result<()> {
        let _ = self.0.send(ereignis.clone());
        Ok(())
    }
}

fn konfig() -> SessionKonfig {
    SessionKonfig {
        login: "serveradmin".into(),
        passwort: "geheim".into(),
        server_id: 1,
        reconnect: ReconnectKonfig {
            initial: Duration::from_millis(10),
            maximum: Duration::from_millis(50),
            faktor: 2.0,
        },
    }
}

fn dispatcher() -> (EventDispatcher, mpsc::UnboundedReceiver<ClientEreignis>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let uhr = FesteUhr::aus_rfc3339("2020-01-01T00:00:00Z").expect("gueltige Zeit");
    (EventDispatcher::neu(Arc::new(KanalSenke(tx)), Arc::new(uhr)), rx)
}

/// Nimmt eine Verbindung an und liest den dreiteiligen Handshake
async fn handshake_annehmen(listener: &TcpListener) -> (BufReader<TcpStream>, Vec<String>) {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut reader = BufReader::new(stream);
    let mut zeilen = Vec::new();
    for _ in 0..3 {
        let mut zeile = String::new();
        reader.read_line(&mut zeile).await.expect("Befehl lesen");
        zeilen.push(zeile.trim_end().to_string());
    }
    (reader, zeilen)
}

async fn schreiben(reader: &mut BufReader<TcpStream>, zeile: &str) {
    let stream = reader.get_mut();
    stream.write_all(zeile.as_bytes()).await.expect("schreiben");
    stream.write_all(b"\n\r").await.expect("schreiben");
}

async fn naechstes<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timeout")
        .expect("Kanal offen")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn handshake_und_ereignis_ende_zu_ende() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (dispatcher, mut ereignisse) = dispatcher();
    let sitzung = Sitzung::neu(TcpVerbinder::neu("127.0.0.1", port), konfig());
    let abbruch = CancellationToken::new();
    let handle = tokio::spawn(sitzung.starten(dispatcher, abbruch.clone()));

    let (mut server, befehle) = handshake_annehmen(&listener).await;
    assert_eq!(
        befehle,
        vec![
            "login client_login_name=serveradmin client_login_password=geheim",
            "use sid=1",
            "servernotifyregister event=server",
        ]
    );

    schreiben(&mut server, "error id=0 msg=ok").await;
    schreiben(
        &mut server,
        "notifycliententerview cfid=0 ctid=1 reasonid=0 clid=9 \
         client_unique_identifier=abc= client_nickname=Bob\\sder\\sBaumeister",
    )
    .await;

    let ereignis = naechstes(&mut ereignisse).await;
    assert_eq!(ereignis.aktion, Aktion::Verbunden);
    assert_eq!(ereignis.client_id.as_str(), "9");
    assert_eq!(ereignis.client_unique_id, "abc=");
    assert_eq!(ereignis.nickname, "Bob der Baumeister");
    assert_eq!(ereignis.empfangen_um.to_rfc3339(), "2020-01-01T00:00:00+00:00");

    abbruch.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn reconnect_behaelt_nickname_cache() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (z_tx, mut zustaende) = mpsc::unbounded_channel();
    let (dispatcher, mut ereignisse) = dispatcher();
    let sitzung =
        Sitzung::neu(TcpVerbinder::neu("127.0.0.1", port), konfig()).mit_beobachter(z_tx);
    let abbruch = CancellationToken::new();
    let handle = tokio::spawn(sitzung.starten(dispatcher, abbruch.clone()));

    // Erste Verbindung: Bob verbindet sich, dann bricht der Server ab
    let (mut server, _) = handshake_annehmen(&listener).await;
    schreiben(&mut server, "notifycliententerview reasonid=0 clid=9 client_nickname=Bob").await;
    let erstes = naechstes(&mut ereignisse).await;
    assert_eq!(erstes.nickname, "Bob");
    drop(server);

    // Zweite Verbindung: Verlassen ohne Nickname
    let (mut server, befehle) = handshake_annehmen(&listener).await;
    assert_eq!(befehle.len(), 3);
    schreiben(&mut server, "notifyclientleftview reasonid=8 clid=9").await;
    let zweites = naechstes(&mut ereignisse).await;
    assert_eq!(zweites.aktion, Aktion::Getrennt);
    assert_eq!(zweites.nickname, "Bob");

    abbruch.cancel();
    handle.await.unwrap().unwrap();

    let mut alle = Vec::new();
    while let Ok(z) = zustaende.try_recv() {
        alle.push(z);
    }
    let verbinden = alle.iter().filter(|z| **z == SessionZustand::Verbinden).count();
    assert_eq!(verbinden, 2);
    assert_eq!(alle.last(), Some(&SessionZustand::Beendet));
    assert!(ereignisse.try_recv().is_err());
}

#[tokio::test]
async fn nach_aktiver_sitzung_wird_weiter_versucht() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (z_tx, mut zustaende) = mpsc::unbounded_channel();
    let (dispatcher, _ereignisse) = dispatcher();
    let sitzung =
        Sitzung::neu(TcpVerbinder::neu("127.0.0.1", port), konfig()).mit_beobachter(z_tx);
    let abbruch = CancellationToken::new();
    let handle = tokio::spawn(sitzung.starten(dispatcher, abbruch.clone()));

    let (server, _) = handshake_annehmen(&listener).await;
    drop(server);
    drop(listener);

    // Mehrere fehlgeschlagene Versuche, die Sitzung bleibt am Leben
    let mut versuche = 0;
    while versuche < 4 {
        if naechstes(&mut zustaende).await == SessionZustand::Verbinden {
            versuche += 1;
        }
    }
    assert!(!handle.is_finished());

    abbruch.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn erster_verbindungsaufbau_ist_fatal() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let (dispatcher, _ereignisse) = dispatcher();
    let sitzung = Sitzung::neu(TcpVerbinder::neu("127.0.0.1", port), konfig());

    let fehler = tokio::time::timeout(
        Duration::from_secs(5),
        sitzung.starten(dispatcher, CancellationToken::new()),
    )
    .await
    .expect("Timeout")
    .unwrap_err();
    assert!(matches!(fehler, QueryError::Verbindungsaufbau { .. }));
}
