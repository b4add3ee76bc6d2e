//! Wire-Format der ServerQuery-Verbindung
//!
//! Zeilenbasiertes Textprotokoll. Der Server terminiert jede Zeile mit
//! `"\n\r"`, also in umgekehrter Reihenfolge zum ueblichen `"\r\n"`. Das ist
//! eine Eigenheit des Protokolls und wird hier genau so erwartet.
//!
//! ## Zeilen-Format
//!
//! ```text
//! notifycliententerview cfid=0 ctid=1 reasonid=0 clid=9 ...\n\r
//! error id=0 msg=ok\n\r
//! ```
//!
//! Ausgehende Befehle werden mit einem einzelnen `"\n"` abgeschlossen.

use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Zeilenende eingehender Zeilen
pub const ZEILENENDE: &[u8] = b"\n\r";

/// Zeilenende ausgehender Befehle
pub const BEFEHLSENDE: &[u8] = b"\n";

/// Standard-maximale Zeilenlaenge (64 KB)
pub const DEFAULT_MAX_ZEILENLAENGE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Reiner Zeilen-Framer
// ---------------------------------------------------------------------------

/// Ergebnis eines Framing-Schritts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing<'a> {
    /// Eine vollstaendige Zeile; `verbraucht` schliesst das Zeilenende ein
    Zeile { verbraucht: usize, zeile: &'a [u8] },
    /// Noch keine vollstaendige Zeile im Buffer
    MehrDaten,
    /// Stream erschoepft und Buffer leer
    Ende,
}

impl Framing<'_> {
    /// Anzahl der verbrauchten Bytes (0 ausser bei `Zeile`)
    pub fn verbraucht(&self) -> usize {
        match self {
            Framing::Zeile { verbraucht, .. } => *verbraucht,
            _ => 0,
        }
    }
}

/// Liefert die naechste Zeile aus `buf`.
///
/// `eof` gibt an, ob der zugrundeliegende Stream erschoepft ist. Bei `eof`
/// wird ein nicht-leerer Rest ohne Zeilenende als letzte Zeile geliefert.
/// Die Funktion haengt nur von ihren Argumenten ab.
pub fn naechste_zeile(buf: &[u8], eof: bool) -> Framing<'_> {
    if eof && buf.is_empty() {
        return Framing::Ende;
    }
    if let Some(i) = buf.windows(ZEILENENDE.len()).position(|w| w == ZEILENENDE) {
        return Framing::Zeile {
            verbraucht: i + ZEILENENDE.len(),
            zeile: &buf[..i],
        };
    }
    if eof {
        return Framing::Zeile {
            verbraucht: buf.len(),
            zeile: buf,
        };
    }
    Framing::MehrDaten
}

// ---------------------------------------------------------------------------
// QueryCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer ServerQuery-Verbindungen
///
/// `decode`/`decode_eof` delegieren an [`naechste_zeile`]. Ungueltiges UTF-8
/// wird verlustbehaftet ersetzt.
#[derive(Debug, Clone)]
pub struct QueryCodec {
    /// Maximale Laenge einer Zeile ohne Zeilenende
    max_zeilenlaenge: usize,
}

impl QueryCodec {
    /// Erstellt einen neuen `QueryCodec` mit Standard-Limit
    pub fn new() -> Self {
        Self {
            max_zeilenlaenge: DEFAULT_MAX_ZEILENLAENGE,
        }
    }

    /// Erstellt einen `QueryCodec` mit benutzerdefinierter maximaler Zeilenlaenge
    pub fn with_max_zeilenlaenge(max_zeilenlaenge: usize) -> Self {
        Self { max_zeilenlaenge }
    }

    pub fn max_zeilenlaenge(&self) -> usize {
        self.max_zeilenlaenge
    }

    fn zeile_entnehmen(
        &self,
        src: &mut BytesMut,
        eof: bool,
    ) -> Result<Option<String>, io::Error> {
        let (verbraucht, laenge) = match naechste_zeile(src, eof) {
            Framing::Zeile { verbraucht, zeile } => (verbraucht, zeile.len()),
            Framing::MehrDaten => {
                if src.len() > self.max_zeilenlaenge {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "Zeile zu lang: {} Bytes ohne Zeilenende (Maximum: {} Bytes)",
                            src.len(),
                            self.max_zeilenlaenge
                        ),
                    ));
                }
                return Ok(None);
            }
            Framing::Ende => return Ok(None),
        };

        let bytes = src.split_to(verbraucht);
        Ok(Some(String::from_utf8_lossy(&bytes[..laenge]).into_owned()))
    }
}

impl Default for QueryCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for QueryCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.zeile_entnehmen(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.zeile_entnehmen(src, true)
    }
}

impl<T: AsRef<str>> Encoder<T> for QueryCodec {
    type Error = io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let zeile = item.as_ref();
        if zeile.contains('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Befehl darf keinen Zeilenumbruch enthalten",
            ));
        }
        dst.reserve(zeile.len() + BEFEHLSENDE.len());
        dst.put_slice(zeile.as_bytes());
        dst.put_slice(BEFEHLSENDE);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Laesst den Framer bis zur Erschoepfung laufen
    fn alle_zeilen(daten: &[u8]) -> Vec<Vec<u8>> {
        let mut rest = daten;
        let mut zeilen = Vec::new();
        loop {
            match naechste_zeile(rest, false) {
                Framing::Zeile { verbraucht, zeile } => {
                    zeilen.push(zeile.to_vec());
                    rest = &rest[verbraucht..];
                }
                Framing::MehrDaten => break,
                Framing::Ende => unreachable!("ohne eof gibt es kein Ende"),
            }
        }
        loop {
            match naechste_zeile(rest, true) {
                Framing::Zeile { verbraucht, zeile } => {
                    zeilen.push(zeile.to_vec());
                    rest = &rest[verbraucht..];
                }
                Framing::Ende => break,
                Framing::MehrDaten => unreachable!("bei eof gibt es kein MehrDaten"),
            }
        }
        zeilen
    }

    #[test]
    fn framer_segmente_in_reihenfolge() {
        let zeilen = alle_zeilen(b"TS3\n\rWelcome\n\rerror id=0 msg=ok\n\r");
        assert_eq!(
            zeilen,
            vec![b"TS3".to_vec(), b"Welcome".to_vec(), b"error id=0 msg=ok".to_vec()]
        );
    }

    #[test]
    fn framer_rest_als_letzte_zeile_bei_eof() {
        let zeilen = alle_zeilen(b"eins\n\rzwei");
        assert_eq!(zeilen, vec![b"eins".to_vec(), b"zwei".to_vec()]);
    }

    #[test]
    fn framer_leerer_stream() {
        assert_eq!(naechste_zeile(b"", true), Framing::Ende);
        assert_eq!(naechste_zeile(b"", false), Framing::MehrDaten);
        assert!(alle_zeilen(b"").is_empty());
    }

    #[test]
    fn framer_crlf_ist_kein_zeilenende() {
        // "\r\n" ist hier KEIN Zeilenende
        assert_eq!(naechste_zeile(b"abc\r\n", false), Framing::MehrDaten);
        assert_eq!(
            naechste_zeile(b"abc\r\n", true),
            Framing::Zeile { verbraucht: 5, zeile: b"abc\r\n" }
        );
    }

    #[test]
    fn framer_leere_zeile() {
        let f = naechste_zeile(b"\n\rx", false);
        assert_eq!(f, Framing::Zeile { verbraucht: 2, zeile: b"" });
        assert_eq!(f.verbraucht(), 2);
    }

    #[test]
    fn framer_halbes_zeilenende() {
        assert_eq!(naechste_zeile(b"abc\n", false), Framing::MehrDaten);
        assert_eq!(naechste_zeile(b"abc\n", false).verbraucht(), 0);
    }

    #[test]
    fn codec_dekodiert_zeilen_stueckweise() {
        let mut codec = QueryCodec::new();
        let mut buf = BytesMut::from(&b"notifyclientleftview clid=3"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b" reasonid=8\n\rerror id=0");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("notifyclientleftview clid=3 reasonid=8")
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        // Rest bei Stream-Ende
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("error id=0"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn codec_ersetzt_ungueltiges_utf8() {
        let mut codec = QueryCodec::new();
        let mut buf = BytesMut::from(&b"nick=\xff\n\r"[..]);
        let zeile = codec.decode(&mut buf).unwrap().unwrap();
        assert!(zeile.starts_with("nick="));
        assert!(zeile.contains('\u{FFFD}'));
    }

    #[test]
    fn codec_ablehnung_zu_lange_zeile() {
        let mut codec = QueryCodec::with_max_zeilenlaenge(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        assert!(codec.decode(&mut buf).is_err());
        assert_eq!(codec.max_zeilenlaenge(), 8);
    }

    #[test]
    fn codec_kodiert_befehl_mit_newline() {
        let mut codec = QueryCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("use sid=1", &mut buf).unwrap();
        assert_eq!(&buf[..], b"use sid=1\n");
    }

    #[test]
    fn codec_ablehnung_befehl_mit_zeilenumbruch() {
        let mut codec = QueryCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.encode("quit\nlogin", &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn framed_liest_bis_stream_ende() {
        use futures_util::StreamExt;
        use tokio_util::codec::FramedRead;

        let daten: &[u8] = b"TS3\n\rnotifycliententerview clid=1\n\rrest";
        let mut framed = FramedRead::new(daten, QueryCodec::new());

        let mut zeilen = Vec::new();
        while let Some(zeile) = framed.next().await {
            zeilen.push(zeile.unwrap());
        }
        assert_eq!(zeilen, vec!["TS3", "notifycliententerview clid=1", "rest"]);
    }

    #[test]
    fn codec_zeilenende_ueber_zwei_lesevorgaenge() {
        let mut codec = QueryCodec::new();
        let mut buf = BytesMut::from(&b"abc\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"\r");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("abc"));
        assert!(buf.is_empty());
    }

    mod eigenschaften {
        use super::*;
        use proptest::prelude::*;

        fn segment() -> impl Strategy<Value = String> {
            "[a-z= \n\r]{0,12}".prop_filter("ohne Zeilenende", |s| !s.contains("\n\r"))
        }

        fn erwartet(segmente: &[String], rest: &str) -> Vec<String> {
            let mut zeilen = segmente.to_vec();
            if !rest.is_empty() {
                zeilen.push(rest.to_string());
            }
            zeilen
        }

        fn stream(segmente: &[String], rest: &str) -> Vec<u8> {
            let mut daten = Vec::new();
            for s in segmente {
                daten.extend_from_slice(s.as_bytes());
                daten.extend_from_slice(ZEILENENDE);
            }
            daten.extend_from_slice(rest.as_bytes());
            daten
        }

        proptest! {
            #[test]
            fn framer_liefert_genau_segmente_und_rest(
                segmente in prop::collection::vec(segment(), 0..8),
                rest in segment(),
            ) {
                let zeilen: Vec<String> = alle_zeilen(&stream(&segmente, &rest))
                    .into_iter()
                    .map(|z| String::from_utf8(z).unwrap())
                    .collect();
                prop_assert_eq!(zeilen, erwartet(&segmente, &rest));
            }

            #[test]
            fn codec_unabhaengig_von_stueckelung(
                segmente in prop::collection::vec(segment(), 0..8),
                rest in segment(),
                stueck in 1usize..8,
            ) {
                let mut codec = QueryCodec::new();
                let mut buf = BytesMut::new();
                let mut zeilen = Vec::new();

                for teil in stream(&segmente, &rest).chunks(stueck) {
                    buf.extend_from_slice(teil);
                    while let Some(z) = codec.decode(&mut buf).unwrap() {
                        zeilen.push(z);
                    }
                }
                while let Some(z) = codec.decode_eof(&mut buf).unwrap() {
                    zeilen.push(z);
                }
                prop_assert_eq!(zeilen, erwartet(&segmente, &rest));
            }
        }
    }
}
