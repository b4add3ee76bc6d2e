//! Ausgehende Befehle und Befehlsantworten (ServerQuery-Stil)
//!
//! Befehle haben das Format:
//!   befehlsname key1=value1 key2=value2
//!
//! Sonderzeichen in Werten werden mit Backslash escaped:
//!   \s = Leerzeichen, \p = Pipe, \/ = Slash, \\ = Backslash, \n = Newline
//!
//! Jeder Befehl wird vom Server mit `error id=N msg=...` beantwortet.

use std::fmt;

/// Die Befehle die die Bridge sendet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Befehl {
    /// `login client_login_name=<user> client_login_password=<pass>`
    Login { name: String, passwort: String },
    /// `use sid=<n>`
    Use { server_id: u32 },
    /// `servernotifyregister event=server`
    ServerNotifyRegister,
}

impl Befehl {
    /// Befehlsname
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Use { .. } => "use",
            Self::ServerNotifyRegister => "servernotifyregister",
        }
    }

    /// Die Zeile wie sie uebertragen wird (ohne Zeilenende)
    pub fn zeile(&self) -> String {
        match self {
            Self::Login { name, passwort } => format!(
                "login client_login_name={} client_login_password={}",
                encode_value(name),
                encode_value(passwort)
            ),
            Self::Use { server_id } => format!("use sid={server_id}"),
            Self::ServerNotifyRegister => "servernotifyregister event=server".to_string(),
        }
    }

    /// Die Zeile fuer das Log, Passwoerter maskiert
    pub fn log_zeile(&self) -> String {
        match self {
            Self::Login { name, .. } => format!(
                "login client_login_name={} client_login_password=***",
                encode_value(name)
            ),
            other => other.zeile(),
        }
    }

    /// Die Befehlsfolge fuer Anmeldung und Registrierung
    pub fn handshake(name: &str, passwort: &str, server_id: u32) -> [Befehl; 3] {
        [
            Self::Login {
                name: name.to_string(),
                passwort: passwort.to_string(),
            },
            Self::Use { server_id },
            Self::ServerNotifyRegister,
        ]
    }
}

impl fmt::Display for Befehl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_zeile())
    }
}

/// Antwort des Servers auf einen Befehl: `error id=N msg=...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Antwort {
    pub id: u32,
    pub nachricht: String,
}

impl Antwort {
    /// Parst eine Antwortzeile. `None` wenn die Zeile keine Antwort ist
    /// (z.B. Begruessung oder Benachrichtigung).
    pub fn parsen(zeile: &str) -> Option<Self> {
        let mut tokens = zeile.split_whitespace();
        if tokens.next()? != "error" {
            return None;
        }

        let mut id = None;
        let mut nachricht = String::new();
        for token in tokens {
            match token.split_once('=') {
                Some(("id", wert)) => id = wert.parse().ok(),
                Some(("msg", wert)) => nachricht = decode_value(wert),
                _ => {}
            }
        }

        Some(Self { id: id?, nachricht })
    }

    pub fn ist_ok(&self) -> bool {
        self.id == 0
    }
}

/// Dekodiert Escape-Sequenzen in einem Wert-String
pub fn decode_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('s') => result.push(' '),
                Some('p') => result.push('|'),
                Some('/') => result.push('/'),
                Some('\\') => result.push('\\'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('a') => result.push('\x07'),
                Some('b') => result.push('\x08'),
                Some('f') => result.push('\x0C'),
                Some('v') => result.push('\x0B'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Kodiert einen Wert fuer die Ausgabe (Escape-Sequenzen einfuegen)
pub fn encode_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '/' => result.push_str("\\/"),
            ' ' => result.push_str("\\s"),
            '|' => result.push_str("\\p"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x07' => result.push_str("\\a"),
            '\x08' => result.push_str("\\b"),
            '\x0C' => result.push_str("\\f"),
            '\x0B' => result.push_str("\\v"),
            other => result.push(other),
        }
    }
    result
}
