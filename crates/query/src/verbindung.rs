//! Aufbau der TCP-Verbindung zum ServerQuery-Port
//!
//! Der [`Verbinder`] ist die Naht zwischen Sitzung und Netzwerk: die
//! Sitzung kennt nur einen Byte-Stream, woher er kommt bestimmt der
//! Verbinder. Produktiv ist das [`TcpVerbinder`].

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};

use crate::error::{QueryError, QueryResult};

/// Liefert pro Aufruf einen frischen Byte-Stream zum Server
#[async_trait]
pub trait Verbinder: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn verbinden(&self) -> QueryResult<Self::Stream>;
}

/// TCP-Verbinder mit Keep-Alive
#[derive(Debug, Clone)]
pub struct TcpVerbinder {
    host: String,
    port: u16,
}

impl TcpVerbinder {
    pub fn neu(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn adresse(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Loest die Adresse auf, IPv4 bevorzugt
    async fn aufloesen(&self) -> QueryResult<SocketAddr> {
        let adresse = self.adresse();
        let kandidaten: Vec<SocketAddr> = lookup_host(&adresse)
            .await
            .map_err(|e| QueryError::Adresse {
                adresse: adresse.clone(),
                grund: e.to_string(),
            })?
            .collect();

        kandidaten
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| kandidaten.first())
            .copied()
            .ok_or_else(|| QueryError::Adresse {
                adresse,
                grund: "keine Adresse gefunden".into(),
            })
    }
}

#[async_trait]
impl Verbinder for TcpVerbinder {
    type Stream = TcpStream;

    async fn verbinden(&self) -> QueryResult<TcpStream> {
        let ziel = self.aufloesen().await?;
        tracing::info!(adresse = %self.adresse(), ziel = %ziel, "Verbinde mit ServerQuery");

        let stream = TcpStream::connect(ziel)
            .await
            .map_err(|quelle| QueryError::Verbindungsaufbau {
                ziel: ziel.to_string(),
                quelle,
            })?;
        keepalive_aktivieren(&stream).map_err(QueryError::KeepAlive)?;

        tracing::info!(ziel = %ziel, "TCP-Verbindung hergestellt");
        Ok(stream)
    }
}

fn keepalive_aktivieren(stream: &TcpStream) -> std::io::Result<()> {
    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));
    sock.set_tcp_keepalive(&keepalive)
}
