//! Fehlertypen der Webhook-Senke

use thiserror::Error;

/// Fehler bei Darstellung oder Zustellung einer Nachricht
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Unbekannte Zeitzone '{0}'")]
    Zeitzone(String),

    #[error("HTTP-Anfrage fehlgeschlagen: {0}")]
    Anfrage(#[from] reqwest::Error),

    #[error("Webhook antwortete mit Status {status}: {body}")]
    Status { status: u16, body: String },
}

pub type WebhookResult<T> = std::result::Result<T, WebhookError>;

impl From<WebhookError> for tsbridge_core::BridgeError {
    fn from(e: WebhookError) -> Self {
        tsbridge_core::BridgeError::Zustellung(e.to_string())
    }
}
