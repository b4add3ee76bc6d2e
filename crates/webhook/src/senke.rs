//! HTTP-Senke fuer Client-Ereignisse

use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use tsbridge_core::{ClientEreignis, EreignisSenke};

use crate::error::{WebhookError, WebhookResult};
use crate::render::Nutzlast;

/// Standard-Timeout einer Zustellung
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sendet jedes Ereignis als `{"content": ...}` per POST an eine URL
pub struct WebhookSenke {
    client: reqwest::Client,
    url: String,
    zeitzone: Tz,
}

impl WebhookSenke {
    pub fn neu(url: impl Into<String>, zeitzone: Tz, timeout: Duration) -> WebhookResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            zeitzone,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stellt ein Ereignis zu. Nicht-2xx-Antworten sind ein Fehler.
    pub async fn senden(&self, ereignis: &ClientEreignis) -> WebhookResult<()> {
        let nutzlast = Nutzlast::fuer(ereignis, self.zeitzone);
        tracing::info!(url = %self.url, inhalt = %nutzlast.content, "Webhook-Anfrage");

        let antwort = self.client.post(&self.url).json(&nutzlast).send().await?;
        let status = antwort.status();
        let body = match antwort.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    status = status.as_u16(),
                    fehler = %e,
                    "Webhook-Antwort nicht lesbar, Body wird verworfen"
                );
                String::new()
            }
        };
        tracing::debug!(status = status.as_u16(), body = %body, "Webhook-Antwort");

        if !status.is_success() {
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EreignisSenke for WebhookSenke {
    async fn zustellen(&self, ereignis: &ClientEreignis) -> tsbridge_core::Result<()> {
        self.senden(ereignis).await.map_err(Into::into)
    }
}
