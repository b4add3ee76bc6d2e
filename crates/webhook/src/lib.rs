//! tsbridge-webhook – Ausgangs-Senke
//!
//! Rendert [`tsbridge_core::ClientEreignis`] als Chat-Zeile und stellt sie
//! per HTTP POST an einen Webhook zu.

pub mod error;
pub mod render;
pub mod senke;

pub use error::{WebhookError, WebhookResult};
pub use render::{nachricht_rendern, zeitzone_parsen, Nutzlast};
pub use senke::{WebhookSenke, DEFAULT_TIMEOUT};
