pub mod render;
pub mod telegram;
pub mod whatsapp;

pub use telegram::TelegramChannel;
pub use whatsapp::WhatsAppChannel;

use std::future::Future;

use crate::models::ChannelKind;

/// An outbound messaging client.
///
/// `send` returns `Ok(false)` on ordinary delivery failure (disconnected
/// session, rejected message) and reserves `Err` for conditions the caller
/// should log as unexpected. Implementations must tolerate being called
/// every few minutes indefinitely.
pub trait MessageChannel: Send + Sync + 'static {
    fn kind(&self) -> ChannelKind;

    fn is_ready(&self) -> impl Future<Output = bool> + Send;

    fn send(
        &self,
        destination: &str,
        text: &str,
        image: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}
