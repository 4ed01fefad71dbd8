use crate::channels::MessageChannel;
use crate::models::{ChannelKind, DeliveryResult, Signal};

/// One channel client plus its configured destinations. The client is
/// optional: an unconfigured channel is recorded as a descriptive delivery
/// error, never a crash.
#[derive(Debug, Clone)]
pub struct ChannelBinding<C> {
    pub client: Option<C>,
    pub destinations: Vec<String>,
}

impl<C> ChannelBinding<C> {
    pub fn new(client: Option<C>, destinations: Vec<String>) -> Self {
        Self {
            client,
            destinations,
        }
    }

    pub fn disabled() -> Self {
        Self {
            client: None,
            destinations: Vec::new(),
        }
    }
}

/// Delivers one rendered signal to every destination across both channel
/// kinds, isolating failures per channel and per destination.
#[derive(Debug, Clone)]
pub struct DispatchFanout<W, T> {
    pub whatsapp: ChannelBinding<W>,
    pub telegram: ChannelBinding<T>,
}

impl<W: MessageChannel, T: MessageChannel> DispatchFanout<W, T> {
    pub fn new(whatsapp: ChannelBinding<W>, telegram: ChannelBinding<T>) -> Self {
        Self { whatsapp, telegram }
    }

    /// True if at least one channel kind is configured and connected.
    pub async fn any_ready(&self) -> bool {
        if let Some(client) = &self.whatsapp.client {
            if !self.whatsapp.destinations.is_empty() && client.is_ready().await {
                return true;
            }
        }
        if let Some(client) = &self.telegram.client {
            if !self.telegram.destinations.is_empty() && client.is_ready().await {
                return true;
            }
        }
        false
    }

    /// Fan one signal out. The two channel kinds are issued concurrently and
    /// awaited jointly; within a kind, destinations are attempted in order
    /// and one destination's failure does not block the rest.
    pub async fn deliver(
        &self,
        signal: &Signal,
        whatsapp_text: &str,
        telegram_text: &str,
    ) -> DeliveryResult {
        let image = signal.image_ref.as_deref();

        let (whatsapp, telegram) = tokio::join!(
            send_to_kind(&self.whatsapp, ChannelKind::WhatsApp, whatsapp_text, image),
            send_to_kind(&self.telegram, ChannelKind::Telegram, telegram_text, image),
        );

        let mut errors = whatsapp.1;
        errors.extend(telegram.1);

        DeliveryResult {
            sent_whatsapp: whatsapp.0,
            sent_telegram: telegram.0,
            errors,
        }
    }
}

/// Attempt all destinations of one channel kind. Returns whether at least
/// one destination accepted the message, plus the per-destination errors.
async fn send_to_kind<C: MessageChannel>(
    binding: &ChannelBinding<C>,
    kind: ChannelKind,
    text: &str,
    image: Option<&str>,
) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    let Some(client) = &binding.client else {
        errors.push(format!("{kind}: not configured"));
        return (false, errors);
    };
    if binding.destinations.is_empty() {
        errors.push(format!("{kind}: no destinations configured"));
        return (false, errors);
    }
    if !client.is_ready().await {
        errors.push(format!("{kind}: client not connected"));
        return (false, errors);
    }

    let mut sent = false;
    for destination in &binding.destinations {
        match client.send(destination, text, image).await {
            Ok(true) => sent = true,
            Ok(false) => {
                errors.push(format!("{kind}: delivery to {destination} failed"));
            }
            Err(e) => {
                errors.push(format!("{kind}: error sending to {destination}: {e}"));
            }
        }
    }

    (sent, errors)
}
