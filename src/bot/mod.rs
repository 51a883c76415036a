/// Command and link handlers
pub mod handlers;
/// Outbound reply transport
pub mod transport;

use teloxide::types::{ChatId, Message};

/// A text message received from a chat, as seen by the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the reply goes to
    pub chat_id: ChatId,
    /// Raw message text
    pub text: String,
}

impl InboundMessage {
    /// Create an inbound message.
    #[must_use]
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }

    /// Extract the chat and text from a Telegram message.
    ///
    /// Returns `None` for messages without text (photos, stickers, ...).
    #[must_use]
    pub fn from_message(msg: &Message) -> Option<Self> {
        msg.text().map(|text| Self::new(msg.chat.id, text))
    }
}
