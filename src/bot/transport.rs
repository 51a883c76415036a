//! Outbound side of the Telegram adapter.
//!
//! Handlers talk to [`ChatTransport`] instead of `Bot` directly, so the
//! request flow can be exercised without a live token.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// One message to send back to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundReply {
    /// Plain text reply
    Text(String),
    /// Video referenced by URL; Telegram fetches it server-side
    Video {
        /// Direct media URL
        url: String,
        /// Caption shown under the video
        caption: String,
    },
}

impl OutboundReply {
    /// Text reply.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Video reply by URL with a caption.
    #[must_use]
    pub fn video(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::Video {
            url: url.into(),
            caption: caption.into(),
        }
    }
}

/// Errors returned when a reply could not be delivered.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The Bot API rejected the request or could not be reached
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    /// The media URL could not be handed to the Bot API
    #[error("invalid media URL {url}: {source}")]
    InvalidMediaUrl {
        /// Offending URL
        url: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },
}

/// Sends replies to chats.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver `reply` to `chat_id`.
    async fn deliver(&self, chat_id: ChatId, reply: OutboundReply) -> Result<(), TransportError>;
}

/// [`ChatTransport`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wrap a bot handle.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn deliver(&self, chat_id: ChatId, reply: OutboundReply) -> Result<(), TransportError> {
        match reply {
            OutboundReply::Text(text) => {
                self.bot.send_message(chat_id, text).await?;
            }
            OutboundReply::Video { url, caption } => {
                let media = Url::parse(&url)
                    .map_err(|source| TransportError::InvalidMediaUrl { url, source })?;
                debug!(chat_id = chat_id.0, "Sending video by URL");
                self.bot
                    .send_video(chat_id, InputFile::url(media))
                    .caption(caption)
                    .supports_streaming(true)
                    .await?;
            }
        }
        Ok(())
    }
}
