//! Command and link handlers.
//!
//! Every handler answers through a [`ChatTransport`]. Per-request faults end
//! here: they are logged and turned into a text reply, never propagated.

use crate::bot::transport::{ChatTransport, OutboundReply, TransportError};
use crate::bot::InboundMessage;
use crate::extractor::{Extraction, ExtractionPool, FailureKind};
use crate::parser::find_first_url;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

/// Reply to `/start`
pub const GREETING_TEXT: &str =
    "Hi! Send me a link to a video, and I'll try to fetch it for you.";
/// Reply to `/help`
pub const HELP_TEXT: &str = "Just send me a video link. That's it!";
/// Reply when the message has no link
pub const NO_URL_TEXT: &str = "I didn't find a URL in your message. Please send a valid link.";
/// Acknowledgement sent before extraction starts
pub const FETCHING_TEXT: &str = "Got it! Fetching the video, please wait...";
/// Caption attached to the delivered video
pub const VIDEO_CAPTION: &str = "Here's your video!";
/// Reply when the extractor found no media URL
pub const EXTRACTION_FAILED_TEXT: &str =
    "Sorry, I couldn't get a downloadable link for that video.";
/// Reply when Telegram refused the resolved video
pub const DELIVERY_FAILED_TEXT: &str = "Sorry, I found the video but failed to send it. \
     The file might be too large for Telegram (max 50MB for bots by URL).";

/// Supported bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Greeting; trailing arguments are ignored
    #[command(description = "Start using the bot.")]
    Start(String),
    /// Usage text; trailing arguments are ignored
    #[command(description = "How to use the bot.")]
    Help(String),
}

/// How a link request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The message had no link
    NoUrl,
    /// The video was sent
    Delivered,
    /// Extraction worked but Telegram refused the video
    DeliveryFailed,
    /// The extractor produced no media URL
    ExtractionFailed(FailureKind),
}

/// Send a text reply, logging instead of propagating failures.
async fn send_text(transport: &dyn ChatTransport, chat_id: ChatId, text: &str) {
    if let Err(e) = transport.deliver(chat_id, OutboundReply::text(text)).await {
        error!(chat_id = chat_id.0, error = %e, "Failed to send text reply");
    }
}

/// Handle `/start`.
///
/// # Errors
///
/// Returns the transport error if the greeting could not be sent.
pub async fn start(transport: &dyn ChatTransport, chat_id: ChatId) -> Result<(), TransportError> {
    transport
        .deliver(chat_id, OutboundReply::text(GREETING_TEXT))
        .await
}

/// Handle `/help`.
///
/// # Errors
///
/// Returns the transport error if the usage text could not be sent.
pub async fn help(transport: &dyn ChatTransport, chat_id: ChatId) -> Result<(), TransportError> {
    transport
        .deliver(chat_id, OutboundReply::text(HELP_TEXT))
        .await
}

/// Handle a plain text message as a link submission.
///
/// 1. Finds the first link; without one, replies [`NO_URL_TEXT`] and stops.
/// 2. Acknowledges with [`FETCHING_TEXT`].
/// 3. Resolves the link on the extraction pool.
/// 4. Sends the video by URL, or explains why it could not.
///
/// Nothing is retried. The function always returns normally.
pub async fn handle_link(
    transport: &dyn ChatTransport,
    extractor: &ExtractionPool,
    message: &InboundMessage,
) -> HandleOutcome {
    let chat_id = message.chat_id;

    let Some(url) = find_first_url(&message.text) else {
        debug!(chat_id = chat_id.0, "No URL in message");
        send_text(transport, chat_id, NO_URL_TEXT).await;
        return HandleOutcome::NoUrl;
    };

    info!(chat_id = chat_id.0, url = %url, "Link received");
    send_text(transport, chat_id, FETCHING_TEXT).await;

    match extractor.extract(url).await {
        Extraction::Resolved(media_url) => {
            let reply = OutboundReply::video(media_url, VIDEO_CAPTION);
            match transport.deliver(chat_id, reply).await {
                Ok(()) => {
                    info!(chat_id = chat_id.0, url = %url, "Video delivered");
                    HandleOutcome::Delivered
                }
                Err(e) => {
                    warn!(chat_id = chat_id.0, url = %url, error = %e, "Telegram send_video error");
                    send_text(transport, chat_id, DELIVERY_FAILED_TEXT).await;
                    HandleOutcome::DeliveryFailed
                }
            }
        }
        Extraction::Failed(failure) => {
            warn!(
                chat_id = chat_id.0,
                url = %url,
                kind = %failure.kind,
                detail = %failure.detail,
                "Extraction failed"
            );
            send_text(transport, chat_id, EXTRACTION_FAILED_TEXT).await;
            HandleOutcome::ExtractionFailed(failure.kind)
        }
    }
}
