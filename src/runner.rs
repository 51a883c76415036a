//! Telegram runtime: dispatcher tree and inbound listener.

use crate::bot::handlers::{self, Command};
use crate::bot::transport::TelegramTransport;
use crate::bot::InboundMessage;
use crate::config::Settings;
use crate::extractor::{ExtractionPool, YtDlpExtractor};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

/// Run the bot until Ctrl-C.
///
/// Uses a webhook when `WEBHOOK_URL` is configured, long polling otherwise.
///
/// # Errors
///
/// Returns an error if the webhook URL is invalid or cannot be registered.
pub async fn run_bot(settings: Arc<Settings>) -> anyhow::Result<()> {
    let bot = Bot::new(settings.telegram_token.clone());

    let extractor = Arc::new(YtDlpExtractor::from_settings(&settings));
    let pool = Arc::new(ExtractionPool::new(extractor, settings.extractor_workers));
    info!(
        workers = pool.workers(),
        ytdlp = %settings.ytdlp_path,
        format = %settings.ytdlp_format,
        "Extraction pool initialized."
    );

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let webhook = settings.webhook()?;

    let mut dispatcher = Dispatcher::builder(bot.clone(), setup_handler())
        .dependencies(dptree::deps![pool])
        .enable_ctrlc_handler()
        .build();

    match webhook {
        Some(url) => {
            let mut options = webhooks::Options::new(settings.listen_addr(), url.clone());
            if let Some(secret) = settings.webhook_secret.clone() {
                options = options.secret_token(secret);
            }

            let listener = webhooks::axum(bot, options).await?;
            info!(addr = %settings.listen_addr(), url = %url, "Bot is running (webhook)...");

            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            warn!("WEBHOOK_URL is not set, falling back to long polling");
            info!("Bot is running (polling)...");
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}

/// Build the update routing tree.
///
/// Known commands go to their handlers. Any other text that does not look
/// like a command is a link submission. Everything else is ignored,
/// including commands for other bots and commands this bot does not know.
#[must_use]
pub fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::filter(|msg: Message| is_link_candidate(&msg)).endpoint(handle_text))
}

fn is_link_candidate(msg: &Message) -> bool {
    msg.text().is_some_and(|t| !t.starts_with('/'))
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    let transport = TelegramTransport::new(bot);
    let res = match cmd {
        Command::Start(_) => handlers::start(&transport, msg.chat.id).await,
        Command::Help(_) => handlers::help(&transport, msg.chat.id).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(bot: Bot, msg: Message, pool: Arc<ExtractionPool>) -> ResponseResult<()> {
    let Some(inbound) = InboundMessage::from_message(&msg) else {
        return respond(());
    };
    let transport = TelegramTransport::new(bot);
    let outcome = handlers::handle_link(&transport, &pool, &inbound).await;
    debug!(chat_id = inbound.chat_id.0, ?outcome, "Link request finished");
    respond(())
}
