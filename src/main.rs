use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{prelude::*, EnvFilter};
use video_link_bot::config::Settings;
use video_link_bot::runner::run_bot;

/// Regex patterns for masking the bot token in log output
struct RedactionPatterns {
    api_url: Regex,
    bare_token: Regex,
    bot_prefixed: Regex,
}

impl RedactionPatterns {
    /// Compile all patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            api_url: Regex::new(r"(https?://[^/]+/(?:file/)?bot)([0-9]+:[A-Za-z0-9_-]+)(/|\s|$)")?,
            bare_token: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            bot_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let output = self
            .api_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        let output = self
            .bare_token
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        self.bot_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string()
    }
}

/// Masks tokens in everything written through it.
struct Masked<'a, W> {
    inner: W,
    patterns: &'a RedactionPatterns,
}

impl<W: Write> Write for Masked<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inner.write_all(self.patterns.redact(&text).as_bytes())?;
        // Callers track progress against their own buffer.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Log sink: locked stderr, one lock per event.
struct MaskedStderr {
    patterns: RedactionPatterns,
}

impl<'a> MakeWriter<'a> for MaskedStderr {
    type Writer = Masked<'a, io::StderrLock<'static>>;

    fn make_writer(&'a self) -> Self::Writer {
        Masked {
            inner: io::stderr().lock(),
            patterns: &self.patterns,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Compile redaction patterns before anything can be logged
    let patterns = RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?;

    init_logging(patterns);

    info!("Starting Video Link Bot...");

    let settings = init_settings();

    if let Err(e) = run_bot(settings).await {
        error!("Bot stopped with error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(patterns: RedactionPatterns) {
    let sink = MaskedStderr { patterns };

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("video_link_bot=info,teloxide=warn,hyper=warn,reqwest=warn")
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(sink))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!(
                port = s.port,
                webhook = s.webhook_url.is_some(),
                "Configuration loaded successfully."
            );
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
