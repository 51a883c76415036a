use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teloxide::types::{ChatId, Message, Update, UpdateKind};
use teloxide::{ApiError, RequestError};
use video_link_bot::bot::handlers::{
    self, HandleOutcome, DELIVERY_FAILED_TEXT, EXTRACTION_FAILED_TEXT, FETCHING_TEXT,
    GREETING_TEXT, HELP_TEXT, NO_URL_TEXT, VIDEO_CAPTION,
};
use video_link_bot::bot::transport::{ChatTransport, OutboundReply, TransportError};
use video_link_bot::bot::InboundMessage;
use video_link_bot::extractor::{Extraction, ExtractionPool, FailureKind, LinkExtractor};

/// Records every delivery; can be told to reject videos or everything.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(ChatId, OutboundReply)>>,
    reject_video: bool,
    reject_all: bool,
}

impl RecordingTransport {
    fn rejecting_video() -> Self {
        Self {
            reject_video: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(ChatId, OutboundReply)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn sent_to(&self, chat_id: ChatId) -> Vec<OutboundReply> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, reply)| reply)
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn deliver(&self, chat_id: ChatId, reply: OutboundReply) -> Result<(), TransportError> {
        let is_video = matches!(reply, OutboundReply::Video { .. });
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((chat_id, reply));
        }
        if self.reject_all || (is_video && self.reject_video) {
            return Err(TransportError::Telegram(RequestError::Api(ApiError::Unknown(
                "Bad Request: file is too big".to_string(),
            ))));
        }
        Ok(())
    }
}

/// Resolves `https://ok.test/<id>` to `https://cdn.test/<id>.mp4`, fails otherwise.
struct HostExtractor {
    calls: AtomicUsize,
    delay: Duration,
}

impl HostExtractor {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }
}

impl LinkExtractor for HostExtractor {
    fn extract(&self, url: &str) -> Extraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        match url.strip_prefix("https://ok.test/") {
            Some(id) => Extraction::Resolved(format!("https://cdn.test/{id}.mp4")),
            None => Extraction::failed(FailureKind::Unsupported, format!("Unsupported URL: {url}")),
        }
    }
}

fn pool(extractor: Arc<HostExtractor>) -> ExtractionPool {
    ExtractionPool::new(extractor, 4)
}

#[tokio::test]
async fn test_message_without_url_gets_single_reply() {
    let extractor = Arc::new(HostExtractor::new(Duration::ZERO));
    let transport = RecordingTransport::default();

    let outcome = handlers::handle_link(
        &transport,
        &pool(extractor.clone()),
        &InboundMessage::new(ChatId(1), "hello there"),
    )
    .await;

    assert_eq!(outcome, HandleOutcome::NoUrl);
    assert_eq!(transport.sent(), vec![(ChatId(1), OutboundReply::text(NO_URL_TEXT))]);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extraction_failure_sequence() {
    let extractor = Arc::new(HostExtractor::new(Duration::ZERO));
    let transport = RecordingTransport::default();

    let outcome = handlers::handle_link(
        &transport,
        &pool(extractor.clone()),
        &InboundMessage::new(ChatId(2), "try https://unknown.test/v please"),
    )
    .await;

    assert_eq!(outcome, HandleOutcome::ExtractionFailed(FailureKind::Unsupported));
    assert_eq!(
        transport.sent_to(ChatId(2)),
        vec![
            OutboundReply::text(FETCHING_TEXT),
            OutboundReply::text(EXTRACTION_FAILED_TEXT),
        ]
    );
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_success_sequence_uses_first_url() {
    let extractor = Arc::new(HostExtractor::new(Duration::ZERO));
    let transport = RecordingTransport::default();

    let outcome = handlers::handle_link(
        &transport,
        &pool(extractor),
        &InboundMessage::new(ChatId(3), "check this out https://ok.test/a and https://ok.test/b"),
    )
    .await;

    assert_eq!(outcome, HandleOutcome::Delivered);
    assert_eq!(
        transport.sent_to(ChatId(3)),
        vec![
            OutboundReply::text(FETCHING_TEXT),
            OutboundReply::video("https://cdn.test/a.mp4", VIDEO_CAPTION),
        ]
    );
}

#[tokio::test]
async fn test_rejected_video_is_explained_not_retried() {
    let extractor = Arc::new(HostExtractor::new(Duration::ZERO));
    let transport = RecordingTransport::rejecting_video();

    let outcome = handlers::handle_link(
        &transport,
        &pool(extractor.clone()),
        &InboundMessage::new(ChatId(4), "https://ok.test/huge"),
    )
    .await;

    assert_eq!(outcome, HandleOutcome::DeliveryFailed);
    assert_eq!(
        transport.sent_to(ChatId(4)),
        vec![
            OutboundReply::text(FETCHING_TEXT),
            OutboundReply::video("https://cdn.test/huge.mp4", VIDEO_CAPTION),
            OutboundReply::text(DELIVERY_FAILED_TEXT),
        ]
    );
    // Only one extraction, no second attempt at another quality.
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_survives_broken_transport() {
    let extractor = Arc::new(HostExtractor::new(Duration::ZERO));
    let transport = RecordingTransport {
        reject_all: true,
        ..RecordingTransport::default()
    };

    let outcome = handlers::handle_link(
        &transport,
        &pool(extractor),
        &InboundMessage::new(ChatId(5), "https://ok.test/x"),
    )
    .await;

    assert_eq!(outcome, HandleOutcome::DeliveryFailed);
    assert_eq!(transport.sent_to(ChatId(5)).len(), 3);
}

#[tokio::test]
async fn test_successful_deliveries_stay_between_one_and_two() {
    let inputs = [
        "",
        "no links here",
        "https://ok.test/1",
        "https://bad.test/1",
        "text http://ok.test/2 more",
        "ftp://ok.test/3",
    ];

    for (i, text) in inputs.into_iter().enumerate() {
        let extractor = Arc::new(HostExtractor::new(Duration::ZERO));
        let transport = RecordingTransport::default();
        let chat_id = ChatId(100 + i64::try_from(i).unwrap_or_default());

        handlers::handle_link(&transport, &pool(extractor), &InboundMessage::new(chat_id, text))
            .await;

        let count = transport.sent_to(chat_id).len();
        assert!((1..=2).contains(&count), "{text:?} produced {count} sends");
    }
}

#[tokio::test]
async fn test_commands_reply_with_fixed_texts() {
    let transport = RecordingTransport::default();
    handlers::start(&transport, ChatId(9)).await.expect("greeting should be sent");
    handlers::help(&transport, ChatId(9)).await.expect("usage should be sent");

    assert_eq!(
        transport.sent_to(ChatId(9)),
        vec![OutboundReply::text(GREETING_TEXT), OutboundReply::text(HELP_TEXT)]
    );
}

#[tokio::test]
async fn test_concurrent_chats_do_not_cross_talk() {
    const CHATS: i64 = 8;

    let extractor = Arc::new(HostExtractor::new(Duration::from_millis(20)));
    let pool = Arc::new(pool(extractor.clone()));
    let transport = Arc::new(RecordingTransport::default());

    let mut tasks = tokio::task::JoinSet::new();
    for chat in 0..CHATS {
        let pool = Arc::clone(&pool);
        let transport = Arc::clone(&transport);
        tasks.spawn(async move {
            // Odd chats send links the extractor rejects.
            let host = if chat % 2 == 0 { "ok" } else { "bad" };
            let message = InboundMessage::new(ChatId(chat), format!("https://{host}.test/{chat}"));
            handlers::handle_link(transport.as_ref(), &pool, &message).await
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "handler task panicked");
    }

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 8);
    for chat in 0..CHATS {
        let expected = if chat % 2 == 0 {
            vec![
                OutboundReply::text(FETCHING_TEXT),
                OutboundReply::video(format!("https://cdn.test/{chat}.mp4"), VIDEO_CAPTION),
            ]
        } else {
            vec![
                OutboundReply::text(FETCHING_TEXT),
                OutboundReply::text(EXTRACTION_FAILED_TEXT),
            ]
        };
        assert_eq!(transport.sent_to(ChatId(chat)), expected, "chat {chat}");
    }
}

/// Decode a Bot API update the way the webhook listener receives it: as text.
fn decode_update(payload: &serde_json::Value) -> Result<Update, serde_json::Error> {
    serde_json::from_str(&payload.to_string())
}

fn message_of(update: &Update) -> Option<&Message> {
    match &update.kind {
        UpdateKind::Message(msg) => Some(msg),
        _ => None,
    }
}

#[test]
fn test_update_payload_becomes_inbound_message() -> Result<(), serde_json::Error> {
    let payload = serde_json::json!({
        "update_id": 892_252_934,
        "message": {
            "message_id": 6557,
            "from": {"id": 218_485_655, "is_bot": false, "first_name": "Sam"},
            "chat": {"id": 218_485_655, "first_name": "Sam", "type": "private"},
            "date": 1_640_359_486,
            "text": "look https://ok.test/v"
        }
    });

    let update = decode_update(&payload)?;
    assert_eq!(
        message_of(&update).and_then(InboundMessage::from_message),
        Some(InboundMessage::new(ChatId(218_485_655), "look https://ok.test/v"))
    );
    Ok(())
}

#[test]
fn test_non_text_message_is_ignored() -> Result<(), serde_json::Error> {
    let payload = serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 2,
            "from": {"id": 7, "is_bot": false, "first_name": "Sam"},
            "chat": {"id": 7, "first_name": "Sam", "type": "private"},
            "date": 1_640_359_486,
            "photo": [{
                "file_id": "AgACAgIAAxkBAAIB",
                "file_unique_id": "AQADmLkx",
                "file_size": 1234,
                "width": 90,
                "height": 51
            }]
        }
    });

    let update = decode_update(&payload)?;
    let msg = message_of(&update);
    assert!(msg.is_some(), "payload should decode as a message update");
    assert_eq!(msg.and_then(InboundMessage::from_message), None);
    Ok(())
}
