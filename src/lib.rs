#![deny(missing_docs)]
//! Video Link Bot
//!
//! A Telegram bot that resolves video page links to direct media URLs
//! via yt-dlp and sends the video back to the chat.

/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// Media link extraction (yt-dlp) and the blocking worker pool
pub mod extractor;
/// URL detection in free-form text
pub mod parser;
/// Telegram runtime entrypoint
pub mod runner;
