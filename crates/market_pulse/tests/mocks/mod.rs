#![allow(dead_code)]

pub mod analyzer;
pub mod audio_handler;
pub mod channel_scraper;
pub mod metadata;
pub mod notifier;
pub mod summarizer;
pub mod transcript;
