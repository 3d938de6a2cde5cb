pub mod domain;
mod error;
pub mod jobs;
pub mod llm;
pub mod parser;
mod processor;
pub mod report;
pub mod server;
pub mod service;
pub mod slack;
pub mod tracing;
pub mod types;
pub mod yt;

pub use error::Error;
pub use llm::summarizer::{Summarizer, SummaryResponse};
pub use processor::{
    builder::MarketNewsProcessorBuilder, MarketAnalyzer, MarketNewsProcessor,
    AUDIO_EXTRACTION_FAILED, DEFAULT_TITLE,
};
