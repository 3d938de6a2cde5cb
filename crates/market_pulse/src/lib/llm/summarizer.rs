use std::{fmt::Display, future::Future};

use serde::Deserialize;

pub trait Summarizer {
    type Error: Display + Send;

    /// Summarizes a prompt that already embeds the source material.
    fn summarize_text(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;

    /// Summarizes an audio payload, attached next to `prompt` as an inline
    /// part of type `mime_type`.
    fn summarize_audio(
        &self,
        prompt: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
