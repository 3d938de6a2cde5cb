use std::sync::{Arc, Mutex};

use market_pulse::{Summarizer, SummaryResponse};

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    /// `(prompt, audio bytes, mime type)` of each audio request.
    pub audio_calls: Arc<Mutex<Vec<(String, Vec<u8>, String)>>>,
    pub fail_with: Option<String>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            audio_calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new("")
        }
    }
}

impl Summarizer for MockSummarizer {
    type Error = anyhow::Error;

    async fn summarize_text(&self, prompt: &str) -> Result<SummaryResponse, Self::Error> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(SummaryResponse {
            summary: self.summary.clone(),
        })
    }

    async fn summarize_audio(
        &self,
        prompt: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<SummaryResponse, Self::Error> {
        self.audio_calls.lock().unwrap().push((
            prompt.to_string(),
            audio.to_vec(),
            mime_type.to_string(),
        ));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(SummaryResponse {
            summary: self.summary.clone(),
        })
    }
}
