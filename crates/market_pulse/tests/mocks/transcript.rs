use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use market_pulse::{domain::Transcript, yt::TranscriptSource};

#[derive(Clone, Default)]
pub struct MockTranscriptSource {
    pub transcripts: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriptSource {
    pub fn with(mut self, video_id: &str, text: &str) -> Self {
        self.transcripts
            .insert(video_id.to_string(), text.to_string());
        self
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl TranscriptSource for MockTranscriptSource {
    async fn transcript(&self, video_id: &str) -> anyhow::Result<Transcript> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self
            .transcripts
            .get(video_id)
            .map(|text| Transcript::new(text.as_str(), "en"))
            .unwrap_or_default())
    }
}
