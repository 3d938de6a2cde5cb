use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use market_pulse::{domain::VideoMetadata, yt::MetadataSource};

#[derive(Clone, Default)]
pub struct MockMetadataSource {
    pub metadata: HashMap<String, VideoMetadata>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockMetadataSource {
    pub fn with(mut self, video_id: &str, title: &str, description: &str) -> Self {
        self.metadata.insert(
            video_id.to_string(),
            VideoMetadata {
                title: title.to_string(),
                description: description.to_string(),
            },
        );
        self
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl MetadataSource for MockMetadataSource {
    async fn video_metadata(&self, video_id: &str) -> anyhow::Result<Option<VideoMetadata>> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.metadata.get(video_id).cloned())
    }
}
