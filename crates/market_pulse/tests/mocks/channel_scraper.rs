use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use market_pulse::{domain::Video, yt::ChannelScraper};

#[derive(Clone, Default)]
pub struct MockChannelScraper {
    pub videos: Vec<Video>,
    pub calls: Arc<Mutex<Vec<(String, usize)>>>,
    pub fail_with: Option<String>,
}

impl MockChannelScraper {
    /// Videos newest first, one hour apart.
    pub fn with_ids(ids: &[&str]) -> Self {
        let newest = Utc.with_ymd_and_hms(2026, 10, 16, 21, 0, 0).unwrap();
        let videos = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Video::new(
                    *id,
                    format!("Markets Wrap {id}"),
                    newest - Duration::hours(i as i64),
                )
            })
            .collect();

        Self {
            videos,
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl ChannelScraper for MockChannelScraper {
    async fn latest_videos(
        &self,
        channel_handle: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<Video>> {
        self.calls
            .lock()
            .unwrap()
            .push((channel_handle.to_string(), max_results));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.videos.iter().take(max_results).cloned().collect())
    }
}
