use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use market_pulse::{domain::AudioArtifact, yt::AudioHandler};

pub const MOCK_AUDIO: &[u8] = b"\x00\x00\x00\x18ftypM4A mock audio";

#[derive(Clone, Default)]
pub struct MockAudioHandler {
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Files handed out, to check they were cleaned up afterwards.
    pub created: Arc<Mutex<Vec<PathBuf>>>,
    pub fail_with: Option<String>,
    /// Write a partial download before failing, like an interrupted yt-dlp.
    pub leave_partial: bool,
}

impl MockAudioHandler {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_with_partial(msg: &str) -> Self {
        Self {
            leave_partial: true,
            ..Self::failing(msg)
        }
    }
}

impl AudioHandler for MockAudioHandler {
    const BASE_URL: &'static str = "https://youtube.com";

    async fn download(&self, video_id: &str, audio_dl_path: &Path) -> anyhow::Result<AudioArtifact> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(ref msg) = self.fail_with {
            if self.leave_partial {
                let partial = audio_dl_path.join(format!("{video_id}.webm.part"));
                tokio::fs::write(&partial, b"partial").await?;
                self.created.lock().unwrap().push(partial);
            }
            return Err(anyhow::anyhow!("{}", msg));
        }

        let path = audio_dl_path.join(format!("{video_id}.m4a"));
        tokio::fs::write(&path, MOCK_AUDIO).await?;
        self.created.lock().unwrap().push(path.clone());
        Ok(AudioArtifact::new(path, "audio/mp4"))
    }
}
